//! Dossier Presentation Schema
//!
//! Static, versioned description of every field a project or borrower
//! resume can carry, plus a precomputed lookup index over it.
//!
//! # Core Concepts
//!
//! - [`DocumentSchema`]: sections, subsections and field specs in
//!   presentation order
//! - [`SchemaIndex`]: O(1) membership, position, typing and ordering
//!   lookups over a schema
//! - [`FieldId`] / [`SectionId`] / [`SubsectionId`]: typed ids that keep
//!   the reserved `_` overlay namespace out of schema space
//! - [`RequiredFields`]: the id set counted by the completion score
//!
//! Stored documents are sparse maps keyed by [`FieldId`]; all structure,
//! ordering and labels come from here.
//!
//! # Example
//!
//! ```rust,ignore
//! use dossier_schema::{DocumentSchema, SchemaIndex};
//!
//! let schema = DocumentSchema::from_json(schema_json)?;
//! let index = SchemaIndex::build(schema)?;
//!
//! for field in index.ordered_fields() {
//!     println!("{} -> {}", field.spec.field_id, field.location.section_id);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod ids;
mod index;
mod model;

pub use ids::{FieldId, IdError, SectionId, SubsectionId};
pub use index::{FieldLocation, OrderedField, RequiredFields, SchemaIndex, UnknownField};
pub use model::{
    DataType, DocumentKind, DocumentSchema, FieldSpec, SchemaError, Section, SectionBody,
    Subsection,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
