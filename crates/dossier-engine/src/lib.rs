//! Dossier Engine
//!
//! The reconciliation layer of the dossier workspace: everything that
//! happens between reading a snapshot and writing the next one.
//!
//! # Core Concepts
//!
//! - [`DossierEngine`]: facade over a schema index and a version store
//! - [`SaveRequest`] / [`SaveReceipt`]: partial updates in, applied/dropped/
//!   rejected accounting out
//! - [`DocumentDiff`]: schema-ordered changes between any two versions
//! - [`completion_percent`] / [`effective_completion`]: scoring and the
//!   stored-score self-heal
//! - [`select_donor`]: which existing resume seeds a fresh one
//!
//! # Example
//!
//! ```rust,ignore
//! use dossier_engine::{DossierEngine, SaveRequest};
//! use serde_json::json;
//!
//! let engine = DossierEngine::new(index, store);
//! let receipt = engine
//!     .save(&doc, SaveRequest::new().update("projectName", json!("Pier 7")))
//!     .await?;
//! assert_eq!(receipt.completeness_percent, 10);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod completion;
mod diff;
mod donor;
mod engine;
mod error;
mod save;

pub use completion::{completion_percent, effective_completion, is_filled};
pub use diff::{
    DocumentDiff, FieldChange, SectionDiff, TableSummary, UNKNOWN_SECTION_ID,
};
pub use donor::{select_donor, DonorCandidate};
pub use engine::{DocumentView, DossierEngine};
pub use error::EngineError;
pub use save::{FieldMetadata, SaveReceipt, SaveRequest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
