//! Dossier Field Values
//!
//! The value layer of the dossier engine: what a single stored field can
//! hold, where it came from, and when two stored values mean the same thing.
//!
//! # Core Concepts
//!
//! - [`FieldValue`]: bare JSON scalar or provenance envelope, classified by
//!   a single wire probe inside its `Deserialize` impl
//! - [`RichValue`]: the envelope (`value` / `source` / `warnings` /
//!   `otherValues`)
//! - [`SourceDescriptor`]: user input or a named document, with decoding
//!   for every historical source shape
//! - [`normalize`] / [`values_equal`] / [`is_empty_value`]: the one shared
//!   definition of emptiness and semantic equality
//! - [`percent::parse_lenient`]: tolerant completeness-percent reads
//!
//! # Example
//!
//! ```rust,ignore
//! use dossier_value::{FieldValue, values_equal};
//! use serde_json::json;
//!
//! let stored: FieldValue = serde_json::from_value(json!({
//!     "value": "Yes",
//!     "source": {"type": "document", "name": "term-sheet.pdf"}
//! }))?;
//!
//! assert!(stored.is_rich());
//! assert!(values_equal(stored.unwrapped(), &json!(true)));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod normalize;
pub mod percent;
mod rich;
mod source;

pub use normalize::{is_empty_value, is_zero_number, normalize, values_equal};
pub use rich::{FieldValue, RichValue};
pub use source::SourceDescriptor;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
