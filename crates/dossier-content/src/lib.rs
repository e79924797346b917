//! Dossier Snapshot Content
//!
//! The storage layer's view of a resume: one JSON object per snapshot,
//! stored flat or grouped, carrying lock and UI-state overlays alongside
//! the field data.
//!
//! # Core Concepts
//!
//! - [`SnapshotContent`]: the content object exactly as persisted
//! - [`FlatDocument`]: canonical parsed form (fields + overlays + extras)
//! - [`StorageShape`]: explicit flat/grouped tag, with sniffing for legacy
//!   untagged snapshots
//! - [`LockOverlay`]: per-field "human confirmed, do not overwrite" flags
//! - [`ungroup`] / [`group`] / [`merge_grouped`]: the shape transforms,
//!   total over anything a store can return
//!
//! # Example
//!
//! ```rust,ignore
//! use dossier_content::{group, ungroup};
//!
//! let doc = ungroup(&snapshot.content, &index);
//! let score = doc.field_count();
//! let stored = group(&doc, &index);
//! assert_eq!(ungroup(&stored, &index), doc);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod transform;
mod types;

pub use transform::{detect_shape, group, merge_grouped, ungroup};
pub use types::{
    is_reserved_key, FlatDocument, LockOverlay, SnapshotContent, StorageShape, COMPLETENESS_KEY,
    FIELD_STATES_KEY, LEGACY_CONTAINER_KEYS, LEGACY_META_KEYS, LOCKS_KEY, SHAPE_KEY,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
