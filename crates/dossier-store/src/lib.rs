//! Dossier Version Store
//!
//! Persistence contract for resume snapshots. Every saved state of a
//! document is an immutable row; "the document" is a movable pointer over
//! those rows, which is what makes rollback a metadata operation.
//!
//! # Core Concepts
//!
//! - [`VersionStore`]: async trait every backend implements
//! - [`Snapshot`]: one immutable saved state, with store-assigned sequence
//! - [`DocumentRef`]: logical document identity (owner + kind)
//! - [`MemoryVersionStore`]: reference backend for tests and local tooling
//! - [`StoreError`]: backend failures, with retryability classification
//!
//! # Example
//!
//! ```rust,ignore
//! use dossier_store::{DocumentRef, MemoryVersionStore, OwnerId, VersionStore};
//!
//! let store = MemoryVersionStore::new();
//! let doc = DocumentRef::project(OwnerId::generate());
//! store.create_document(doc, None)?;
//! let current = store.current_snapshot(&doc).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod ids;
mod memory;
mod snapshot;
mod store;

pub use error::StoreError;
pub use ids::{DocumentRef, OwnerId, VersionId};
pub use memory::MemoryVersionStore;
pub use snapshot::{Snapshot, SnapshotSummary};
pub use store::VersionStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
