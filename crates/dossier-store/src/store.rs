//! Version store contract
//!
//! The only I/O boundary the engines call through. Any persistent store
//! (relational table with a JSON column, document database, object store)
//! can sit behind this trait.

use dossier_content::SnapshotContent;

use crate::error::StoreError;
use crate::ids::{DocumentRef, VersionId};
use crate::snapshot::{Snapshot, SnapshotSummary};

/// Append-only snapshot persistence plus a mutable current-version pointer
/// per logical document.
///
/// Implementations own sequence-number assignment and pointer resolution.
/// The pointer may be unset, in which case the snapshot with the highest
/// sequence number is current; that fallback is what makes the
/// two-step append-then-point write crash-safe.
#[async_trait::async_trait]
pub trait VersionStore: Send + Sync {
    /// Resolve the current snapshot of a document.
    ///
    /// # Errors
    /// [`StoreError::UnknownDocument`] when the document does not exist.
    async fn current_snapshot(&self, document: &DocumentRef) -> Result<Snapshot, StoreError>;

    /// Fetch one snapshot by id.
    ///
    /// # Errors
    /// [`StoreError::UnknownVersion`] when no snapshot has this id.
    async fn snapshot(&self, version: VersionId) -> Result<Snapshot, StoreError>;

    /// All snapshots of a document, highest sequence first.
    ///
    /// # Errors
    /// [`StoreError::UnknownDocument`] when the document does not exist.
    async fn list_snapshots(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<SnapshotSummary>, StoreError>;

    /// Persist a new snapshot with the next sequence number.
    ///
    /// Does not move the current-version pointer.
    ///
    /// # Errors
    /// [`StoreError::UnknownDocument`] when the document does not exist.
    async fn append_snapshot(
        &self,
        document: &DocumentRef,
        content: SnapshotContent,
        created_by: Option<String>,
        completeness_percent: i64,
    ) -> Result<Snapshot, StoreError>;

    /// Replace a snapshot's content in place (the autosave path).
    ///
    /// # Errors
    /// [`StoreError::UnknownVersion`] when no snapshot has this id.
    async fn update_snapshot_content(
        &self,
        version: VersionId,
        content: SnapshotContent,
        completeness_percent: i64,
    ) -> Result<Snapshot, StoreError>;

    /// Move the current-version pointer.
    ///
    /// # Errors
    /// [`StoreError::UnknownDocument`] / [`StoreError::UnknownVersion`] for
    /// missing parties, [`StoreError::Conflict`] when the implementation
    /// detects a concurrent pointer move.
    async fn set_current_version(
        &self,
        document: &DocumentRef,
        version: VersionId,
    ) -> Result<(), StoreError>;
}
