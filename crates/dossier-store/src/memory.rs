//! In-memory version store
//!
//! Reference implementation of [`VersionStore`] used by tests and local
//! tooling. Snapshots live in a concurrent map; per-document bookkeeping
//! (sequence counter, ordering, current pointer) sits behind one lock so an
//! append is atomic.

use std::collections::HashMap;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;

use dossier_content::SnapshotContent;

use crate::error::StoreError;
use crate::ids::{DocumentRef, VersionId};
use crate::snapshot::{Snapshot, SnapshotSummary};
use crate::store::VersionStore;

#[derive(Debug)]
struct DocumentRecord {
    /// Snapshot ids in ascending sequence order
    ordered: Vec<VersionId>,
    /// Current-version pointer; `None` falls back to highest sequence
    current: Option<VersionId>,
    next_sequence: u64,
}

impl Default for DocumentRecord {
    fn default() -> Self {
        Self { ordered: Vec::new(), current: None, next_sequence: 1 }
    }
}

/// Thread-safe in-memory [`VersionStore`]
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    versions: DashMap<VersionId, Snapshot>,
    records: RwLock<HashMap<DocumentRef, DocumentRecord>>,
}

impl MemoryVersionStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical document with its empty first snapshot.
    ///
    /// The pointer starts at that snapshot, matching the lifecycle of a
    /// freshly created owner entity.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] when the document already exists.
    pub fn create_document(
        &self,
        document: DocumentRef,
        created_by: Option<String>,
    ) -> Result<Snapshot, StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&document) {
            return Err(StoreError::Conflict(document));
        }

        let snapshot = Snapshot {
            id: VersionId::generate(),
            document,
            sequence_number: 1,
            created_at: Utc::now(),
            created_by,
            completeness_percent: 0,
            content: SnapshotContent::empty(),
        };
        self.versions.insert(snapshot.id, snapshot.clone());
        records.insert(
            document,
            DocumentRecord {
                ordered: vec![snapshot.id],
                current: Some(snapshot.id),
                next_sequence: 2,
            },
        );
        Ok(snapshot)
    }

    /// Install snapshots directly, creating the document if needed.
    ///
    /// The pointer is left untouched (unset for a fresh document), which is
    /// exactly the state the highest-sequence fallback exists for.
    pub fn seed_document(
        &self,
        document: DocumentRef,
        contents: impl IntoIterator<Item = SnapshotContent>,
    ) -> Vec<Snapshot> {
        let mut records = self.records.write();
        let record = records.entry(document).or_default();

        let mut seeded = Vec::new();
        for content in contents {
            let snapshot = Snapshot {
                id: VersionId::generate(),
                document,
                sequence_number: record.next_sequence,
                created_at: Utc::now(),
                created_by: None,
                completeness_percent: 0,
                content,
            };
            record.next_sequence += 1;
            record.ordered.push(snapshot.id);
            self.versions.insert(snapshot.id, snapshot.clone());
            seeded.push(snapshot);
        }
        seeded
    }

    /// Install one snapshot with an explicit stored score.
    pub fn seed_snapshot(
        &self,
        document: DocumentRef,
        content: SnapshotContent,
        completeness_percent: i64,
    ) -> Snapshot {
        let mut records = self.records.write();
        let record = records.entry(document).or_default();

        let snapshot = Snapshot {
            id: VersionId::generate(),
            document,
            sequence_number: record.next_sequence,
            created_at: Utc::now(),
            created_by: None,
            completeness_percent,
            content,
        };
        record.next_sequence += 1;
        record.ordered.push(snapshot.id);
        self.versions.insert(snapshot.id, snapshot.clone());
        snapshot
    }

    /// Whether a logical document has been registered
    #[must_use]
    pub fn document_exists(&self, document: &DocumentRef) -> bool {
        self.records.read().contains_key(document)
    }

    /// All registered documents; order is unspecified.
    #[must_use]
    pub fn documents(&self) -> Vec<DocumentRef> {
        self.records.read().keys().copied().collect()
    }
}

#[async_trait::async_trait]
impl VersionStore for MemoryVersionStore {
    async fn current_snapshot(&self, document: &DocumentRef) -> Result<Snapshot, StoreError> {
        let records = self.records.read();
        let record = records
            .get(document)
            .ok_or(StoreError::UnknownDocument(*document))?;

        let version = record
            .current
            .or_else(|| record.ordered.last().copied())
            .ok_or(StoreError::UnknownDocument(*document))?;

        self.versions
            .get(&version)
            .map(|entry| entry.clone())
            .ok_or(StoreError::UnknownVersion(version))
    }

    async fn snapshot(&self, version: VersionId) -> Result<Snapshot, StoreError> {
        self.versions
            .get(&version)
            .map(|entry| entry.clone())
            .ok_or(StoreError::UnknownVersion(version))
    }

    async fn list_snapshots(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<SnapshotSummary>, StoreError> {
        let records = self.records.read();
        let record = records
            .get(document)
            .ok_or(StoreError::UnknownDocument(*document))?;

        Ok(record
            .ordered
            .iter()
            .rev()
            .filter_map(|id| self.versions.get(id).map(|entry| entry.summary()))
            .collect())
    }

    async fn append_snapshot(
        &self,
        document: &DocumentRef,
        content: SnapshotContent,
        created_by: Option<String>,
        completeness_percent: i64,
    ) -> Result<Snapshot, StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(document)
            .ok_or(StoreError::UnknownDocument(*document))?;

        let snapshot = Snapshot {
            id: VersionId::generate(),
            document: *document,
            sequence_number: record.next_sequence,
            created_at: Utc::now(),
            created_by,
            completeness_percent,
            content,
        };
        record.next_sequence += 1;
        record.ordered.push(snapshot.id);
        self.versions.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    async fn update_snapshot_content(
        &self,
        version: VersionId,
        content: SnapshotContent,
        completeness_percent: i64,
    ) -> Result<Snapshot, StoreError> {
        let mut entry = self
            .versions
            .get_mut(&version)
            .ok_or(StoreError::UnknownVersion(version))?;
        entry.content = content;
        entry.completeness_percent = completeness_percent;
        Ok(entry.clone())
    }

    async fn set_current_version(
        &self,
        document: &DocumentRef,
        version: VersionId,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(document)
            .ok_or(StoreError::UnknownDocument(*document))?;

        let belongs = self
            .versions
            .get(&version)
            .is_some_and(|snapshot| snapshot.document == *document);
        if !belongs {
            return Err(StoreError::UnknownVersion(version));
        }

        record.current = Some(version);
        Ok(())
    }
}
