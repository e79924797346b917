//! Snapshot records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dossier_content::SnapshotContent;

use crate::ids::{DocumentRef, VersionId};

/// One recorded state of a document
///
/// Snapshots are immutable once written, with one exception: the store may
/// replace the latest snapshot's `content` in place on the autosave path.
/// The sequence number is assigned by the store and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Store-assigned id
    pub id: VersionId,
    /// Logical document this snapshot belongs to
    pub document: DocumentRef,
    /// Monotonic per-document sequence, assigned by the store
    pub sequence_number: u64,
    /// When the snapshot was first written
    pub created_at: DateTime<Utc>,
    /// Actor that wrote it, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Redundant completion score, re-derivable from `content`
    pub completeness_percent: i64,
    /// The stored content object
    pub content: SnapshotContent,
}

impl Snapshot {
    /// Summary view without the content payload
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id,
            document: self.document,
            sequence_number: self.sequence_number,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            completeness_percent: self.completeness_percent,
        }
    }
}

/// Version-list entry: everything but the content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    /// Store-assigned id
    pub id: VersionId,
    /// Logical document this snapshot belongs to
    pub document: DocumentRef,
    /// Monotonic per-document sequence
    pub sequence_number: u64,
    /// When the snapshot was first written
    pub created_at: DateTime<Utc>,
    /// Actor that wrote it, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Redundant completion score
    pub completeness_percent: i64,
}
