//! Engine facade
//!
//! [`DossierEngine`] wires the schema index, the required-field set and a
//! version store together, and exposes the five document operations: read,
//! history, save, diff, rollback. It holds no mutable state of its own;
//! everything between two store calls is pure compute.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use dossier_content::{
    merge_grouped, ungroup, FlatDocument, LockOverlay, SnapshotContent, FIELD_STATES_KEY,
    LOCKS_KEY,
};
use dossier_schema::{FieldId, RequiredFields, SchemaIndex};
use dossier_store::{DocumentRef, Snapshot, SnapshotSummary, VersionId, VersionStore};
use dossier_value::FieldValue;

use crate::completion::{completion_percent, effective_completion};
use crate::diff::{diff_documents, DocumentDiff};
use crate::error::EngineError;
use crate::save::{plan_updates, SaveReceipt, SaveRequest};

/// Read-path projection of one snapshot
///
/// Fields come back flat regardless of how the snapshot was stored, and the
/// completeness is the effective (self-healed) score, not necessarily the
/// stored one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    /// Document the snapshot belongs to
    pub document: DocumentRef,
    /// Snapshot backing this view
    pub version: VersionId,
    /// Sequence number of that snapshot
    pub sequence_number: u64,
    /// When the snapshot was first written
    pub created_at: DateTime<Utc>,
    /// Flattened field values, known and legacy alike
    pub fields: IndexMap<FieldId, FieldValue>,
    /// Lock overlay
    pub locks: LockOverlay,
    /// Free-form per-field UI state
    pub field_states: Map<String, Value>,
    /// Effective completeness
    pub completeness_percent: i64,
}

/// The versioning and reconciliation engine for one document kind
pub struct DossierEngine {
    index: Arc<SchemaIndex>,
    store: Arc<dyn VersionStore>,
    required: RequiredFields,
}

impl DossierEngine {
    /// Engine over a schema index and a store.
    ///
    /// The required-field set defaults to the one the schema declares.
    #[must_use]
    pub fn new(index: Arc<SchemaIndex>, store: Arc<dyn VersionStore>) -> Self {
        let required = index.required().clone();
        Self { index, store, required }
    }

    /// Replace the required-field set carried by the schema
    #[must_use]
    pub fn with_required_fields(mut self, required: RequiredFields) -> Self {
        self.required = required;
        self
    }

    /// Schema index this engine validates against
    #[inline]
    #[must_use]
    pub fn schema_index(&self) -> &SchemaIndex {
        &self.index
    }

    /// Fields counted by the completion score
    #[inline]
    #[must_use]
    pub fn required_fields(&self) -> &RequiredFields {
        &self.required
    }

    /// Score a flat document with this engine's required set
    #[must_use]
    pub fn completion_percent(&self, doc: &FlatDocument) -> i64 {
        completion_percent(doc, &self.required, &self.index)
    }

    /// Current state of a document.
    ///
    /// # Errors
    /// Store failures, propagated unchanged.
    pub async fn current(&self, document: &DocumentRef) -> Result<DocumentView, EngineError> {
        let snapshot = self.store.current_snapshot(document).await?;
        Ok(self.view_of(snapshot))
    }

    /// State of one specific version.
    ///
    /// # Errors
    /// Store failures, propagated unchanged.
    pub async fn version(&self, version: VersionId) -> Result<DocumentView, EngineError> {
        let snapshot = self.store.snapshot(version).await?;
        Ok(self.view_of(snapshot))
    }

    /// Version history, newest first, with healed completeness.
    ///
    /// Zero-scored entries cost one extra snapshot fetch each; anything
    /// else is reported as stored.
    ///
    /// # Errors
    /// Store failures, propagated unchanged.
    pub async fn history(
        &self,
        document: &DocumentRef,
    ) -> Result<Vec<SnapshotSummary>, EngineError> {
        let mut summaries = self.store.list_snapshots(document).await?;
        for summary in &mut summaries {
            if summary.completeness_percent == 0 {
                let snapshot = self.store.snapshot(summary.id).await?;
                let doc = ungroup(&snapshot.content, &self.index);
                let computed = completion_percent(&doc, &self.required, &self.index);
                summary.completeness_percent = effective_completion(0, &doc, computed);
            }
        }
        Ok(summaries)
    }

    /// Merge a partial update into the document.
    ///
    /// Fetches the current snapshot, plans the merge (dropping unknown ids
    /// and type-guarded values), replaces overlays when the request carries
    /// them, recomputes completeness over the merged content, and persists
    /// with exactly one content write: in place by default, or as an
    /// appended snapshot plus pointer move when `create_version` is set.
    ///
    /// # Errors
    /// Store failures, propagated unchanged. Dropped and rejected fields
    /// are not errors; the receipt reports them.
    pub async fn save(
        &self,
        document: &DocumentRef,
        request: SaveRequest,
    ) -> Result<SaveReceipt, EngineError> {
        let snapshot = self.store.current_snapshot(document).await?;
        if snapshot.content.shape_tag().is_none() && !snapshot.content.is_empty() {
            tracing::warn!("Untagged snapshot content for {}, sniffing the shape", document);
        }
        let existing = ungroup(&snapshot.content, &self.index);

        let plan = plan_updates(&existing, &request, &self.index);
        let applied = plan.applied();
        tracing::debug!(
            "Merging {} updates into {} stored fields for {}",
            plan.accepted.len(),
            existing.field_count(),
            document
        );

        let mut content = merge_grouped(&snapshot.content, &plan.accepted, &self.index).into_map();
        if let Some(locks) = &request.locked_fields {
            replace_overlay(&mut content, LOCKS_KEY, locks.is_empty(), locks.to_value());
        }
        if let Some(states) = &request.field_states {
            replace_overlay(
                &mut content,
                FIELD_STATES_KEY,
                states.is_empty(),
                Value::Object(states.clone()),
            );
        }
        let content = SnapshotContent::from_map(content);

        let merged = ungroup(&content, &self.index);
        let completeness = completion_percent(&merged, &self.required, &self.index);

        let written = if request.create_version {
            let appended = self
                .store
                .append_snapshot(document, content, request.created_by.clone(), completeness)
                .await?;
            self.store.set_current_version(document, appended.id).await?;
            appended
        } else {
            self.store
                .update_snapshot_content(snapshot.id, content, completeness)
                .await?
        };

        tracing::info!(
            "Saved {} to version {}: {} applied, {} dropped, {} rejected, completeness {}",
            document,
            written.id,
            applied.len(),
            plan.dropped.len(),
            plan.rejected.len(),
            completeness
        );

        Ok(SaveReceipt {
            version: written.id,
            sequence_number: written.sequence_number,
            created_version: request.create_version,
            applied,
            dropped: plan.dropped,
            rejected: plan.rejected,
            completeness_percent: completeness,
        })
    }

    /// Diff two versions of the same document.
    ///
    /// # Errors
    /// [`EngineError::Validation`] for a version diffed against itself
    /// (before any store call) or versions from two different documents;
    /// store failures otherwise.
    pub async fn diff(
        &self,
        version_a: VersionId,
        version_b: VersionId,
    ) -> Result<DocumentDiff, EngineError> {
        if version_a == version_b {
            return Err(EngineError::validation("cannot diff a version against itself"));
        }

        let a = self.store.snapshot(version_a).await?;
        let b = self.store.snapshot(version_b).await?;
        if a.document != b.document {
            return Err(EngineError::validation(format!(
                "versions {version_a} and {version_b} belong to different documents"
            )));
        }

        let doc_a = ungroup(&a.content, &self.index);
        let doc_b = ungroup(&b.content, &self.index);
        Ok(diff_documents(&self.index, a.document, version_a, version_b, &doc_a, &doc_b))
    }

    /// Re-point the document at a prior version.
    ///
    /// No snapshot is deleted or mutated; rolling forward is the same call
    /// with the newer id.
    ///
    /// # Errors
    /// [`EngineError::Validation`] when the version belongs to another
    /// document; store failures otherwise.
    pub async fn rollback(
        &self,
        document: &DocumentRef,
        version: VersionId,
    ) -> Result<(), EngineError> {
        let snapshot = self.store.snapshot(version).await?;
        if snapshot.document != *document {
            return Err(EngineError::validation(format!(
                "version {version} does not belong to {document}"
            )));
        }

        self.store.set_current_version(document, version).await?;
        tracing::info!("Rolled {} back to version {}", document, version);
        Ok(())
    }

    fn view_of(&self, snapshot: Snapshot) -> DocumentView {
        let doc = ungroup(&snapshot.content, &self.index);
        let computed = completion_percent(&doc, &self.required, &self.index);
        let completeness = effective_completion(snapshot.completeness_percent, &doc, computed);

        DocumentView {
            document: snapshot.document,
            version: snapshot.id,
            sequence_number: snapshot.sequence_number,
            created_at: snapshot.created_at,
            fields: doc.fields,
            locks: doc.locks,
            field_states: doc.field_states,
            completeness_percent: completeness,
        }
    }
}

/// Swap one reserved overlay key; an empty replacement clears it.
fn replace_overlay(content: &mut Map<String, Value>, key: &str, empty: bool, value: Value) {
    if empty {
        content.remove(key);
    } else {
        content.insert(key.to_string(), value);
    }
}
