//! Save request model and merge planning
//!
//! A save is a partial update: a flat field→value map plus optional
//! per-field provenance, an optional replacement lock overlay, and optional
//! per-field UI state. Planning the merge is pure; the async engine wraps
//! it with the fetch and the single persistence write.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use dossier_content::{FlatDocument, LockOverlay};
use dossier_schema::{DataType, FieldId, SchemaIndex};
use dossier_store::VersionId;
use dossier_value::{FieldValue, RichValue, SourceDescriptor};

/// Provenance supplied alongside one updated field
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldMetadata {
    /// Where the value came from; user input when omitted
    pub source: Option<SourceDescriptor>,
    /// Extraction warnings to attach
    pub warnings: Vec<String>,
    /// Competing candidate values that were not chosen
    #[serde(alias = "other_values")]
    pub other_values: Vec<Value>,
}

impl FieldMetadata {
    /// Metadata naming the document a value was extracted from
    #[must_use]
    pub fn from_document(name: impl Into<String>) -> Self {
        Self {
            source: Some(SourceDescriptor::document(name)),
            warnings: Vec::new(),
            other_values: Vec::new(),
        }
    }
}

/// One partial update against a document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRequest {
    /// Field values keyed by field id, in either wire shape
    pub updates: Map<String, Value>,
    /// Per-field provenance for entries in `updates`
    pub metadata: IndexMap<String, FieldMetadata>,
    /// Replacement lock overlay; omitted means copy the stored one forward
    pub locked_fields: Option<LockOverlay>,
    /// Replacement per-field UI state; omitted means copy forward
    pub field_states: Option<Map<String, Value>>,
    /// Append a new snapshot instead of updating the latest in place
    pub create_version: bool,
    /// Actor recorded on an appended snapshot
    pub created_by: Option<String>,
}

impl SaveRequest {
    /// Empty request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one field update
    #[must_use]
    pub fn update(mut self, field: &str, value: Value) -> Self {
        self.updates.insert(field.to_string(), value);
        self
    }

    /// Attach provenance to one updated field
    #[must_use]
    pub fn with_metadata(mut self, field: &str, metadata: FieldMetadata) -> Self {
        self.metadata.insert(field.to_string(), metadata);
        self
    }

    /// Replace the lock overlay wholesale
    #[must_use]
    pub fn with_locks(mut self, locks: LockOverlay) -> Self {
        self.locked_fields = Some(locks);
        self
    }

    /// Persist as a new version rather than updating in place
    #[must_use]
    pub fn as_new_version(mut self) -> Self {
        self.create_version = true;
        self
    }
}

/// Receipt for one completed save
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    /// Version the merged content was written to
    pub version: VersionId,
    /// Sequence number of that version
    pub sequence_number: u64,
    /// Whether a new snapshot was appended
    pub created_version: bool,
    /// Field ids merged into the document
    pub applied: Vec<FieldId>,
    /// Update keys the schema does not declare, never persisted
    pub dropped: Vec<String>,
    /// Field ids rejected by the type guard, kept at their prior value
    pub rejected: Vec<FieldId>,
    /// Completeness stamped on the written snapshot
    pub completeness_percent: i64,
}

/// Outcome of planning one update batch against the stored document
#[derive(Debug, Default)]
pub(crate) struct MergePlan {
    /// Values to write, keyed by field id, provenance already merged
    pub(crate) accepted: IndexMap<FieldId, FieldValue>,
    /// Update keys that never reach the store
    pub(crate) dropped: Vec<String>,
    /// Known fields rejected by the type guard
    pub(crate) rejected: Vec<FieldId>,
}

impl MergePlan {
    pub(crate) fn applied(&self) -> Vec<FieldId> {
        self.accepted.keys().cloned().collect()
    }
}

/// Classify and provenance-merge every entry of an update batch.
///
/// Unknown keys are dropped, boolean values aimed at non-boolean fields are
/// rejected with the prior value left standing, and everything else merges
/// per the provenance rules. Nothing here touches the store.
pub(crate) fn plan_updates(
    existing: &FlatDocument,
    request: &SaveRequest,
    index: &SchemaIndex,
) -> MergePlan {
    let mut plan = MergePlan::default();

    for (key, raw) in &request.updates {
        let Ok(id) = key.parse::<FieldId>() else {
            tracing::warn!("Dropping update with invalid field id: {}", key);
            plan.dropped.push(key.clone());
            continue;
        };
        if !index.contains(&id) {
            tracing::warn!("Dropping update for unknown field: {}", id);
            plan.dropped.push(key.clone());
            continue;
        }

        let incoming = FieldValue::from_raw(raw.clone());
        let data_type = index.data_type(&id);
        if violates_boolean_guard(&incoming, data_type) {
            tracing::warn!("Rejecting boolean value for non-boolean field: {}", id);
            plan.rejected.push(id);
            continue;
        }

        let merged = merge_provenance(incoming, request.metadata.get(key.as_str()), existing.get(&id));
        plan.accepted.insert(id, merged);
    }

    plan
}

/// A boolean is only legal where the schema says boolean, bare or wrapped.
fn violates_boolean_guard(incoming: &FieldValue, data_type: Option<DataType>) -> bool {
    incoming.unwrapped().is_boolean() && data_type.is_some_and(|t| !t.is_boolean())
}

/// Resolve the stored form of one accepted update.
///
/// An incoming envelope is stored as given. A bare value with caller
/// metadata wraps into a fresh envelope. A bare value over an existing
/// envelope keeps that envelope's provenance and swaps the payload. A bare
/// value over anything else stays bare.
fn merge_provenance(
    incoming: FieldValue,
    metadata: Option<&FieldMetadata>,
    existing: Option<&FieldValue>,
) -> FieldValue {
    if incoming.is_rich() {
        return incoming;
    }
    let payload = incoming.into_unwrapped();

    if let Some(meta) = metadata {
        return FieldValue::Rich(RichValue {
            value: payload,
            source: meta.source.clone().unwrap_or_default(),
            warnings: meta.warnings.clone(),
            other_values: meta.other_values.clone(),
        });
    }

    match existing {
        Some(FieldValue::Rich(rich)) => FieldValue::Rich(rich.with_value(payload)),
        _ => FieldValue::Plain(payload),
    }
}
