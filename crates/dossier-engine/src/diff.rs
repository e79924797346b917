//! Schema-ordered version diffing
//!
//! A diff walks every schema field in presentation order, compares the two
//! sides after normalization, and reports only real changes, grouped by
//! section. The two snapshots never have to share a storage shape; both
//! sides flatten independently before any comparison.

use serde::Serialize;
use serde_json::Value;

use dossier_content::FlatDocument;
use dossier_schema::{FieldId, OrderedField, SchemaIndex, SectionId, SubsectionId};
use dossier_store::{DocumentRef, VersionId};
use dossier_value::{normalize, FieldValue};

/// Pseudo-section collecting changes on fields the schema does not declare
pub const UNKNOWN_SECTION_ID: &str = "unknown";

const UNKNOWN_SECTION_LABEL: &str = "Unknown";

/// Row-level summary for a changed table (object-array) field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    /// Row count on the before side
    pub rows_before: usize,
    /// Row count on the after side
    pub rows_after: usize,
    /// Rows added, removed or edited
    pub changed_rows: usize,
}

/// One changed field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    /// Field that changed
    pub field_id: FieldId,
    /// Display label; the raw id for fields the schema does not declare
    pub label: String,
    /// Owning section, or the unknown pseudo-section
    pub section_id: SectionId,
    /// Owning subsection, when the section has them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection_id: Option<SubsectionId>,
    /// Normalized value on the before side; `None` means empty or absent
    pub before: Option<Value>,
    /// Normalized value on the after side
    pub after: Option<Value>,
    /// Lock state on the before side
    pub before_locked: bool,
    /// Lock state on the after side
    pub after_locked: bool,
    /// Row summary, present exactly for table-shaped fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableSummary>,
}

impl FieldChange {
    /// Whether the field is table-shaped (object-array)
    #[inline]
    #[must_use]
    pub fn is_table_field(&self) -> bool {
        self.table.is_some()
    }

    /// Empty before, value after
    #[must_use]
    pub fn is_added(&self) -> bool {
        self.before.is_none() && self.after.is_some()
    }

    /// Value before, empty after
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.before.is_some() && self.after.is_none()
    }
}

/// Changes within one section, in schema order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDiff {
    /// Section id, or [`UNKNOWN_SECTION_ID`]
    pub section_id: SectionId,
    /// Section display label
    pub label: String,
    /// Changed fields in schema order
    pub changes: Vec<FieldChange>,
}

/// Full diff between two versions of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDiff {
    /// Document both versions belong to
    pub document: DocumentRef,
    /// Before side
    pub version_a: VersionId,
    /// After side
    pub version_b: VersionId,
    /// Sections with at least one change, in schema order; the unknown
    /// pseudo-section, when present, comes last
    pub sections: Vec<SectionDiff>,
}

impl DocumentDiff {
    /// True when the two versions carry the same logical content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of changed fields
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.sections.iter().map(|s| s.changes.len()).sum()
    }

    /// Iterate every change in emission order
    pub fn changes(&self) -> impl Iterator<Item = &FieldChange> {
        self.sections.iter().flat_map(|s| s.changes.iter())
    }
}

/// Compare two flattened documents field by field.
///
/// Schema fields walk in index order; fields present in content but absent
/// from the schema are compared afterwards under the unknown
/// pseudo-section, ordered lexicographically.
pub(crate) fn diff_documents(
    index: &SchemaIndex,
    document: DocumentRef,
    version_a: VersionId,
    version_b: VersionId,
    doc_a: &FlatDocument,
    doc_b: &FlatDocument,
) -> DocumentDiff {
    let mut sections: Vec<SectionDiff> = Vec::new();

    for entry in index.ordered_fields() {
        let Some(change) = compare_known(entry, doc_a, doc_b) else { continue };
        match sections.last_mut() {
            Some(last) if last.section_id == change.section_id => last.changes.push(change),
            _ => sections.push(SectionDiff {
                section_id: change.section_id.clone(),
                label: index
                    .section_label(&change.section_id)
                    .unwrap_or(change.section_id.as_str())
                    .to_string(),
                changes: vec![change],
            }),
        }
    }

    let legacy = legacy_field_ids(index, doc_a, doc_b);
    if !legacy.is_empty() {
        if let Ok(section_id) = UNKNOWN_SECTION_ID.parse::<SectionId>() {
            let changes: Vec<FieldChange> = legacy
                .into_iter()
                .filter_map(|id| compare_legacy(id, &section_id, doc_a, doc_b))
                .collect();
            if !changes.is_empty() {
                sections.push(SectionDiff {
                    section_id,
                    label: UNKNOWN_SECTION_LABEL.to_string(),
                    changes,
                });
            }
        }
    }

    DocumentDiff { document, version_a, version_b, sections }
}

fn compare_known(
    entry: &OrderedField,
    doc_a: &FlatDocument,
    doc_b: &FlatDocument,
) -> Option<FieldChange> {
    let id = &entry.spec.field_id;
    let (before, after) = normalized_sides(id, doc_a, doc_b)?;

    let table = entry
        .spec
        .data_type
        .is_table()
        .then(|| table_summary(before.as_ref(), after.as_ref()));

    Some(FieldChange {
        field_id: id.clone(),
        label: entry.spec.label.clone(),
        section_id: entry.location.section_id.clone(),
        subsection_id: entry.location.subsection_id.clone(),
        before_locked: doc_a.locks.is_locked(id),
        after_locked: doc_b.locks.is_locked(id),
        before,
        after,
        table,
    })
}

fn compare_legacy(
    id: &FieldId,
    section_id: &SectionId,
    doc_a: &FlatDocument,
    doc_b: &FlatDocument,
) -> Option<FieldChange> {
    let (before, after) = normalized_sides(id, doc_a, doc_b)?;

    Some(FieldChange {
        field_id: id.clone(),
        label: id.as_str().to_string(),
        section_id: section_id.clone(),
        subsection_id: None,
        before_locked: doc_a.locks.is_locked(id),
        after_locked: doc_b.locks.is_locked(id),
        before,
        after,
        table: None,
    })
}

/// Both sides normalized, or `None` when they are semantically equal.
fn normalized_sides(
    id: &FieldId,
    doc_a: &FlatDocument,
    doc_b: &FlatDocument,
) -> Option<(Option<Value>, Option<Value>)> {
    let before = doc_a.get(id).map(FieldValue::unwrapped).and_then(normalize);
    let after = doc_b.get(id).map(FieldValue::unwrapped).and_then(normalize);
    if before == after {
        return None;
    }
    Some((before, after))
}

/// Ids stored on either side that the schema does not declare, sorted.
fn legacy_field_ids<'a>(
    index: &SchemaIndex,
    doc_a: &'a FlatDocument,
    doc_b: &'a FlatDocument,
) -> Vec<&'a FieldId> {
    let mut ids: Vec<&FieldId> = doc_a
        .fields
        .keys()
        .chain(doc_b.fields.keys())
        .filter(|id| !index.contains(id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn table_summary(before: Option<&Value>, after: Option<&Value>) -> TableSummary {
    let empty: &[Value] = &[];
    let rows_a = before.and_then(Value::as_array).map_or(empty, Vec::as_slice);
    let rows_b = after.and_then(Value::as_array).map_or(empty, Vec::as_slice);

    // Rows are already normalized, so plain equality is semantic equality.
    let changed_rows = (0..rows_a.len().max(rows_b.len()))
        .filter(|&i| rows_a.get(i) != rows_b.get(i))
        .count();

    TableSummary {
        rows_before: rows_a.len(),
        rows_after: rows_b.len(),
        changed_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_content::{ungroup, SnapshotContent};
    use dossier_schema::DocumentSchema;
    use dossier_store::OwnerId;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn index() -> SchemaIndex {
        let json = r#"{
            "kind": "project",
            "sections": [
                {
                    "id": "generalInfo",
                    "label": "General Info",
                    "fields": [
                        {"fieldId": "projectName", "label": "Project Name", "dataType": "string"},
                        {"fieldId": "loanAmount", "label": "Loan Amount", "dataType": "number"}
                    ]
                },
                {
                    "id": "financing",
                    "label": "Financing",
                    "subsections": [
                        {
                            "id": "terms",
                            "label": "Terms",
                            "fields": [
                                {"fieldId": "exitStrategy", "label": "Exit Strategy", "dataType": "string"},
                                {"fieldId": "rentRoll", "label": "Rent Roll", "dataType": "object-array"}
                            ]
                        }
                    ]
                }
            ]
        }"#;
        SchemaIndex::build(DocumentSchema::from_json(json).unwrap()).unwrap()
    }

    fn flat(value: serde_json::Value) -> FlatDocument {
        let content = SnapshotContent::from_map(value.as_object().unwrap().clone());
        ungroup(&content, &index())
    }

    fn run(doc_a: &FlatDocument, doc_b: &FlatDocument) -> DocumentDiff {
        let idx = index();
        let doc = DocumentRef::project(OwnerId::generate());
        diff_documents(&idx, doc, VersionId::generate(), VersionId::generate(), doc_a, doc_b)
    }

    #[test]
    fn identical_content_yields_empty_diff() {
        let a = flat(json!({"projectName": "Pier 7", "loanAmount": 5_000_000}));
        let diff = run(&a, &a.clone());
        assert!(diff.is_empty());
        assert_eq!(diff.change_count(), 0);
    }

    #[test]
    fn single_field_change() {
        let a = flat(json!({"exitStrategy": "Refinance"}));
        let b = flat(json!({"exitStrategy": "Sale"}));

        let diff = run(&a, &b);
        assert_eq!(diff.change_count(), 1);
        let section = &diff.sections[0];
        assert_eq!(section.section_id.as_str(), "financing");
        assert_eq!(section.label, "Financing");

        let change = &section.changes[0];
        assert_eq!(change.field_id.as_str(), "exitStrategy");
        assert_eq!(change.label, "Exit Strategy");
        assert_eq!(change.subsection_id.as_ref().map(|s| s.as_str()), Some("terms"));
        assert_eq!(change.before, Some(json!("Refinance")));
        assert_eq!(change.after, Some(json!("Sale")));
        assert!(!change.is_table_field());
    }

    #[test]
    fn normalization_hides_cosmetic_changes() {
        let a = flat(json!({"projectName": "Pier 7", "loanAmount": 5_000_000}));
        let b = flat(json!({"projectName": "  Pier 7  ", "loanAmount": 5_000_000.0}));
        assert!(run(&a, &b).is_empty());
    }

    #[test]
    fn envelope_and_bare_encodings_compare_equal() {
        let a = flat(json!({"projectName": "Pier 7"}));
        let b = flat(json!({
            "projectName": {"value": "Pier 7", "source": "om.pdf", "warnings": ["ocr"]}
        }));
        assert!(run(&a, &b).is_empty());
    }

    #[test]
    fn absent_fields_surface_as_added_and_removed() {
        let a = flat(json!({"projectName": "Pier 7"}));
        let b = flat(json!({"loanAmount": 1_000_000}));

        let diff = run(&a, &b);
        assert_eq!(diff.change_count(), 2);

        let removed = &diff.sections[0].changes[0];
        assert_eq!(removed.field_id.as_str(), "projectName");
        assert!(removed.is_removed());

        let added = &diff.sections[0].changes[1];
        assert_eq!(added.field_id.as_str(), "loanAmount");
        assert!(added.is_added());
    }

    #[test]
    fn changes_follow_schema_order_not_content_order() {
        let a = flat(json!({}));
        let b = flat(json!({
            "exitStrategy": "Sale",
            "projectName": "Pier 7",
            "loanAmount": 1
        }));

        let diff = run(&a, &b);
        let ids: Vec<&str> = diff.changes().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, vec!["projectName", "loanAmount", "exitStrategy"]);
        assert_eq!(diff.sections.len(), 2);
    }

    #[test]
    fn silent_sections_are_omitted() {
        let a = flat(json!({"projectName": "Pier 7", "exitStrategy": "Sale"}));
        let b = flat(json!({"projectName": "Pier 8", "exitStrategy": "Sale"}));

        let diff = run(&a, &b);
        assert_eq!(diff.sections.len(), 1);
        assert_eq!(diff.sections[0].section_id.as_str(), "generalInfo");
    }

    #[test]
    fn lock_states_ride_along() {
        let a = flat(json!({"projectName": "Pier 7", "_lockedFields": {"projectName": true}}));
        let b = flat(json!({"projectName": "Pier 8"}));

        let diff = run(&a, &b);
        let change = &diff.sections[0].changes[0];
        assert!(change.before_locked);
        assert!(!change.after_locked);
    }

    #[test]
    fn lock_only_changes_do_not_emit() {
        let a = flat(json!({"projectName": "Pier 7"}));
        let b = flat(json!({"projectName": "Pier 7", "_lockedFields": {"projectName": true}}));
        assert!(run(&a, &b).is_empty());
    }

    #[test]
    fn table_fields_carry_row_summaries() {
        let a = flat(json!({"rentRoll": [
            {"unit": "1A", "rent": 2100},
            {"unit": "1B", "rent": 1900}
        ]}));
        let b = flat(json!({"rentRoll": [
            {"unit": "1A", "rent": 2100},
            {"unit": "1B", "rent": 2000},
            {"unit": "2A", "rent": 2500}
        ]}));

        let diff = run(&a, &b);
        let change = &diff.sections[0].changes[0];
        assert!(change.is_table_field());
        assert_eq!(
            change.table,
            Some(TableSummary { rows_before: 2, rows_after: 3, changed_rows: 2 })
        );
    }

    #[test]
    fn legacy_fields_append_under_unknown_section() {
        let a = flat(json!({"zebraField": 1, "alphaField": "x", "projectName": "Pier 7"}));
        let b = flat(json!({"zebraField": 2, "alphaField": "x", "projectName": "Pier 7"}));

        let diff = run(&a, &b);
        assert_eq!(diff.sections.len(), 1);
        let section = diff.sections.last().unwrap();
        assert_eq!(section.section_id.as_str(), UNKNOWN_SECTION_ID);
        assert_eq!(section.label, "Unknown");
        assert_eq!(section.changes[0].field_id.as_str(), "zebraField");
        assert_eq!(section.changes[0].label, "zebraField");
    }

    #[test]
    fn unknown_section_sorts_lexicographically_and_comes_last() {
        let a = flat(json!({}));
        let b = flat(json!({
            "projectName": "Pier 7",
            "zed": 1,
            "aardvark": 2
        }));

        let diff = run(&a, &b);
        let ids: Vec<&str> = diff.changes().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, vec!["projectName", "aardvark", "zed"]);
    }

    #[test]
    fn swapping_sides_swaps_before_and_after() {
        let a = flat(json!({"projectName": "Pier 7"}));
        let b = flat(json!({"projectName": "Pier 8", "loanAmount": 5}));
        let idx = index();
        let doc = DocumentRef::project(OwnerId::generate());
        let (va, vb) = (VersionId::generate(), VersionId::generate());

        let forward = diff_documents(&idx, doc, va, vb, &a, &b);
        let reverse = diff_documents(&idx, doc, vb, va, &b, &a);

        assert_eq!(forward.change_count(), reverse.change_count());
        for (f, r) in forward.changes().zip(reverse.changes()) {
            assert_eq!(f.field_id, r.field_id);
            assert_eq!(f.before, r.after);
            assert_eq!(f.after, r.before);
            assert_eq!(f.before_locked, r.after_locked);
        }
    }
}
