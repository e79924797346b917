//! Completion scoring
//!
//! A document's completeness is the share of required fields that actually
//! hold data, as a whole percent. Scoring is pure: the same flat document
//! and required set always produce the same score, which is what lets the
//! stored score be re-derived (and repaired) at any time.

use dossier_content::{FlatDocument, COMPLETENESS_KEY};
use dossier_schema::{DataType, FieldId, RequiredFields, SchemaIndex};
use dossier_value::{is_empty_value, is_zero_number, percent, FieldValue};

/// Whether a stored value counts toward completion.
///
/// Empty values never count. Number-typed fields holding exactly zero don't
/// either: zero means "not yet provided" for every numeric field in this
/// domain (loan amounts, unit counts, square footage).
#[must_use]
pub fn is_filled(value: &FieldValue, data_type: Option<DataType>) -> bool {
    let inner = value.unwrapped();
    if is_empty_value(inner) {
        return false;
    }
    if data_type.is_some_and(DataType::is_number) && is_zero_number(inner) {
        return false;
    }
    true
}

/// Score a flat document against a required-field set.
///
/// `round(100 * filled / required)`, an integer 0 to 100. An empty required
/// set scores 0, not 100: a document kind with nothing required has nothing
/// to be complete about.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn completion_percent(
    doc: &FlatDocument,
    required: &RequiredFields,
    index: &SchemaIndex,
) -> i64 {
    if required.is_empty() {
        return 0;
    }
    let filled = required
        .iter()
        .filter(|id| is_field_filled(doc, id, index))
        .count();
    (100.0 * filled as f64 / required.len() as f64).round() as i64
}

fn is_field_filled(doc: &FlatDocument, id: &FieldId, index: &SchemaIndex) -> bool {
    doc.get(id)
        .is_some_and(|value| is_filled(value, index.data_type(id)))
}

/// Resolve the score to report for a stored snapshot.
///
/// Trust the stored score unless it is exactly zero; a zero falls back to
/// the score embedded in legacy content, then to the freshly computed one.
/// The asymmetry is a compatibility shim: historical writers sometimes
/// persisted zero for documents that plainly had data, and those snapshots
/// still have to read correctly.
#[must_use]
pub fn effective_completion(stored: i64, doc: &FlatDocument, computed: i64) -> i64 {
    if stored != 0 {
        return stored;
    }
    let embedded = doc
        .extras
        .get(COMPLETENESS_KEY)
        .map(percent::parse_lenient)
        .unwrap_or(0);
    if embedded != 0 {
        return embedded;
    }
    computed
}
