//! Donor selection for seeding a fresh borrower resume
//!
//! A new project's borrower resume can start from the most complete
//! borrower resume elsewhere in the same organization. This module holds
//! the pure selection rule; gathering the candidate rows is the caller's
//! concern.

use chrono::{DateTime, Utc};

use dossier_content::{ungroup, SnapshotContent, COMPLETENESS_KEY};
use dossier_schema::SchemaIndex;
use dossier_store::DocumentRef;
use dossier_value::percent;

/// One borrower resume eligible to donate its content
#[derive(Debug, Clone)]
pub struct DonorCandidate {
    /// Document the content belongs to
    pub document: DocumentRef,
    /// Stored content, in whatever shape it was written
    pub content: SnapshotContent,
    /// Best known completeness score
    pub completeness_percent: i64,
    /// Last write to the document
    pub updated_at: DateTime<Utc>,
}

impl DonorCandidate {
    /// Candidate from a stored row.
    ///
    /// A zero or absent stored score falls back to the score embedded in
    /// legacy content, parsed leniently.
    #[must_use]
    pub fn new(
        document: DocumentRef,
        content: SnapshotContent,
        stored_percent: Option<i64>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let completeness_percent = match stored_percent {
            Some(score) if score != 0 => score,
            _ => content.get(COMPLETENESS_KEY).map(percent::parse_lenient).unwrap_or(0),
        };
        Self { document, content, completeness_percent, updated_at }
    }
}

/// Pick the donor worth copying from.
///
/// Candidates rank by completeness, recency breaking ties. The first ranked
/// candidate that is both scored above zero and actually holds data wins;
/// failing that, the first that holds data; failing that, the top-ranked
/// one. Empty input selects nothing.
#[must_use]
pub fn select_donor<'a>(
    candidates: &'a [DonorCandidate],
    index: &SchemaIndex,
) -> Option<&'a DonorCandidate> {
    if candidates.is_empty() {
        return None;
    }

    let mut ranked: Vec<&DonorCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.completeness_percent
            .cmp(&a.completeness_percent)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });

    let mut first_with_data = None;
    for &candidate in &ranked {
        let has_data = ungroup(&candidate.content, index).has_meaningful_content();
        if candidate.completeness_percent > 0 && has_data {
            return Some(candidate);
        }
        if has_data && first_with_data.is_none() {
            first_with_data = Some(candidate);
        }
    }

    first_with_data.or_else(|| ranked.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dossier_schema::DocumentSchema;
    use dossier_store::OwnerId;
    use serde_json::json;

    fn index() -> SchemaIndex {
        let json = r#"{
            "kind": "borrower",
            "sections": [
                {
                    "id": "sponsor",
                    "label": "Sponsor",
                    "fields": [
                        {"fieldId": "sponsorName", "label": "Name", "dataType": "string"},
                        {"fieldId": "netWorth", "label": "Net Worth", "dataType": "number"}
                    ]
                }
            ]
        }"#;
        SchemaIndex::build(DocumentSchema::from_json(json).unwrap()).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
    }

    fn candidate(value: serde_json::Value, percent: Option<i64>, day: u32) -> DonorCandidate {
        DonorCandidate::new(
            DocumentRef::borrower(OwnerId::generate()),
            SnapshotContent::from_map(value.as_object().unwrap().clone()),
            percent,
            at(day),
        )
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert!(select_donor(&[], &index()).is_none());
    }

    #[test]
    fn most_complete_meaningful_candidate_wins() {
        let idx = index();
        let candidates = vec![
            candidate(json!({"sponsorName": "Alice Chen"}), Some(20), 3),
            candidate(json!({"sponsorName": "Bob Okafor", "netWorth": 2_000_000}), Some(60), 1),
        ];
        let selected = select_donor(&candidates, &idx).unwrap();
        assert_eq!(selected.completeness_percent, 60);
    }

    #[test]
    fn recency_breaks_completeness_ties() {
        let idx = index();
        let candidates = vec![
            candidate(json!({"sponsorName": "Older"}), Some(40), 1),
            candidate(json!({"sponsorName": "Newer"}), Some(40), 9),
        ];
        let selected = select_donor(&candidates, &idx).unwrap();
        assert_eq!(selected.content.get("sponsorName"), Some(&json!("Newer")));
    }

    #[test]
    fn scored_but_empty_candidates_lose_to_meaningful_ones() {
        let idx = index();
        // Highest score has no actual data (bookkeeping keys only)
        let candidates = vec![
            candidate(json!({"completenessPercent": 90, "updatedAt": "2024-06-01"}), Some(90), 5),
            candidate(json!({"sponsorName": "Alice Chen"}), None, 2),
        ];
        let selected = select_donor(&candidates, &idx).unwrap();
        assert_eq!(selected.content.get("sponsorName"), Some(&json!("Alice Chen")));
    }

    #[test]
    fn nothing_meaningful_selects_the_top_ranked() {
        let idx = index();
        let candidates = vec![
            candidate(json!({}), Some(10), 1),
            candidate(json!({}), Some(30), 2),
        ];
        let selected = select_donor(&candidates, &idx).unwrap();
        assert_eq!(selected.completeness_percent, 30);
    }

    #[test]
    fn constructor_recovers_embedded_legacy_score() {
        let with_embedded = candidate(json!({"completenessPercent": "45"}), Some(0), 1);
        assert_eq!(with_embedded.completeness_percent, 45);

        let with_column = candidate(json!({"completenessPercent": "45"}), Some(70), 1);
        assert_eq!(with_column.completeness_percent, 70);

        let with_neither = candidate(json!({}), None, 1);
        assert_eq!(with_neither.completeness_percent, 0);
    }

    #[test]
    fn zero_scored_meaningful_grouped_content_still_donates() {
        let idx = index();
        let candidates = vec![candidate(
            json!({"_shape": "grouped", "sponsor": {"sponsorName": "Alice Chen"}}),
            None,
            1,
        )];
        let selected = select_donor(&candidates, &idx).unwrap();
        assert_eq!(selected.completeness_percent, 0);
    }
}
