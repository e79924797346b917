//! Save path integration tests
//!
//! Each test drives the full loop: fetch the current snapshot, plan the
//! merge, persist through the in-memory store, then read back through the
//! engine.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use dossier_content::{LockOverlay, StorageShape, LOCKS_KEY};
use dossier_engine::{DossierEngine, FieldMetadata, SaveRequest};
use dossier_schema::FieldId;
use dossier_store::{DocumentRef, MemoryVersionStore, OwnerId, VersionStore};
use dossier_test_utils::{content, extracted, project_index, project_store};
use dossier_value::{FieldValue, SourceDescriptor};

fn id(s: &str) -> FieldId {
    s.parse().unwrap()
}

#[tokio::test]
async fn in_place_save_merges_without_a_new_version() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store);

    let before = engine.current(&document).await.unwrap();
    let receipt = engine
        .save(
            &document,
            SaveRequest::new()
                .update("projectName", json!("Harborview Lofts"))
                .update("loanAmountRequested", json!(12_500_000)),
        )
        .await
        .unwrap();

    assert!(!receipt.created_version);
    assert_eq!(receipt.version, before.version);
    assert_eq!(receipt.sequence_number, 1);
    assert_eq!(receipt.applied, vec![id("loanAmountRequested"), id("projectName")]);

    // A later autosave merges on top instead of replacing.
    engine
        .save(&document, SaveRequest::new().update("propertyType", json!("Mixed Use")))
        .await
        .unwrap();

    let after = engine.current(&document).await.unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.fields[&id("projectName")].unwrapped(), &json!("Harborview Lofts"));
    assert_eq!(after.fields[&id("loanAmountRequested")].unwrapped(), &json!(12_500_000));
    assert_eq!(after.fields[&id("propertyType")].unwrapped(), &json!("Mixed Use"));
}

#[tokio::test]
async fn create_version_appends_and_moves_the_pointer() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store.clone());

    let first = engine.current(&document).await.unwrap();
    let mut request = SaveRequest::new()
        .update("projectName", json!("Harborview Lofts"))
        .as_new_version();
    request.created_by = Some("advisor-7".to_string());

    let receipt = engine.save(&document, request).await.unwrap();
    assert!(receipt.created_version);
    assert_ne!(receipt.version, first.version);
    assert_eq!(receipt.sequence_number, 2);

    let current = engine.current(&document).await.unwrap();
    assert_eq!(current.version, receipt.version);

    let appended = store.snapshot(receipt.version).await.unwrap();
    assert_eq!(appended.created_by.as_deref(), Some("advisor-7"));

    // The prior snapshot is untouched.
    let old = engine.version(first.version).await.unwrap();
    assert!(old.fields.is_empty());
}

#[tokio::test]
async fn receipt_accounts_for_every_update_key() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store.clone());

    let receipt = engine
        .save(
            &document,
            SaveRequest::new()
                .update("projectName", json!("Pier 7"))
                .update("ghostField", json!("never stored"))
                .update("propertyType", json!(true)),
        )
        .await
        .unwrap();

    assert_eq!(receipt.applied, vec![id("projectName")]);
    assert_eq!(receipt.dropped, vec!["ghostField".to_string()]);
    assert_eq!(receipt.rejected, vec![id("propertyType")]);

    // Dropped keys never reach the store in any shape.
    let stored = store.snapshot(receipt.version).await.unwrap();
    let raw = serde_json::to_string(&stored.content).unwrap();
    assert!(!raw.contains("ghostField"));
    assert!(!raw.contains("propertyType"));
}

#[tokio::test]
async fn type_guard_keeps_the_stored_value() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store);

    engine
        .save(&document, SaveRequest::new().update("loanAmountRequested", json!(5_000_000)))
        .await
        .unwrap();
    let receipt = engine
        .save(&document, SaveRequest::new().update("loanAmountRequested", json!(true)))
        .await
        .unwrap();

    assert_eq!(receipt.rejected, vec![id("loanAmountRequested")]);
    assert!(receipt.applied.is_empty());

    let view = engine.current(&document).await.unwrap();
    assert_eq!(view.fields[&id("loanAmountRequested")].unwrapped(), &json!(5_000_000));
}

#[tokio::test]
async fn locks_copy_forward_until_replaced() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store.clone());

    let mut locks = LockOverlay::new();
    locks.set(id("projectName"), true);
    engine
        .save(
            &document,
            SaveRequest::new().update("projectName", json!("Pier 7")).with_locks(locks),
        )
        .await
        .unwrap();

    // A save without an overlay leaves the stored locks alone.
    engine
        .save(&document, SaveRequest::new().update("unitCount", json!(48)))
        .await
        .unwrap();
    let view = engine.current(&document).await.unwrap();
    assert!(view.locks.is_locked(&id("projectName")));

    // A replacement overlay is wholesale, not merged.
    let mut replacement = LockOverlay::new();
    replacement.set(id("unitCount"), true);
    engine.save(&document, SaveRequest::new().with_locks(replacement)).await.unwrap();
    let view = engine.current(&document).await.unwrap();
    assert!(view.locks.is_locked(&id("unitCount")));
    assert!(!view.locks.is_locked(&id("projectName")));

    // An empty overlay clears the stored key entirely.
    engine
        .save(&document, SaveRequest::new().with_locks(LockOverlay::new()))
        .await
        .unwrap();
    let stored = store.current_snapshot(&document).await.unwrap();
    assert!(stored.content.get(LOCKS_KEY).is_none());
}

#[tokio::test]
async fn field_states_follow_the_same_overlay_rules() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store);

    let mut request = SaveRequest::new().update("projectName", json!("Pier 7"));
    request.field_states =
        Some(json!({"projectName": {"reviewed": true}}).as_object().unwrap().clone());
    engine.save(&document, request).await.unwrap();

    engine
        .save(&document, SaveRequest::new().update("unitCount", json!(12)))
        .await
        .unwrap();
    let view = engine.current(&document).await.unwrap();
    assert_eq!(view.field_states["projectName"], json!({"reviewed": true}));

    let mut clearing = SaveRequest::new();
    clearing.field_states = Some(serde_json::Map::new());
    engine.save(&document, clearing).await.unwrap();
    let view = engine.current(&document).await.unwrap();
    assert!(view.field_states.is_empty());
}

#[tokio::test]
async fn provenance_survives_the_full_save_loop() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store);

    engine
        .save(
            &document,
            SaveRequest::new()
                .update("squareFootage", extracted(json!(84_000), "offering-memo.pdf")),
        )
        .await
        .unwrap();

    // A later user edit keeps the document attribution.
    engine
        .save(&document, SaveRequest::new().update("squareFootage", json!(86_500)))
        .await
        .unwrap();

    let view = engine.current(&document).await.unwrap();
    let FieldValue::Rich(rich) = &view.fields[&id("squareFootage")] else {
        panic!("expected the stored envelope to survive");
    };
    assert_eq!(rich.value, json!(86_500));
    assert_eq!(rich.source, SourceDescriptor::document("offering-memo.pdf"));
}

#[tokio::test]
async fn caller_metadata_wraps_bare_updates() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store);

    engine
        .save(
            &document,
            SaveRequest::new()
                .update("occupancyRate", json!(0.93))
                .with_metadata("occupancyRate", FieldMetadata::from_document("rent-roll.xlsx")),
        )
        .await
        .unwrap();

    let view = engine.current(&document).await.unwrap();
    let FieldValue::Rich(rich) = &view.fields[&id("occupancyRate")] else {
        panic!("expected a fresh envelope");
    };
    assert_eq!(rich.value, json!(0.93));
    assert_eq!(rich.source, SourceDescriptor::document("rent-roll.xlsx"));
}

#[tokio::test]
async fn repeating_a_save_is_idempotent() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store.clone());

    let request = SaveRequest::new()
        .update("projectName", json!("Pier 7"))
        .update("exitStrategy", extracted(json!("Refinance"), "term-sheet.pdf"));

    let first = engine.save(&document, request.clone()).await.unwrap();
    let content_first = store.snapshot(first.version).await.unwrap().content;

    let second = engine.save(&document, request).await.unwrap();
    let content_second = store.snapshot(second.version).await.unwrap().content;

    assert_eq!(first.version, second.version);
    assert_eq!(content_first, content_second);
    assert_eq!(first.completeness_percent, second.completeness_percent);
}

#[tokio::test]
async fn completeness_tracks_required_fields() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store);

    // Three of the ten required fields.
    let receipt = engine
        .save(
            &document,
            SaveRequest::new()
                .update("projectName", json!("Pier 7"))
                .update("loanPurpose", json!("Acquisition"))
                .update("exitStrategy", json!("Refinance")),
        )
        .await
        .unwrap();
    assert_eq!(receipt.completeness_percent, 30);

    // A fourth required field raises the score.
    let receipt = engine
        .save(&document, SaveRequest::new().update("loanAmountRequested", json!(5_000_000)))
        .await
        .unwrap();
    assert_eq!(receipt.completeness_percent, 40);

    // Zeroing a number field withdraws its contribution.
    let receipt = engine
        .save(&document, SaveRequest::new().update("loanAmountRequested", json!(0)))
        .await
        .unwrap();
    assert_eq!(receipt.completeness_percent, 30);

    // Optional fields never move the score.
    let receipt = engine
        .save(&document, SaveRequest::new().update("unitCount", json!(64)))
        .await
        .unwrap();
    assert_eq!(receipt.completeness_percent, 30);

    let view = engine.current(&document).await.unwrap();
    assert_eq!(view.completeness_percent, 30);
}

#[tokio::test]
async fn saved_content_is_stored_grouped_with_the_shape_tag() {
    let (store, document) = project_store();
    let engine = DossierEngine::new(project_index(), store.clone());

    let receipt = engine
        .save(
            &document,
            SaveRequest::new()
                .update("projectName", json!("Pier 7"))
                .update("exitStrategy", json!("Refinance")),
        )
        .await
        .unwrap();

    let stored = store.snapshot(receipt.version).await.unwrap();
    assert_eq!(stored.content.shape_tag(), Some(StorageShape::Grouped));

    let map = stored.content.as_map();
    assert_eq!(map["generalInfo"]["projectName"], json!("Pier 7"));
    assert_eq!(map["financing"]["terms"]["exitStrategy"], json!("Refinance"));
}

#[tokio::test]
async fn legacy_fields_pass_through_saves_untouched() {
    let store = Arc::new(MemoryVersionStore::new());
    let document = DocumentRef::project(OwnerId::generate());
    store.seed_document(
        document,
        [content(json!({
            "brokerNotes": "call re: easement",
            "projectName": "Pier 7"
        }))],
    );

    let engine = DossierEngine::new(project_index(), store);
    engine
        .save(&document, SaveRequest::new().update("propertyType", json!("Industrial")))
        .await
        .unwrap();

    let view = engine.current(&document).await.unwrap();
    assert_eq!(view.fields[&id("brokerNotes")].unwrapped(), &json!("call re: easement"));
    assert_eq!(view.fields[&id("projectName")].unwrapped(), &json!("Pier 7"));
    assert_eq!(view.fields[&id("propertyType")].unwrapped(), &json!("Industrial"));
}
