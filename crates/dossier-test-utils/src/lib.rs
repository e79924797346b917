//! Testing utilities for the dossier workspace
//!
//! Shared schema fixtures, content builders, and store setup helpers.

#![allow(missing_docs)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use dossier_content::SnapshotContent;
use dossier_schema::{DocumentSchema, SchemaIndex};
use dossier_store::{DocumentRef, MemoryVersionStore, OwnerId};

static PROJECT_INDEX: Lazy<Arc<SchemaIndex>> = Lazy::new(|| {
    Arc::new(SchemaIndex::build(project_schema()).expect("fixture schema is valid"))
});

static BORROWER_INDEX: Lazy<Arc<SchemaIndex>> = Lazy::new(|| {
    Arc::new(SchemaIndex::build(borrower_schema()).expect("fixture schema is valid"))
});

/// Project resume schema used across the integration suites.
///
/// Nineteen fields over five sections (two of them subsectioned), ten of
/// them required, one table field per flavor of content the engines see.
pub fn project_schema() -> DocumentSchema {
    DocumentSchema::from_value(json!({
        "kind": "project",
        "version": "2024-11",
        "sections": [
            {
                "id": "generalInfo",
                "label": "General Info",
                "fields": [
                    {"fieldId": "projectName", "label": "Project Name", "dataType": "string"},
                    {"fieldId": "projectAddress", "label": "Project Address", "dataType": "string"},
                    {"fieldId": "propertyType", "label": "Property Type", "dataType": "string"},
                    {"fieldId": "unitCount", "label": "Unit Count", "dataType": "number"}
                ]
            },
            {
                "id": "loanRequest",
                "label": "Loan Request",
                "fields": [
                    {"fieldId": "loanAmountRequested", "label": "Loan Amount Requested", "dataType": "number"},
                    {"fieldId": "loanPurpose", "label": "Loan Purpose", "dataType": "string"},
                    {"fieldId": "targetCloseDate", "label": "Target Close Date", "dataType": "string"}
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
                            {"fieldId": "interestOnly", "label": "Interest Only", "dataType": "boolean"},
                            {"fieldId": "requestedTermMonths", "label": "Requested Term (Months)", "dataType": "number"}
                        ]
                    },
                    {
                        "id": "sourcesUses",
                        "label": "Sources & Uses",
                        "fields": [
                            {"fieldId": "totalProjectCost", "label": "Total Project Cost", "dataType": "number"},
                            {"fieldId": "equityContribution", "label": "Equity Contribution", "dataType": "number"}
                        ]
                    }
                ]
            },
            {
                "id": "property",
                "label": "Property Details",
                "subsections": [
                    {
                        "id": "site",
                        "label": "Site",
                        "fields": [
                            {"fieldId": "lotSizeAcres", "label": "Lot Size (Acres)", "dataType": "number"},
                            {"fieldId": "zoningDesignation", "label": "Zoning Designation", "dataType": "string"}
                        ]
                    },
                    {
                        "id": "improvements",
                        "label": "Improvements",
                        "fields": [
                            {"fieldId": "yearBuilt", "label": "Year Built", "dataType": "number"},
                            {"fieldId": "squareFootage", "label": "Square Footage", "dataType": "number"}
                        ]
                    }
                ]
            },
            {
                "id": "operations",
                "label": "Operations",
                "fields": [
                    {"fieldId": "rentRoll", "label": "Rent Roll", "dataType": "object-array"},
                    {"fieldId": "keyTenants", "label": "Key Tenants", "dataType": "string-array"},
                    {"fieldId": "occupancyRate", "label": "Occupancy Rate", "dataType": "number"}
                ]
            }
        ],
        "required": [
            "projectName",
            "projectAddress",
            "propertyType",
            "loanAmountRequested",
            "loanPurpose",
            "exitStrategy",
            "totalProjectCost",
            "equityContribution",
            "squareFootage",
            "occupancyRate"
        ]
    }))
    .expect("fixture schema parses")
}

/// Borrower resume schema: smaller, no subsections.
pub fn borrower_schema() -> DocumentSchema {
    DocumentSchema::from_value(json!({
        "kind": "borrower",
        "sections": [
            {
                "id": "sponsor",
                "label": "Sponsor",
                "fields": [
                    {"fieldId": "sponsorName", "label": "Sponsor Name", "dataType": "string"},
                    {"fieldId": "yearsExperience", "label": "Years of Experience", "dataType": "number"},
                    {"fieldId": "netWorth", "label": "Net Worth", "dataType": "number"},
                    {"fieldId": "liquidity", "label": "Liquidity", "dataType": "number"}
                ]
            },
            {
                "id": "trackRecord",
                "label": "Track Record",
                "fields": [
                    {"fieldId": "dealsCompleted", "label": "Deals Completed", "dataType": "number"},
                    {"fieldId": "priorDefaults", "label": "Prior Defaults", "dataType": "boolean"}
                ]
            }
        ],
        "required": ["sponsorName", "yearsExperience", "netWorth", "liquidity"]
    }))
    .expect("fixture schema parses")
}

/// Shared index over [`project_schema`]
pub fn project_index() -> Arc<SchemaIndex> {
    Arc::clone(&PROJECT_INDEX)
}

/// Shared index over [`borrower_schema`]
pub fn borrower_index() -> Arc<SchemaIndex> {
    Arc::clone(&BORROWER_INDEX)
}

/// Content object from a JSON literal; panics on non-objects.
pub fn content(value: Value) -> SnapshotContent {
    SnapshotContent::from_map(value.as_object().expect("content fixture is an object").clone())
}

/// Provenance envelope naming the document a value came from
pub fn extracted(value: Value, document_name: &str) -> Value {
    json!({
        "value": value,
        "source": {"type": "document", "name": document_name},
        "warnings": [],
        "otherValues": []
    })
}

/// Store with one registered project document
pub fn project_store() -> (Arc<MemoryVersionStore>, DocumentRef) {
    let store = MemoryVersionStore::new();
    let document = DocumentRef::project(OwnerId::generate());
    store.create_document(document, None).expect("fresh store has no documents");
    (Arc::new(store), document)
}

/// Store with one registered borrower document
pub fn borrower_store() -> (Arc<MemoryVersionStore>, DocumentRef) {
    let store = MemoryVersionStore::new();
    let document = DocumentRef::borrower(OwnerId::generate());
    store.create_document(document, None).expect("fresh store has no documents");
    (Arc::new(store), document)
}
