//! Schema document model
//!
//! A [`DocumentSchema`] is a static, versioned description of every field a
//! document of a given kind can carry: top-level sections, optional
//! subsections, and field specs with display labels and data types. The
//! schema is the single source of field ordering and typing for the engines;
//! stored content never embeds structure of its own.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

use crate::ids::{FieldId, SectionId, SubsectionId};

/// Which document family a schema (or a stored document) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Project resume (deal-level facts)
    Project,
    /// Borrower resume (party-level facts)
    Borrower,
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => f.write_str("project"),
            Self::Borrower => f.write_str("borrower"),
        }
    }
}

/// Declared type of a field's value
///
/// Wire spelling is kebab-case (`string-array`, `object-array`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    /// Free text
    String,
    /// Numeric value (integer or float)
    Number,
    /// True/false flag
    Boolean,
    /// List of strings
    StringArray,
    /// List of homogeneous objects, rendered as a table
    ObjectArray,
}

impl DataType {
    /// Numeric fields treat a stored `0` as unfilled for completion purposes.
    #[inline]
    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, Self::Number)
    }

    /// Only boolean fields may store boolean values.
    #[inline]
    #[must_use]
    pub fn is_boolean(self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Object-array fields are summarized as tables in diff output.
    #[inline]
    #[must_use]
    pub fn is_table(self) -> bool {
        matches!(self, Self::ObjectArray)
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::StringArray => "string-array",
            Self::ObjectArray => "object-array",
        };
        f.write_str(s)
    }
}

/// A single field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Stable id used as the storage key
    pub field_id: FieldId,
    /// Human-readable label for diff and UI output
    pub label: String,
    /// Declared value type
    pub data_type: DataType,
}

/// A named group of fields nested inside a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subsection {
    /// Stable subsection id
    pub id: SubsectionId,
    /// Display label
    pub label: String,
    /// Fields in presentation order
    pub fields: Vec<FieldSpec>,
}

/// A top-level section: either direct fields or a list of subsections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Stable section id
    pub id: SectionId,
    /// Display label
    pub label: String,
    /// Direct fields or subsections, never both
    #[serde(flatten)]
    pub body: SectionBody,
}

/// The two section layouts
///
/// Untagged on the wire: a section object carries either a `fields` array
/// or a `subsections` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionBody {
    /// Section is split into subsections
    Subsections {
        /// Subsections in presentation order
        subsections: Vec<Subsection>,
    },
    /// Section holds fields directly
    Fields {
        /// Fields in presentation order
        fields: Vec<FieldSpec>,
    },
}

impl Section {
    /// Whether this section nests its fields inside subsections
    #[inline]
    #[must_use]
    pub fn has_subsections(&self) -> bool {
        matches!(self.body, SectionBody::Subsections { .. })
    }

    /// Direct fields, if this is a flat section
    #[must_use]
    pub fn direct_fields(&self) -> Option<&[FieldSpec]> {
        match &self.body {
            SectionBody::Fields { fields } => Some(fields),
            SectionBody::Subsections { .. } => None,
        }
    }

    /// Subsections, if this section has them
    #[must_use]
    pub fn subsections(&self) -> Option<&[Subsection]> {
        match &self.body {
            SectionBody::Subsections { subsections } => Some(subsections),
            SectionBody::Fields { .. } => None,
        }
    }

    /// All field specs under this section, in presentation order
    pub fn field_specs(&self) -> impl Iterator<Item = &FieldSpec> {
        let (direct, nested) = match &self.body {
            SectionBody::Fields { fields } => (Some(fields.iter()), None),
            SectionBody::Subsections { subsections } => {
                (None, Some(subsections.iter().flat_map(|s| s.fields.iter())))
            }
        };
        direct.into_iter().flatten().chain(nested.into_iter().flatten())
    }
}

/// Complete schema for one document kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSchema {
    /// Document family this schema describes
    pub kind: DocumentKind,
    /// Optional schema revision label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Sections in presentation order
    pub sections: Vec<Section>,
    /// Field ids that count toward the completion score
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<FieldId>,
}

impl DocumentSchema {
    /// Parse and validate a schema from JSON text.
    ///
    /// # Errors
    /// Returns [`SchemaError`] on malformed JSON, duplicate ids, or a
    /// `required` entry that names no declared field.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Parse and validate a schema from an in-memory JSON value.
    ///
    /// # Errors
    /// Same failure modes as [`DocumentSchema::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_value(value)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Check structural invariants: ids unique, required ids declared.
    ///
    /// # Errors
    /// Returns the first violation found, in presentation order.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut section_ids = std::collections::HashSet::new();
        let mut field_ids = std::collections::HashSet::new();

        for section in &self.sections {
            if !section_ids.insert(&section.id) {
                return Err(SchemaError::DuplicateSection(section.id.clone()));
            }
            if let Some(subsections) = section.subsections() {
                let mut sub_ids = std::collections::HashSet::new();
                for sub in subsections {
                    if !sub_ids.insert(&sub.id) {
                        return Err(SchemaError::DuplicateSubsection {
                            subsection: sub.id.clone(),
                            section: section.id.clone(),
                        });
                    }
                }
            }
            for spec in section.field_specs() {
                if !field_ids.insert(&spec.field_id) {
                    return Err(SchemaError::DuplicateField(spec.field_id.clone()));
                }
            }
        }

        for required in &self.required {
            if !field_ids.contains(required) {
                return Err(SchemaError::UnknownRequired(required.clone()));
            }
        }

        Ok(())
    }

    /// Total number of declared fields
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.field_specs().count()).sum()
    }
}

/// Errors raised while loading or validating a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Malformed schema JSON
    #[error("schema parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Same field id declared twice
    #[error("duplicate field id '{0}' in schema")]
    DuplicateField(FieldId),

    /// Same section id declared twice
    #[error("duplicate section id '{0}' in schema")]
    DuplicateSection(SectionId),

    /// Same subsection id declared twice within one section
    #[error("duplicate subsection id '{subsection}' in section '{section}'")]
    DuplicateSubsection {
        /// The colliding subsection id
        subsection: SubsectionId,
        /// Section that contains the collision
        section: SectionId,
    },

    /// `required` entry that no section declares
    #[error("required list names unknown field '{0}'")]
    UnknownRequired(FieldId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"{
            "kind": "project",
            "version": "2024-11",
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
                                {"fieldId": "interestOnly", "label": "Interest Only", "dataType": "boolean"},
                                {"fieldId": "comparables", "label": "Comparables", "dataType": "object-array"}
                            ]
                        }
                    ]
                }
            ],
            "required": ["projectName", "loanAmount"]
        }"#
    }

    #[test]
    fn parses_mixed_section_layouts() {
        let schema = DocumentSchema::from_json(sample_json()).unwrap();
        assert_eq!(schema.kind, DocumentKind::Project);
        assert_eq!(schema.version.as_deref(), Some("2024-11"));
        assert_eq!(schema.sections.len(), 2);
        assert!(!schema.sections[0].has_subsections());
        assert!(schema.sections[1].has_subsections());
        assert_eq!(schema.field_count(), 4);
    }

    #[test]
    fn data_type_uses_kebab_case() {
        let dt: DataType = serde_json::from_str("\"object-array\"").unwrap();
        assert_eq!(dt, DataType::ObjectArray);
        assert!(dt.is_table());
        assert_eq!(serde_json::to_string(&DataType::StringArray).unwrap(), "\"string-array\"");
    }

    #[test]
    fn field_specs_walk_subsections_in_order() {
        let schema = DocumentSchema::from_json(sample_json()).unwrap();
        let ids: Vec<&str> = schema.sections[1].field_specs().map(|f| f.field_id.as_str()).collect();
        assert_eq!(ids, vec!["interestOnly", "comparables"]);
    }

    #[test]
    fn duplicate_field_id_rejected() {
        let json = r#"{
            "kind": "borrower",
            "sections": [
                {"id": "a", "label": "A", "fields": [
                    {"fieldId": "x", "label": "X", "dataType": "string"},
                    {"fieldId": "x", "label": "X again", "dataType": "string"}
                ]}
            ]
        }"#;
        let err = DocumentSchema::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(id) if id == "x"));
    }

    #[test]
    fn unknown_required_rejected() {
        let json = r#"{
            "kind": "borrower",
            "sections": [
                {"id": "a", "label": "A", "fields": [
                    {"fieldId": "x", "label": "X", "dataType": "string"}
                ]}
            ],
            "required": ["missing"]
        }"#;
        let err = DocumentSchema::from_json(json).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownRequired(id) if id == "missing"));
    }

    #[test]
    fn required_defaults_to_empty() {
        let json = r#"{
            "kind": "borrower",
            "sections": [
                {"id": "a", "label": "A", "fields": [
                    {"fieldId": "x", "label": "X", "dataType": "string"}
                ]}
            ]
        }"#;
        let schema = DocumentSchema::from_json(json).unwrap();
        assert!(schema.required.is_empty());
        assert!(schema.version.is_none());
    }

    #[test]
    fn schema_round_trips_through_json() {
        let schema = DocumentSchema::from_json(sample_json()).unwrap();
        let text = serde_json::to_string(&schema).unwrap();
        let back = DocumentSchema::from_json(&text).unwrap();
        assert_eq!(back, schema);
    }
}
