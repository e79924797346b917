//! Precomputed lookup index over a [`DocumentSchema`]
//!
//! The engines never walk raw schema JSON. They hold an [`SchemaIndex`]
//! (usually behind an `Arc`) and ask it for membership, position, ordering
//! and typing answers in O(1).

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::ids::{FieldId, SectionId, SubsectionId};
use crate::model::{DataType, DocumentKind, DocumentSchema, FieldSpec, SchemaError};

/// Where a field sits in the presentation tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLocation {
    /// Owning section
    pub section_id: SectionId,
    /// Owning subsection, if the section has them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsection_id: Option<SubsectionId>,
    /// Zero-based position among the parent's fields
    pub index_within_parent: usize,
}

/// One entry of the schema-ordered field traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedField {
    /// The field declaration
    #[serde(flatten)]
    pub spec: FieldSpec,
    /// Position of the field
    #[serde(flatten)]
    pub location: FieldLocation,
}

/// Set of field ids that count toward the completion score
///
/// Iteration follows schema declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredFields(IndexSet<FieldId>);

impl RequiredFields {
    /// Build from any id collection; duplicates collapse silently.
    pub fn new(ids: impl IntoIterator<Item = FieldId>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &FieldId) -> bool {
        self.0.contains(id)
    }

    /// Number of required fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no field is required
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate ids in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &FieldId> {
        self.0.iter()
    }
}

impl FromIterator<FieldId> for RequiredFields {
    fn from_iter<T: IntoIterator<Item = FieldId>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Lookup failure for an id the schema does not declare
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown field id '{0}'")]
pub struct UnknownField(pub FieldId);

/// Immutable lookup structure built once per schema
#[derive(Debug)]
pub struct SchemaIndex {
    schema: DocumentSchema,
    ordered: Vec<OrderedField>,
    by_field: HashMap<FieldId, usize>,
    field_ids: IndexSet<FieldId>,
    subsectioned: HashSet<SectionId>,
    section_labels: HashMap<SectionId, String>,
    subsection_labels: HashMap<SubsectionId, String>,
    required: RequiredFields,
}

impl SchemaIndex {
    /// Validate the schema and build the index.
    ///
    /// # Errors
    /// Returns [`SchemaError`] when the schema fails
    /// [`DocumentSchema::validate`].
    pub fn build(schema: DocumentSchema) -> Result<Self, SchemaError> {
        schema.validate()?;

        let mut ordered = Vec::with_capacity(schema.field_count());
        let mut by_field = HashMap::new();
        let mut field_ids = IndexSet::new();
        let mut subsectioned = HashSet::new();
        let mut section_labels = HashMap::new();
        let mut subsection_labels = HashMap::new();

        for section in &schema.sections {
            section_labels.insert(section.id.clone(), section.label.clone());

            if let Some(subsections) = section.subsections() {
                subsectioned.insert(section.id.clone());
                for sub in subsections {
                    subsection_labels.insert(sub.id.clone(), sub.label.clone());
                    for (idx, spec) in sub.fields.iter().enumerate() {
                        let entry = OrderedField {
                            spec: spec.clone(),
                            location: FieldLocation {
                                section_id: section.id.clone(),
                                subsection_id: Some(sub.id.clone()),
                                index_within_parent: idx,
                            },
                        };
                        by_field.insert(spec.field_id.clone(), ordered.len());
                        field_ids.insert(spec.field_id.clone());
                        ordered.push(entry);
                    }
                }
            } else if let Some(fields) = section.direct_fields() {
                for (idx, spec) in fields.iter().enumerate() {
                    let entry = OrderedField {
                        spec: spec.clone(),
                        location: FieldLocation {
                            section_id: section.id.clone(),
                            subsection_id: None,
                            index_within_parent: idx,
                        },
                    };
                    by_field.insert(spec.field_id.clone(), ordered.len());
                    field_ids.insert(spec.field_id.clone());
                    ordered.push(entry);
                }
            }
        }

        let required = schema.required.iter().cloned().collect();

        Ok(Self {
            schema,
            ordered,
            by_field,
            field_ids,
            subsectioned,
            section_labels,
            subsection_labels,
            required,
        })
    }

    /// Document kind this index describes
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.schema.kind
    }

    /// Underlying schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    /// Whether the schema declares this field
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &FieldId) -> bool {
        self.by_field.contains_key(id)
    }

    /// Membership test from a raw storage key
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.by_field.contains_key(key)
    }

    /// Whether a raw storage key names a top-level section
    #[inline]
    #[must_use]
    pub fn is_section_key(&self, key: &str) -> bool {
        self.section_labels.contains_key(key)
    }

    /// Whether a raw storage key names a subsection
    #[inline]
    #[must_use]
    pub fn is_subsection_key(&self, key: &str) -> bool {
        self.subsection_labels.contains_key(key)
    }

    /// All declared field ids in schema order
    pub fn field_ids(&self) -> impl Iterator<Item = &FieldId> {
        self.field_ids.iter()
    }

    /// Number of declared fields
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.ordered.len()
    }

    /// Full schema-ordered traversal
    #[inline]
    #[must_use]
    pub fn ordered_fields(&self) -> &[OrderedField] {
        &self.ordered
    }

    /// Position of a field in the presentation tree.
    ///
    /// # Errors
    /// Returns [`UnknownField`] for ids the schema does not declare.
    pub fn locate(&self, id: &FieldId) -> Result<&FieldLocation, UnknownField> {
        self.by_field
            .get(id)
            .map(|&i| &self.ordered[i].location)
            .ok_or_else(|| UnknownField(id.clone()))
    }

    /// Declaration of a field.
    ///
    /// # Errors
    /// Returns [`UnknownField`] for ids the schema does not declare.
    pub fn field_spec(&self, id: &FieldId) -> Result<&FieldSpec, UnknownField> {
        self.by_field
            .get(id)
            .map(|&i| &self.ordered[i].spec)
            .ok_or_else(|| UnknownField(id.clone()))
    }

    /// Declared data type, if the field exists
    #[must_use]
    pub fn data_type(&self, id: &FieldId) -> Option<DataType> {
        self.by_field.get(id).map(|&i| self.ordered[i].spec.data_type)
    }

    /// Whether a section nests its fields inside subsections
    #[inline]
    #[must_use]
    pub fn section_has_subsections(&self, id: &SectionId) -> bool {
        self.subsectioned.contains(id)
    }

    /// Display label of a section
    #[must_use]
    pub fn section_label(&self, id: &SectionId) -> Option<&str> {
        self.section_labels.get(id).map(String::as_str)
    }

    /// Display label of a subsection
    #[must_use]
    pub fn subsection_label(&self, id: &SubsectionId) -> Option<&str> {
        self.subsection_labels.get(id).map(String::as_str)
    }

    /// Fields counted by the completion score
    #[inline]
    #[must_use]
    pub fn required(&self) -> &RequiredFields {
        &self.required
    }
}
