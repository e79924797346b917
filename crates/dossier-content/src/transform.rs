//! Flat/grouped shape transforms
//!
//! Snapshots written at different points in a document's history may use
//! different layouts: flat (field id at the top level) or grouped (nested
//! under section and subsection ids). Every engine works on the flat form;
//! these functions move content between the two, driven entirely by the
//! schema index, and never lose data they do not understand.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use dossier_schema::{FieldId, SchemaIndex, SectionId};
use dossier_value::FieldValue;

use crate::types::{
    is_reserved_key, FlatDocument, LockOverlay, SnapshotContent, StorageShape, FIELD_STATES_KEY,
    LOCKS_KEY, SHAPE_KEY,
};

/// Resolve the layout of a stored content object.
///
/// An explicit [`SHAPE_KEY`] tag always wins. Untagged (legacy) content is
/// sniffed: any top-level key naming a known section means grouped,
/// otherwise flat.
#[must_use]
pub fn detect_shape(content: &SnapshotContent, index: &SchemaIndex) -> StorageShape {
    if let Some(tag) = content.shape_tag() {
        return tag;
    }
    let grouped = content
        .as_map()
        .keys()
        .any(|key| !is_reserved_key(key) && index.is_section_key(key));
    if grouped {
        StorageShape::Grouped
    } else {
        StorageShape::Flat
    }
}

/// Flatten stored content into the canonical working form.
///
/// Total over anything a store can return: reserved keys split into their
/// overlays, known sections are walked into fields, and every key the
/// schema does not explain is kept (as a legacy field when it could be a
/// field id, verbatim in `extras` otherwise).
#[must_use]
pub fn ungroup(content: &SnapshotContent, index: &SchemaIndex) -> FlatDocument {
    let shape = detect_shape(content, index);
    let mut doc = FlatDocument::new();

    for (key, value) in content.as_map() {
        if key == SHAPE_KEY {
            continue;
        }
        if key == LOCKS_KEY {
            doc.locks = LockOverlay::from_value_lenient(value);
            continue;
        }
        if key == FIELD_STATES_KEY {
            if let Some(states) = value.as_object() {
                doc.field_states = states.clone();
            } else {
                doc.extras.insert(key.clone(), value.clone());
            }
            continue;
        }
        if is_reserved_key(key) {
            doc.extras.insert(key.clone(), value.clone());
            continue;
        }
        if shape == StorageShape::Grouped && index.is_section_key(key) {
            if let (Ok(section_id), Some(section_map)) =
                (key.parse::<SectionId>(), value.as_object())
            {
                flatten_section(&section_id, section_map, index, &mut doc);
            } else {
                // A section key holding a non-object is corrupt; keep it.
                doc.extras.insert(key.clone(), value.clone());
            }
            continue;
        }
        insert_field(&mut doc, key, value);
    }

    doc
}

fn flatten_section(
    section_id: &SectionId,
    section_map: &Map<String, Value>,
    index: &SchemaIndex,
    doc: &mut FlatDocument,
) {
    let subsectioned = index.section_has_subsections(section_id);

    for (child_key, child_value) in section_map {
        // Known fields are fields no matter where they were written.
        if index.contains_key(child_key) {
            insert_field(doc, child_key, child_value);
            continue;
        }

        let child_map = child_value.as_object();
        let is_subsection = child_map.is_some()
            && (index.is_subsection_key(child_key)
                || (subsectioned && !FieldValue::is_envelope(child_value)));

        if is_subsection {
            if let Some(sub_map) = child_map {
                for (field_key, field_value) in sub_map {
                    insert_field(doc, field_key, field_value);
                }
            }
        } else {
            insert_field(doc, child_key, child_value);
        }
    }
}

fn insert_field(doc: &mut FlatDocument, key: &str, value: &Value) {
    match key.parse::<FieldId>() {
        Ok(id) => {
            doc.fields.insert(id, FieldValue::from_raw(value.clone()));
        }
        Err(_) => {
            doc.extras.insert(key.to_string(), value.clone());
        }
    }
}

/// Assemble the grouped storage form of a flat document.
///
/// Known fields nest under their schema location; legacy ids the active
/// schema no longer declares stay at the top level so the next read can
/// still see them. Overlays and extras re-attach at the top level, and the
/// output always carries the explicit grouped tag.
#[must_use]
pub fn group(flat: &FlatDocument, index: &SchemaIndex) -> SnapshotContent {
    let mut root = Map::new();
    root.insert(
        SHAPE_KEY.to_string(),
        Value::String(StorageShape::Grouped.as_str().to_string()),
    );

    for (id, value) in &flat.fields {
        let wire = value.to_wire();
        if let Ok(location) = index.locate(id) {
            let section = child_object(&mut root, location.section_id.as_str());
            match &location.subsection_id {
                Some(sub) => {
                    child_object(section, sub.as_str()).insert(id.as_str().to_string(), wire);
                }
                None => {
                    section.insert(id.as_str().to_string(), wire);
                }
            }
        } else {
            root.insert(id.as_str().to_string(), wire);
        }
    }

    if !flat.locks.is_empty() {
        root.insert(LOCKS_KEY.to_string(), flat.locks.to_value());
    }
    if !flat.field_states.is_empty() {
        root.insert(
            FIELD_STATES_KEY.to_string(),
            Value::Object(flat.field_states.clone()),
        );
    }
    for (key, value) in &flat.extras {
        root.insert(key.clone(), value.clone());
    }

    SnapshotContent::from_map(root)
}

/// Apply flat field updates on top of stored content without disturbing
/// anything else.
///
/// Grouped content is edited in place, so sections the update does not
/// touch (including historical sections the active schema no longer knows)
/// keep their stored bytes. Flat content converts to grouped first. Updates
/// whose ids the schema does not declare are skipped; callers filter those
/// out before getting here.
#[must_use]
pub fn merge_grouped(
    existing: &SnapshotContent,
    updates: &IndexMap<FieldId, FieldValue>,
    index: &SchemaIndex,
) -> SnapshotContent {
    let mut root = match detect_shape(existing, index) {
        StorageShape::Flat => group(&ungroup(existing, index), index).into_map(),
        StorageShape::Grouped => {
            let mut map = existing.as_map().clone();
            map.insert(
                SHAPE_KEY.to_string(),
                Value::String(StorageShape::Grouped.as_str().to_string()),
            );
            map
        }
    };

    for (id, value) in updates {
        let Ok(location) = index.locate(id) else { continue };
        let wire = value.to_wire();
        let section = child_object(&mut root, location.section_id.as_str());
        match &location.subsection_id {
            Some(sub) => {
                child_object(section, sub.as_str()).insert(id.as_str().to_string(), wire);
            }
            None => {
                section.insert(id.as_str().to_string(), wire);
            }
        }
    }

    SnapshotContent::from_map(root)
}

fn child_object<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    if !parent.get(key).is_some_and(Value::is_object) {
        parent.insert(key.to_string(), Value::Object(Map::new()));
    }
    match parent.get_mut(key) {
        Some(Value::Object(map)) => map,
        _ => unreachable!("entry was just made an object"),
    }
}
