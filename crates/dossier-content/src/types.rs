//! Stored content model
//!
//! A snapshot's `content` is one JSON object. Alongside the field data it
//! may carry reserved top-level keys: the storage-shape tag, the lock
//! overlay, free-form per-field UI state, and a handful of keys older
//! writers used to stash metadata in. [`SnapshotContent`] is that object as
//! persisted; [`FlatDocument`] is the parsed, canonical working form every
//! engine computes on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

use dossier_schema::FieldId;
use dossier_value::FieldValue;

/// Reserved key carrying the explicit storage-shape tag
pub const SHAPE_KEY: &str = "_shape";

/// Reserved key carrying the lock overlay
pub const LOCKS_KEY: &str = "_lockedFields";

/// Reserved key carrying free-form per-field UI state
pub const FIELD_STATES_KEY: &str = "_fieldStates";

/// Legacy key carrying a completeness score embedded in the content itself
pub const COMPLETENESS_KEY: &str = "completenessPercent";

/// Metadata keys older writers embedded directly in content.
///
/// They are not field data: they pass through saves verbatim and never
/// appear in diffs or completion scoring.
pub const LEGACY_META_KEYS: [&str; 6] = [
    COMPLETENESS_KEY,
    "createdAt",
    "updatedAt",
    "masterProfileId",
    "lastSyncedAt",
    "customFields",
];

/// Opaque section containers used by the oldest storage layout
pub const LEGACY_CONTAINER_KEYS: [&str; 2] = ["projectSections", "borrowerSections"];

/// True for top-level keys that can never be field ids
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_')
        || LEGACY_META_KEYS.contains(&key)
        || LEGACY_CONTAINER_KEYS.contains(&key)
}

/// How a snapshot's content object is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageShape {
    /// Keyed directly by field id
    Flat,
    /// Nested by section id, then optionally subsection id, then field id
    Grouped,
}

impl StorageShape {
    /// Wire spelling of the tag
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Grouped => "grouped",
        }
    }

    /// Parse a tag value; unknown spellings are ignored by callers.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "flat" => Some(Self::Flat),
            "grouped" => Some(Self::Grouped),
            _ => None,
        }
    }
}

impl Display for StorageShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field lock flags stored under [`LOCKS_KEY`]
///
/// A locked field is one a human has confirmed; automated enrichment must
/// not overwrite it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockOverlay(IndexMap<FieldId, bool>);

impl LockOverlay {
    /// Empty overlay
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored overlay value.
    ///
    /// Non-object values and non-boolean entries are dropped rather than
    /// failing the read; old writers were not strict here.
    #[must_use]
    pub fn from_value_lenient(raw: &Value) -> Self {
        let Some(map) = raw.as_object() else {
            return Self::default();
        };
        let mut locks = IndexMap::new();
        for (key, value) in map {
            let Ok(id) = FieldId::new(key.clone()) else { continue };
            if let Some(flag) = value.as_bool() {
                locks.insert(id, flag);
            }
        }
        Self(locks)
    }

    /// Lock state of one field; unmentioned fields are unlocked.
    #[inline]
    #[must_use]
    pub fn is_locked(&self, id: &FieldId) -> bool {
        self.0.get(id).copied().unwrap_or(false)
    }

    /// Set one field's lock state
    pub fn set(&mut self, id: FieldId, locked: bool) {
        self.0.insert(id, locked);
    }

    /// Number of fields with an explicit lock entry
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no field has an explicit entry
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate explicit entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, bool)> {
        self.0.iter().map(|(id, locked)| (id, *locked))
    }

    /// Wire form for persistence
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (id, locked) in &self.0 {
            map.insert(id.as_str().to_string(), Value::Bool(*locked));
        }
        Value::Object(map)
    }
}

impl FromIterator<(FieldId, bool)> for LockOverlay {
    fn from_iter<T: IntoIterator<Item = (FieldId, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A snapshot's content object exactly as persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotContent(Map<String, Value>);

impl SnapshotContent {
    /// Empty content, the state of a freshly created document
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a raw stored object
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Borrow the raw object
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the raw object
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Top-level lookup
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// True when the object has no keys at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The explicit shape tag, when one was written
    #[must_use]
    pub fn shape_tag(&self) -> Option<StorageShape> {
        self.0
            .get(SHAPE_KEY)
            .and_then(Value::as_str)
            .and_then(StorageShape::from_tag)
    }
}

impl From<Map<String, Value>> for SnapshotContent {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Canonical parsed form of a snapshot's content
///
/// Fields are keyed flat by id regardless of how the snapshot was stored.
/// Unknown (legacy) field ids are kept: they still diff, they still
/// round-trip, they just never join sections when re-grouped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatDocument {
    /// Field values keyed by id, known and legacy alike
    pub fields: IndexMap<FieldId, FieldValue>,
    /// Lock overlay
    pub locks: LockOverlay,
    /// Free-form per-field UI state, preserved verbatim
    pub field_states: Map<String, Value>,
    /// Reserved and legacy top-level keys, preserved verbatim
    pub extras: Map<String, Value>,
}

impl FlatDocument {
    /// Empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of one field
    #[must_use]
    pub fn get(&self, id: &FieldId) -> Option<&FieldValue> {
        self.fields.get(id)
    }

    /// Unwrapped payload of one field
    #[must_use]
    pub fn unwrapped(&self, id: &FieldId) -> Option<&Value> {
        self.fields.get(id).map(FieldValue::unwrapped)
    }

    /// Insert or replace one field's value
    pub fn insert(&mut self, id: FieldId, value: impl Into<FieldValue>) {
        self.fields.insert(id, value.into());
    }

    /// Number of stored fields
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether any field holds actual data.
    ///
    /// Used to pick donor documents worth copying from. The bar is low on
    /// purpose: any envelope counts, any non-empty array or object counts,
    /// any number or boolean counts (zero and false included), any string
    /// with non-whitespace content counts.
    #[must_use]
    pub fn has_meaningful_content(&self) -> bool {
        self.fields.values().any(|field| match field {
            FieldValue::Rich(_) => true,
            FieldValue::Plain(value) => match value {
                Value::Null => false,
                Value::Bool(_) | Value::Number(_) => true,
                Value::String(s) => !s.trim().is_empty(),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
            },
        })
    }
}
