//! Rich field values
//!
//! A stored field is either a bare JSON scalar ([`FieldValue::Plain`]) or a
//! provenance-carrying envelope ([`FieldValue::Rich`]). The two are
//! distinguished on the wire by a key probe: any JSON object carrying a
//! `value`, `source` or `sources` key is an envelope, everything else is a
//! plain value. The probe lives in one place, inside this type's
//! `Deserialize` impl, so no other module ever sniffs map keys.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::{is_falsy, SourceDescriptor};

/// Provenance envelope around a field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichValue {
    /// The payload; may be any JSON value including null
    #[serde(default)]
    pub value: Value,
    /// Where the payload came from
    #[serde(default)]
    pub source: SourceDescriptor,
    /// Extraction warnings attached to the payload
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Competing candidate values that were not chosen
    #[serde(default, alias = "other_values")]
    pub other_values: Vec<Value>,
}

impl RichValue {
    /// Envelope for a user-entered value with no warnings or alternates
    #[must_use]
    pub fn user_input(value: Value) -> Self {
        Self {
            value,
            source: SourceDescriptor::UserInput,
            warnings: Vec::new(),
            other_values: Vec::new(),
        }
    }

    /// Same envelope with the payload swapped out.
    ///
    /// Provenance, warnings and alternates all survive the swap.
    #[must_use]
    pub fn with_value(&self, value: Value) -> Self {
        Self {
            value,
            source: self.source.clone(),
            warnings: self.warnings.clone(),
            other_values: self.other_values.clone(),
        }
    }
}

/// A stored field value in either wire shape
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Bare JSON value, no provenance
    Plain(Value),
    /// Provenance envelope
    Rich(RichValue),
}

impl FieldValue {
    /// Plain value from anything JSON-convertible
    #[must_use]
    pub fn plain(value: impl Into<Value>) -> Self {
        Self::Plain(value.into())
    }

    /// The envelope key probe: any JSON object carrying a `value`, `source`
    /// or legacy `sources` key is an envelope.
    ///
    /// This is the only place in the workspace allowed to answer "is this
    /// raw value wrapped"; everything downstream matches on the enum.
    #[must_use]
    pub fn is_envelope(raw: &Value) -> bool {
        matches!(raw, Value::Object(map) if has_probe_key(map))
    }

    /// Classify a raw JSON value by the envelope key probe.
    ///
    /// Envelope fields are extracted leniently the way older snapshots
    /// require: a missing `value` becomes null, a falsy `source` falls back
    /// to the first element of a legacy `sources` array, non-string warning
    /// entries are dropped, and `otherValues` accepts its old snake_case
    /// spelling.
    #[must_use]
    pub fn from_raw(raw: Value) -> Self {
        match raw {
            Value::Object(map) if has_probe_key(&map) => {
                let value = map.get("value").cloned().unwrap_or(Value::Null);

                let source_raw = map
                    .get("source")
                    .filter(|v| !is_falsy(v))
                    .cloned()
                    .or_else(|| legacy_sources_head(&map));
                let source = SourceDescriptor::from_legacy(source_raw.as_ref());

                let warnings = map
                    .get("warnings")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                let other_values = map
                    .get("otherValues")
                    .or_else(|| map.get("other_values"))
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                Self::Rich(RichValue { value, source, warnings, other_values })
            }
            other => Self::Plain(other),
        }
    }

    /// The payload, unwrapping the envelope when present
    #[inline]
    #[must_use]
    pub fn unwrapped(&self) -> &Value {
        match self {
            Self::Plain(v) => v,
            Self::Rich(r) => &r.value,
        }
    }

    /// Consume into the payload, dropping any envelope
    #[must_use]
    pub fn into_unwrapped(self) -> Value {
        match self {
            Self::Plain(v) => v,
            Self::Rich(r) => r.value,
        }
    }

    /// Provenance, when the value carries an envelope
    #[must_use]
    pub fn source(&self) -> Option<&SourceDescriptor> {
        match self {
            Self::Plain(_) => None,
            Self::Rich(r) => Some(&r.source),
        }
    }

    /// True when the value carries an envelope
    #[inline]
    #[must_use]
    pub fn is_rich(&self) -> bool {
        matches!(self, Self::Rich(_))
    }

    /// Promote to an envelope; plain values become user input.
    #[must_use]
    pub fn into_rich(self) -> RichValue {
        match self {
            Self::Plain(v) => RichValue::user_input(v),
            Self::Rich(r) => r,
        }
    }

    /// Wire form for persistence.
    ///
    /// Serialization of these shapes cannot fail; the fallback exists only
    /// to keep panics out of the write path.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Plain(v) => v.clone(),
            Self::Rich(r) => serde_json::to_value(r).unwrap_or(Value::Null),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(raw: Value) -> Self {
        Self::from_raw(raw)
    }
}

impl From<RichValue> for FieldValue {
    fn from(rich: RichValue) -> Self {
        Self::Rich(rich)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Plain(v) => v.serialize(serializer),
            Self::Rich(r) => r.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

fn has_probe_key(map: &Map<String, Value>) -> bool {
    map.contains_key("value") || map.contains_key("source") || map.contains_key("sources")
}

fn legacy_sources_head(map: &Map<String, Value>) -> Option<Value> {
    map.get("sources").and_then(Value::as_array).and_then(|items| items.first()).cloned()
}
