//! Provenance descriptors
//!
//! Every stored field value can say where it came from: typed in by a user,
//! or extracted from a named document. Older snapshots recorded this in
//! several looser shapes (bare strings, one-element arrays, `sources` lists);
//! [`SourceDescriptor::from_legacy`] folds them all into the two canonical
//! forms.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Where a field value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Entered by a user
    UserInput,
    /// Extracted from an uploaded document
    Document {
        /// Original file name, when known
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl SourceDescriptor {
    /// Document source with a known file name
    #[must_use]
    pub fn document(name: impl Into<String>) -> Self {
        Self::Document { name: Some(name.into()) }
    }

    /// True for user-entered values
    #[inline]
    #[must_use]
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::UserInput)
    }

    /// Decode any historical source encoding.
    ///
    /// Accepted shapes, in probe order:
    /// 1. absent / null / empty → user input
    /// 2. object with a `type` key → canonical form (unrecognized types
    ///    degrade to user input)
    /// 3. one-or-more element array → first element decoded as (2) or (4)
    /// 4. bare string → `"user_input"` / `"user input"` (case-insensitive,
    ///    trimmed) means user input, anything else is a document name
    ///
    /// Document names keep their original spelling; only the user-input
    /// sentinel comparison is normalized.
    #[must_use]
    pub fn from_legacy(raw: Option<&Value>) -> Self {
        let Some(raw) = raw else {
            return Self::UserInput;
        };
        if is_falsy(raw) {
            return Self::UserInput;
        }

        match raw {
            Value::Object(map) if map.contains_key("type") => {
                serde_json::from_value(raw.clone()).unwrap_or(Self::UserInput)
            }
            Value::Array(items) => match items.first() {
                Some(Value::Object(map)) if map.contains_key("type") => {
                    serde_json::from_value(Value::Object(map.clone()))
                        .unwrap_or(Self::UserInput)
                }
                Some(Value::String(s)) => Self::from_label(s),
                _ => Self::UserInput,
            },
            Value::String(s) => Self::from_label(s),
            _ => Self::UserInput,
        }
    }

    fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        if normalized == "user_input" || normalized == "user input" {
            Self::UserInput
        } else {
            Self::Document { name: Some(label.to_string()) }
        }
    }
}

impl Default for SourceDescriptor {
    fn default() -> Self {
        Self::UserInput
    }
}

impl Display for SourceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserInput => f.write_str("user_input"),
            Self::Document { name: Some(name) } => write!(f, "document:{name}"),
            Self::Document { name: None } => f.write_str("document"),
        }
    }
}

/// JSON value that decodes as "no source provided".
///
/// Matches the truthiness rules the legacy pipeline applied: null, `false`,
/// numeric zero, empty string, empty array and empty object all count as
/// absent.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
