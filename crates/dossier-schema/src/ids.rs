//! Typed identifiers for schema nodes
//!
//! Field, section and subsection ids are plain strings on the wire but are
//! kept as distinct types in the API so a section id can never be passed
//! where a field id is expected.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validation shared by all id kinds.
///
/// Ids must be non-empty and must not start with `_`: underscore-prefixed
/// keys are reserved for persistence overlays (lock maps, field states) and
/// can never address a schema node.
fn validate_id(s: &str) -> Result<(), IdError> {
    if s.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if s.starts_with('_') {
        return Err(IdError::Reserved(s.to_string()));
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Construct from a raw string, validating the reserved namespace.
            ///
            /// # Errors
            /// Returns [`IdError`] if the id is empty or starts with `_`.
            pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
                let raw = raw.into();
                validate_id(&raw)?;
                Ok(Self(raw))
            }

            /// View as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Allows map lookups keyed by the id type using a bare &str.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id! {
    /// Identifier of a single field (e.g. `projectName`)
    FieldId
}

string_id! {
    /// Identifier of a top-level section (e.g. `generalInfo`)
    SectionId
}

string_id! {
    /// Identifier of a subsection nested inside a section
    SubsectionId
}

/// Errors raised when constructing an id
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdError {
    /// Empty or whitespace-only id
    #[error("id must not be empty")]
    Empty,

    /// Id collides with the reserved overlay namespace
    #[error("id '{0}' uses the reserved '_' prefix")]
    Reserved(String),
}
