//! Store failure modes

use crate::ids::{DocumentRef, VersionId};

/// Failures the version store boundary can report
///
/// Engines propagate these untouched; whether to retry is the caller's
/// decision.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No logical document exists for the reference
    #[error("unknown document {0}")]
    UnknownDocument(DocumentRef),

    /// No snapshot exists with this id
    #[error("unknown version {0}")]
    UnknownVersion(VersionId),

    /// Concurrent pointer mutation detected
    #[error("conflicting write on {0}")]
    Conflict(DocumentRef),
}

impl StoreError {
    /// Whether retrying the same call can succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether the failure is a missing document or version
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownDocument(_) | Self::UnknownVersion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::OwnerId;

    #[test]
    fn retryability_classification() {
        let doc = DocumentRef::project(OwnerId::generate());
        assert!(StoreError::Conflict(doc).is_retryable());
        assert!(!StoreError::UnknownDocument(doc).is_retryable());
        assert!(StoreError::UnknownVersion(VersionId::generate()).is_not_found());
    }
}
