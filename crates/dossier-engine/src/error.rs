//! Engine failure modes

use dossier_store::StoreError;

/// Failures surfaced by the save, diff, rollback and read paths
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed request, detected before any store call where possible
    #[error("invalid request: {0}")]
    Validation(String),

    /// Store failure, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether retrying the same call can succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Store(err) => err.is_retryable(),
        }
    }

    /// Whether the failure is a missing document or version
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}
