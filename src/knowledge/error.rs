//! Error taxonomy for knowledge operations.

/// Failure of a knowledge store operation.
///
/// `Validation` and `NotFound` are domain outcomes the caller can act on;
/// `Storage` and `Encoding` mean the persistence layer itself failed.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("stored JSON is malformed: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;

impl KnowledgeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Stable machine-readable code carried in failure envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) | Self::Encoding(_) => "storage",
        }
    }

    /// `true` for faults of the persistence engine rather than the request.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Encoding(_))
    }
}

/// Reject an empty required string field.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(KnowledgeError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
