use logvault_state::LogFlag;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, LogServiceError>;

#[derive(Debug, Error)]
pub enum LogServiceError {
    /// Malformed or missing input. Nothing was sent to storage.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// The deletion policy protects this record.
    #[error("log {id} is flagged `{flag}` and cannot be deleted")]
    Forbidden { id: Uuid, flag: LogFlag },
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Storage,
}

impl LogServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LogServiceError::Validation(_) => ErrorKind::Validation,
            LogServiceError::NotFound(_) => ErrorKind::NotFound,
            LogServiceError::Forbidden { .. } => ErrorKind::Forbidden,
            LogServiceError::Storage(_) => ErrorKind::Storage,
        }
    }
}
