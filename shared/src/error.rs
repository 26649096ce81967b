use thiserror::Error;

/// Errors surfaced by the journal core and its backends.
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("not signed in")]
    Unauthorized,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("record not found")]
    NotFound,

    /// Message returned verbatim by the storage or auth service.
    #[error("{0}")]
    Backend(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl JournalError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures caused by the storage/auth collaborator rather than the user.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Database(_) | Self::Http(_) | Self::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, JournalError>;
