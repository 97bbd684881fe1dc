//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::auth::AuthFailure;

/// Errors emitted by `ChatTutorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("chat tutor is locked until the lesson is started")]
    Locked,
    #[error("message is empty")]
    EmptyMessage,
    #[error("chat request timed out")]
    Timeout,
    #[error("chat request failed with status {status}: {message}")]
    Http {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("chat response did not match any known schema")]
    UnrecognizedSchema,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ChatError {
    /// Text shown to the learner below the conversation.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Locked => "Start the lesson to unlock the tutor.".to_string(),
            ChatError::EmptyMessage => "Type a question first.".to_string(),
            ChatError::Timeout => {
                "The tutor is taking too long to answer. Please try again.".to_string()
            }
            ChatError::Http { message, .. } => message.clone(),
            ChatError::UnrecognizedSchema => {
                "The tutor sent a reply we could not read.".to_string()
            }
            ChatError::Transport(_) => "Failed to reach AI service".to_string(),
        }
    }
}

/// Errors emitted while building chat configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatConfigError {
    #[error("invalid chat base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid chat timeout: {0}")]
    InvalidTimeout(String),
}

/// Errors emitted by the narration driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NarrationError {
    #[error("speech synthesis is not supported")]
    Unsupported,
    #[error("nothing to narrate")]
    EmptyText,
    #[error("speech engine failed: {0}")]
    Engine(String),
}

/// Failure reported by the identity collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("identity request failed ({kind}): {message}")]
pub struct AuthError {
    pub status: Option<u16>,
    pub kind: String,
    pub message: String,
}

impl AuthError {
    #[must_use]
    pub fn new(status: Option<u16>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(&self) -> AuthFailure {
        AuthFailure::from_status(self.status)
    }
}

/// Errors emitted while building the catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Core(#[from] tutor_core::Error),
}

impl From<tutor_core::model::QuizError> for CatalogError {
    fn from(err: tutor_core::model::QuizError) -> Self {
        Self::Core(err.into())
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
