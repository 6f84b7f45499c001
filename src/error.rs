use std::io;
use thiserror::Error;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, ArchaeologistError>;

/// Errors that can occur while sampling and analyzing a repository
#[derive(Debug, Error)]
pub enum ArchaeologistError {
    /// The supplied repository URL could not be resolved to an owner and name
    #[error("Invalid GitHub URL: {0}")]
    InvalidRepositoryUrl(String),

    /// The hosting API answered with a failure
    #[error("GitHub API error ({status}): {message}")]
    HostingApi {
        /// HTTP status returned by the hosting API (0 when no response was received)
        status: u16,
        /// Message extracted from the response body, or the transport error
        message: String,
    },

    /// Traversal produced no files, or the root listing failed
    #[error("Failed to fetch repository files: {message}")]
    RepositoryFetchFailed {
        /// Human readable description
        message: String,
        /// Underlying cause, when one exists
        #[source]
        source: Option<Box<ArchaeologistError>>,
    },

    /// The generative-language backend failed or timed out
    #[error("Summarization unavailable: {0}")]
    SummarizationUnavailable(String),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Content could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl ArchaeologistError {
    /// Builds a `RepositoryFetchFailed` wrapping `cause`
    pub fn fetch_failed(message: impl Into<String>, cause: Option<ArchaeologistError>) -> Self {
        Self::RepositoryFetchFailed {
            message: message.into(),
            source: cause.map(Box::new),
        }
    }

    /// Checks if this error is transient and retryable
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Io(_) => true,
            Self::HostingApi { status, .. } => *status == 0 || *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP-equivalent status for presenting this error to a caller
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRepositoryUrl(_) | Self::Validation(_) => 400,
            Self::RepositoryFetchFailed { .. } => 404,
            Self::HostingApi { status, .. } if (400..500).contains(status) => *status,
            Self::HostingApi { .. } => 502,
            _ => 500,
        }
    }
}
