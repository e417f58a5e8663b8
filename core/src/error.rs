//! Error types for the servicedash-core library.

use thiserror::Error;

/// Result type alias for servicedash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching, validating and paging service data.
#[derive(Error, Debug)]
pub enum Error {
    /// The request to the services endpoint could not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A payload did not match the expected service record shape.
    #[error("Shape mismatch at {path}: expected {expected}")]
    ShapeMismatch { path: String, expected: &'static str },

    /// Page metadata returned by the endpoint contradicts itself.
    #[error("Inconsistent pagination: {0}")]
    PaginationInconsistency(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn shape(path: impl Into<String>, expected: &'static str) -> Self {
        Error::ShapeMismatch {
            path: path.into(),
            expected,
        }
    }

    /// Short message suitable for a status line.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Transport(_) => "Failed to load services",
            Error::ShapeMismatch { .. } | Error::PaginationInconsistency(_) => {
                "Invalid data from server"
            }
            Error::Io(_) | Error::Json(_) | Error::Config(_) => "Configuration problem",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
