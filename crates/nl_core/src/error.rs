use std::fmt;
use thiserror::Error;

use crate::types::Backend;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The article could not be downloaded or parsed.
    #[error("Could not extract article from URL. Error: {0}")]
    Fetch(String),

    /// A model or LLM call failed, including malformed or empty upstream responses.
    #[error("Error in {backend} backend: {cause}")]
    Backend { backend: Backend, cause: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn backend(backend: Backend, cause: impl fmt::Display) -> Self {
        Error::Backend {
            backend,
            cause: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_names_backend() {
        let err = Error::backend(Backend::Sentiment, "status 503");
        assert_eq!(err.to_string(), "Error in sentiment backend: status 503");
    }
}
