//! Error types for stickies-core

use thiserror::Error;

/// Result type alias using stickies-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stickies-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Requested note id is absent (only raised when loading a note for edit)
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Required input is missing or malformed; raised before any network call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Document store failure (list/get/save/delete)
    #[error("{0}")]
    Store(String),

    /// Blob/object storage failure (image upload)
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse error classification shown to screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Store,
}

impl Error {
    /// Classify this error for the screen layer.
    ///
    /// Everything that came back from the store, blob storage, or the
    /// transport in between is a `Store` error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(_)
            | Self::Storage(_)
            | Self::Http(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Store,
        }
    }

    /// Whether another attempt of the same call could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Store)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_groups_transport_failures_as_store() {
        assert_eq!(Error::store("offline").kind(), ErrorKind::Store);
        assert_eq!(Error::Storage("denied".into()).kind(), ErrorKind::Store);
        let io = std::io::Error::other("disk");
        assert_eq!(Error::from(io).kind(), ErrorKind::Store);
    }

    #[test]
    fn validation_and_not_found_are_not_retryable() {
        assert!(!Error::validation("empty title").is_retryable());
        assert!(!Error::NotFound("abc".into()).is_retryable());
        assert!(Error::store("timeout").is_retryable());
    }

    #[test]
    fn store_message_is_passed_through_verbatim() {
        assert_eq!(
            Error::store("permission denied").to_string(),
            "permission denied"
        );
    }
}
