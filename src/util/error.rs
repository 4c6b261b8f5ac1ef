//! Error types for the keyanim library.

use thiserror::Error;

use crate::core::EntityId;

/// Main error type for animation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Controller attached to something that is not a component or group
    #[error("Entity {0} is not a component or group")]
    InvalidTarget(EntityId),

    /// Index outside the current dense range of a store
    #[error("{what} index {index} out of range (count: {count})")]
    NotFound {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// The bound component no longer exists in the host
    #[error("Entity {0} no longer exists")]
    StaleReference(EntityId),

    /// Operation invoked without its guard holding
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Value that cannot be stored under (or read back from) a key
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// Command key outside the animation vocabulary
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create an out-of-range error for a store.
    pub fn not_found(what: &'static str, index: usize, count: usize) -> Self {
        Self::NotFound { what, index, count }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result type alias for animation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::not_found("keyframe", 5, 3);
        assert!(e.to_string().contains("keyframe"));
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::InvalidTarget(EntityId(7));
        assert!(e.to_string().contains("#7"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
