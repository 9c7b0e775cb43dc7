//! Storage error types and result alias.
//!
//! All storage backends map their internal errors to these standardized
//! types. The protocol core never sees them directly; resolver
//! implementations translate storage failures into the authentication error
//! taxonomy at the seam.

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during key-record storage operations.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested record was not found in the storage backend.
    #[error("Record not found: {key}")]
    NotFound {
        /// The record key that was not found.
        key: String,
    },

    /// A record with the same key already exists.
    ///
    /// Key IDs are generated once at issuance and never reused, so a
    /// conflict indicates a duplicate insert rather than a lost race.
    #[error("Record already exists: {key}")]
    Conflict {
        /// The record key that conflicted.
        key: String,
    },

    /// Serialization or deserialization error.
    ///
    /// Typically indicates stored-data corruption or schema incompatibility.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// Internal storage backend error.
    ///
    /// A catch-all for backend-specific errors that don't fit other
    /// categories.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    /// Creates a [`StorageError::NotFound`] for the given record key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a [`StorageError::Conflict`] for the given record key.
    pub fn conflict(key: impl Into<String>) -> Self {
        Self::Conflict { key: key.into() }
    }

    /// Creates a [`StorageError::Serialization`] without a source.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a [`StorageError::Internal`] without a source.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }
}

/// Asserts that a [`StorageResult`] is an `Err` matching the given
/// [`StorageError`] variant.
#[macro_export]
macro_rules! assert_storage_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::StorageError::$variant { .. })),
            "expected StorageError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("abc");
        assert_eq!(err.to_string(), "Record not found: abc");

        let err = StorageError::conflict("abc");
        assert_eq!(err.to_string(), "Record already exists: abc");

        let err = StorageError::internal("backend down");
        assert_eq!(err.to_string(), "Internal error: backend down");
    }

    #[test]
    fn test_source_chain_preserved() {
        use std::error::Error;

        let inner: BoxError = Arc::new(StorageError::not_found("inner"));
        let err = StorageError::Internal { message: "wrapper".into(), source: Some(inner) };

        let source = err.source().expect("source chain must be preserved");
        assert_eq!(source.to_string(), "Record not found: inner");
    }

    #[test]
    fn test_assert_storage_error_macro() {
        let result: StorageResult<()> = Err(StorageError::not_found("x"));
        assert_storage_error!(result, NotFound);
    }
}
