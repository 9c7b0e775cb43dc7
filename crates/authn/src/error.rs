//! Error taxonomy for API key issuance and verification.
//!
//! Every fallible operation in this crate raises exactly one of the
//! [`ApiKeyError`] kinds; no bare or untyped failure crosses a component
//! boundary. Each kind carries an HTTP-equivalent status so embedding
//! services can map failures to responses without ad-hoc status codes.
//!
//! The two bearer-facing kinds encode a deliberate information boundary:
//! [`MalformedToken`](ApiKeyError::MalformedToken) means the credential
//! cannot possibly belong to this protocol or is corrupt (safe to say so),
//! while [`Unauthorized`](ApiKeyError::Unauthorized) means the shape was
//! fine but validity could not be confirmed — without distinguishing "wrong
//! signature" from "unknown or revoked key", which would give an attacker a
//! key-enumeration oracle.

use std::sync::Arc;

use http::StatusCode;
use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for API key operations.
pub type Result<T> = std::result::Result<T, ApiKeyError>;

/// API key issuance and verification errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiKeyError {
    /// The caller violated a precondition the protocol cannot sanitize
    /// (e.g. empty subject, pre-epoch expiry). A programming error in the
    /// embedding application, not a runtime condition.
    #[error("Incorrect usage: {0}")]
    IncorrectUsage(String),

    /// An underlying cryptographic operation (key generation, export,
    /// signing) failed unexpectedly.
    #[error("Signing failure: {message}")]
    SigningFailure {
        /// Description of the failed operation.
        message: String,
        /// The underlying cryptographic error.
        #[source]
        source: Option<BoxError>,
    },

    /// The token failed a structural or format check before cryptographic
    /// verification was attempted: undecodable, missing or invalid issuer,
    /// issuer/kid mismatch, or unsupported version.
    #[error("{0}")]
    MalformedToken(String),

    /// The token is structurally valid but failed cryptographic
    /// verification, standard-claim checks, or key resolution (including
    /// unknown or revoked keys).
    #[error("{0}")]
    Unauthorized(String),

    /// An error not covered by the taxonomy, caught at a boundary and
    /// wrapped. Its presence in logs signals a gap to be fixed, not a
    /// normal runtime condition.
    #[error("Unknown error: {message}")]
    Unknown {
        /// Description of the unexpected failure.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxError>,
    },
}

impl ApiKeyError {
    /// Creates an [`ApiKeyError::IncorrectUsage`].
    pub fn incorrect_usage(message: impl Into<String>) -> Self {
        Self::IncorrectUsage(message.into())
    }

    /// Creates an [`ApiKeyError::SigningFailure`] wrapping a cryptographic
    /// error.
    pub fn signing_failure(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SigningFailure { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates an [`ApiKeyError::MalformedToken`].
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken(message.into())
    }

    /// Creates the canonical [`ApiKeyError::Unauthorized`] for a token that
    /// could not be cryptographically confirmed.
    ///
    /// The message is intentionally uniform across signature, claim and
    /// key-resolution failures.
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Failed to verify token".into())
    }

    /// Creates an [`ApiKeyError::Unknown`] wrapping an untyped error.
    pub fn unknown(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unknown { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// The HTTP-equivalent status code for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedToken(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::IncorrectUsage(_) | Self::SigningFailure { .. } | Self::Unknown { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// A stable, machine-readable identifier for this failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IncorrectUsage(_) => "incorrect_usage",
            Self::SigningFailure { .. } => "signing_failure",
            Self::MalformedToken(_) => "malformed_token",
            Self::Unauthorized(_) => "unauthorized",
            Self::Unknown { .. } => "unknown",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiKeyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            // Structure-level failures: the token could not be decoded at all
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => ApiKeyError::malformed_token("Invalid token"),
            // Everything else is a validity failure: signature, exp, aud, alg
            _ => ApiKeyError::unauthorized(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiKeyError::incorrect_usage("subject must not be empty");
        assert_eq!(err.to_string(), "Incorrect usage: subject must not be empty");

        let err = ApiKeyError::malformed_token("Invalid token");
        assert_eq!(err.to_string(), "Invalid token");

        let err = ApiKeyError::unauthorized();
        assert_eq!(err.to_string(), "Failed to verify token");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiKeyError::incorrect_usage("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiKeyError::malformed_token("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiKeyError::unauthorized().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiKeyError::Unknown { message: "x".into(), source: None }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(ApiKeyError::incorrect_usage("x").kind(), "incorrect_usage");
        assert_eq!(ApiKeyError::malformed_token("x").kind(), "malformed_token");
        assert_eq!(ApiKeyError::unauthorized().kind(), "unauthorized");
    }

    #[test]
    fn test_from_jsonwebtoken_structural() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken);
        let err: ApiKeyError = jwt_err.into();
        assert!(matches!(err, ApiKeyError::MalformedToken(_)));
    }

    #[test]
    fn test_from_jsonwebtoken_validity() {
        for kind in [
            jsonwebtoken::errors::ErrorKind::InvalidSignature,
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
            jsonwebtoken::errors::ErrorKind::InvalidAudience,
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm,
        ] {
            let err: ApiKeyError = jsonwebtoken::errors::Error::from(kind).into();
            assert!(
                matches!(err, ApiKeyError::Unauthorized(_)),
                "expected Unauthorized, got: {err:?}"
            );
        }
    }

    #[test]
    fn test_source_chain_preserved() {
        use std::error::Error;

        let inner = std::io::Error::other("entropy source unavailable");
        let err = ApiKeyError::signing_failure("key generation failed", inner);

        assert!(err.source().is_some(), "source chain must be preserved");
    }
}
