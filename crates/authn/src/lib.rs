//! # Keymint Authentication
//!
//! API key issuance and verification for Keymint services.
//!
//! This crate provides:
//! - **Issuance**: mint an API key as a signed JWT bound to a single-use
//!   RSA key pair whose private half is discarded at mint time
//! - **Verification**: structural pre-checks plus RS256 signature and
//!   standard-claim validation, with key discovery through a pluggable
//!   resolver
//! - **Sniffing**: non-failing detection of whether a bearer credential
//!   belongs to this protocol
//!
//! ## Design
//!
//! - Only RS256 is accepted; a token's `iss` claim encodes where its one
//!   public key is published, and its `kid` header must agree
//! - Revocation is key deletion: once the published key set for a key ID
//!   disappears, every token bound to it stops verifying
//! - Verification failures past the structural checks share one uniform
//!   message, so bearers cannot probe which key IDs exist
//!
//! ## Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use keymint_authn::{IssueOptions, issue, sniff};
//! use url::Url;
//!
//! # fn example() -> keymint_authn::Result<()> {
//! let base = Url::parse("https://example.com/api-key").expect("static URL");
//! let options = IssueOptions::builder()
//!     .subject("user_123")
//!     .base_issuer_url(base.clone())
//!     .audience("api-key")
//!     .expires_at(Utc::now() + Duration::days(30))
//!     .build();
//!
//! let issued = issue(serde_json::Map::new(), &options)?;
//!
//! // The token is recognizably ours; store `issued.public_jwk` under
//! // `issued.key_id` and hand `issued.token` to the user.
//! assert!(sniff(&issued.token, &base));
//! # Ok(())
//! # }
//! # example().expect("issuance");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// API key error types.
pub mod error;
/// API key issuance.
pub mod issuer;
/// Issuer URL composition.
pub mod issuer_url;
/// RSA public key export as JWKs.
pub mod jwk;
/// Key discovery.
pub mod resolver;
/// Token verification and sniffing.
pub mod verifier;
/// Token version gate.
pub mod version;

#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

// Re-export key types for convenience
pub use error::{ApiKeyError, Result};
pub use issuer::{IssueOptions, IssuedKey, issue};
pub use jwk::{rsa_public_jwk, single_key_set};
pub use resolver::{
    HttpKeySetResolver, KeyLookup, KeySetResolver, StoreKeySetResolver, WELL_KNOWN_JWKS_PATH,
};
pub use verifier::{VerifiedClaims, VerifyOptions, sniff, verify};
pub use version::{CURRENT_TOKEN_VERSION, MAX_SUPPORTED_TOKEN_VERSION, TOKEN_VERSION_PREFIX};
