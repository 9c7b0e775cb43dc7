//! Shared test utilities for API key protocol testing.
//!
//! This module provides helpers for generating RSA key pairs, minting
//! protocol-shaped tokens with arbitrary claim overrides (for attack
//! testing), crafting raw JWT strings, and canned [`KeySetResolver`]
//! implementations. It is feature-gated behind `testutil` to prevent
//! leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! keymint-authn = { path = "../authn", features = ["testutil"] }
//! ```

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, EncodingKey, Header,
    jwk::{Jwk, JwkSet},
};
use rand::rngs::OsRng;
use rsa::{
    RsaPrivateKey,
    pkcs8::{EncodePrivateKey, LineEnding},
};
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    error::{ApiKeyError, Result},
    issuer_url::join_url,
    jwk::rsa_public_jwk,
    resolver::{KeyLookup, KeySetResolver},
    version::format_token_version,
};

/// Generates a test RSA-2048 key pair tagged with the given key ID.
///
/// Returns `(private_pem, public_jwk)` where:
/// - `private_pem` is the private key in PKCS#8 PEM format wrapped in
///   [`Zeroizing`] (suitable for [`EncodingKey::from_rsa_pem`])
/// - `public_jwk` is the RS256 public JWK with `kid` set to `key_id`
///
/// Each call generates a fresh random key pair.
///
/// # Panics
///
/// Panics if key generation or export fails (should not happen with a
/// working entropy source).
pub fn generate_test_keypair(key_id: Uuid) -> (Zeroizing<String>, Jwk) {
    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation");
    let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).expect("PKCS#8 export");
    let public_jwk = rsa_public_jwk(&private_key.to_public_key(), key_id);
    (private_pem, public_jwk)
}

/// Creates a protocol-shaped token signed with the given private key,
/// with caller overrides applied last.
///
/// The base payload carries `sub`, `iss` (base issuer URL + key ID),
/// `aud`, `exp` (1 hour out), `iat` and the current `ver`; entries in
/// `overrides` replace base claims of the same name, so tests can produce
/// tokens that are correctly signed but carry a hostile claim (wrong
/// issuer, future version, stale expiry). The `kid` header is always the
/// given `key_id`.
///
/// # Panics
///
/// Panics if signing fails (should not happen with a key pair from
/// [`generate_test_keypair`]).
pub fn create_signed_token(
    private_pem: &str,
    key_id: Uuid,
    base_issuer_url: &Url,
    subject: &str,
    overrides: serde_json::Map<String, Value>,
) -> String {
    let now = Utc::now().timestamp();
    let mut claims = serde_json::Map::new();
    claims.insert("sub".into(), json!(subject));
    claims.insert("iss".into(), json!(join_url(base_issuer_url, &key_id.to_string()).as_str()));
    claims.insert("aud".into(), json!("api-key"));
    claims.insert("exp".into(), json!(now + 3600));
    claims.insert("iat".into(), json!(now));
    claims.insert("ver".into(), json!(format_token_version()));
    for (name, value) in overrides {
        claims.insert(name, value);
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key_id.to_string());

    let encoding_key =
        EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("PEM import");
    jsonwebtoken::encode(&header, &claims, &encoding_key).expect("Failed to encode test JWT")
}

/// Creates a raw JWT string from arbitrary header and payload JSON.
///
/// The resulting JWT has the structure `{header_b64}.{payload_b64}.`
/// with an empty signature. This is useful for testing rejection of
/// malformed or attack JWTs (e.g., `alg: "none"`, mismatched `kid`).
///
/// # Panics
///
/// Panics if JSON serialization fails.
pub fn craft_raw_jwt(header_json: &Value, payload_json: &Value) -> String {
    let part =
        |json: &Value| URL_SAFE_NO_PAD.encode(serde_json::to_vec(json).expect("part json"));
    [part(header_json), part(payload_json), String::new()].join(".")
}

/// Resolver serving a fixed key set for every lookup.
#[derive(Debug, Clone)]
pub struct StaticKeySetResolver(pub JwkSet);

#[async_trait]
impl KeySetResolver for StaticKeySetResolver {
    async fn resolve(&self, _lookup: &KeyLookup) -> Result<JwkSet> {
        Ok(self.0.clone())
    }
}

/// Resolver failing every lookup, as a store does for an unknown or
/// revoked key.
#[derive(Debug, Clone, Copy)]
pub struct FailingKeySetResolver;

#[async_trait]
impl KeySetResolver for FailingKeySetResolver {
    async fn resolve(&self, _lookup: &KeyLookup) -> Result<JwkSet> {
        Err(ApiKeyError::unauthorized())
    }
}

/// Asserts that a `Result<T, ApiKeyError>` is an `Err` matching the given
/// [`ApiKeyError`](crate::ApiKeyError) variant.
///
/// On failure, prints the expected variant and the actual result.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use keymint_authn::{ApiKeyError, assert_api_key_error};
///
/// let result: Result<(), ApiKeyError> = Err(ApiKeyError::unauthorized());
/// assert_api_key_error!(result, Unauthorized);
/// ```
#[macro_export]
macro_rules! assert_api_key_error {
    ($result:expr, $variant:ident) => {
        assert!(
            matches!($result, Err($crate::error::ApiKeyError::$variant { .. })),
            "expected ApiKeyError::{}, got: {:?}",
            stringify!($variant),
            $result,
        );
    };
    ($result:expr, $variant:ident, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::ApiKeyError::$variant { .. })),
            "{}: expected ApiKeyError::{}, got: {:?}",
            $msg,
            stringify!($variant),
            $result,
        );
    };
}
