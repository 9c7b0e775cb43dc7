//! API key issuance.
//!
//! [`issue`] mints a new key as a signed token bound to a single-use RSA
//! key pair. The private half exists only inside the call frame: it is used
//! to sign exactly one token and is dropped before the function returns, on
//! every code path. Nothing secret remains to persist — the caller stores
//! the returned public JWK and hands the token to the key's owner.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, jwk::Jwk};
use rand::rngs::OsRng;
use rsa::{
    RsaPrivateKey,
    pkcs8::{EncodePrivateKey, LineEnding},
};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::{
    error::{ApiKeyError, Result},
    issuer_url::join_url,
    jwk::rsa_public_jwk,
    version::format_token_version,
};

/// RSA modulus size for issued key pairs.
const RSA_KEY_BITS: usize = 2048;

/// Options for [`issue`].
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use keymint_authn::IssueOptions;
/// use url::Url;
///
/// let options = IssueOptions::builder()
///     .subject("user_123")
///     .base_issuer_url(Url::parse("https://example.com").unwrap())
///     .audience("api-key")
///     .expires_at(Utc::now() + Duration::days(1))
///     .build();
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct IssueOptions {
    /// Subject (user or client identifier) the key is issued to. Must be
    /// non-empty.
    #[builder(into)]
    pub subject: String,

    /// Base issuer URL. The token's `iss` claim becomes this URL with the
    /// key ID appended as the final path segment.
    pub base_issuer_url: Url,

    /// Audience string stamped into the `aud` claim.
    #[builder(into)]
    pub audience: String,

    /// Expiry instant, floor-truncated to Unix seconds for the `exp` claim.
    ///
    /// Only instants before the Unix epoch are rejected — a defensive
    /// floor, not an expiry-in-the-past check. A key minted with an expiry
    /// in the recent past issues successfully and is then rejected at
    /// verification time by the `exp` check; whether that is ever useful is
    /// the caller's call.
    pub expires_at: DateTime<Utc>,
}

/// Artifacts of a successful issuance.
///
/// Contains everything needed to build a key record and hand the credential
/// to its owner — and nothing else. There is deliberately no private-key
/// field on this type; the private half is unrecoverable once [`issue`]
/// returns.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedKey {
    /// Public half of the single-use key pair, tagged with `kid == key_id`.
    pub public_jwk: Jwk,
    /// The signed token to give to the key's owner.
    pub token: String,
    /// The key's identifier (UUIDv7).
    pub key_id: Uuid,
}

/// Issues a new API key.
///
/// Caller-supplied `extra_claims` are merged into the payload; the protocol
/// claims `sub`, `iss`, `aud`, `exp` and `ver` always win on collision, so
/// callers cannot forge or override them.
///
/// Key-pair generation is CPU-bound and can be the slowest step when
/// entropy is scarce; embedding applications on async runtimes should wrap
/// this call in `spawn_blocking`.
///
/// # Errors
///
/// - [`ApiKeyError::IncorrectUsage`] if `subject` is empty or `expires_at`
///   is before the Unix epoch (checked before any key material is
///   generated).
/// - [`ApiKeyError::SigningFailure`] if key generation, export or signing
///   fails.
#[tracing::instrument(skip_all, fields(subject = %options.subject))]
pub fn issue(
    extra_claims: serde_json::Map<String, Value>,
    options: &IssueOptions,
) -> Result<IssuedKey> {
    if options.subject.is_empty() {
        return Err(ApiKeyError::incorrect_usage("subject must not be empty"));
    }
    if options.expires_at.timestamp() < 0 {
        return Err(ApiKeyError::incorrect_usage("expires_at must not be before the Unix epoch"));
    }

    let key_id = Uuid::now_v7();
    let issuer = join_url(&options.base_issuer_url, &key_id.to_string());

    let mut claims = extra_claims;
    claims.insert("sub".into(), Value::from(options.subject.as_str()));
    claims.insert("iss".into(), Value::from(issuer.as_str()));
    claims.insert("aud".into(), Value::from(options.audience.as_str()));
    claims.insert("exp".into(), Value::from(options.expires_at.timestamp()));
    claims.insert("iat".into(), Value::from(Utc::now().timestamp()));
    claims.insert("ver".into(), Value::from(format_token_version()));

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key_id.to_string());

    // The private key never leaves this block; only the token and the
    // public JWK escape.
    let (token, public_jwk) = {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| ApiKeyError::signing_failure("RSA key generation failed", e))?;

        // PEM is Zeroizing: scrubbed from memory on drop
        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| ApiKeyError::signing_failure("private key export failed", e))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| ApiKeyError::signing_failure("private key import failed", e))?;

        let token = jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|e| ApiKeyError::signing_failure("token signing failed", e))?;

        (token, rsa_public_jwk(&private_key.to_public_key(), key_id))
    };

    tracing::debug!(%key_id, issuer = %issuer, "issued API key");

    Ok(IssuedKey { public_jwk, token, key_id })
}
