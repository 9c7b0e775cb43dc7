//! Bearer token verification.
//!
//! Verification is a fixed chain of structural checks followed by
//! cryptographic ones. The structural half is shared by two entry points:
//! [`sniff`] runs only that half and reduces every failure to `false`,
//! answering "should this protocol own authentication of this bearer?" in
//! middleware that multiplexes several credential kinds; [`verify`] runs
//! the full chain and reports failures through the typed error taxonomy.
//!
//! Structural failures are reported precisely (the token cannot belong to
//! this protocol, so there is nothing to leak). Everything downstream of
//! key resolution fails with one uniform message: distinguishing "unknown
//! key" from "bad signature" from "revoked" would hand bearers a key
//! enumeration oracle.

use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::{
    error::{ApiKeyError, Result},
    issuer_url::issuer_prefix,
    resolver::{KeyLookup, KeySetResolver},
    version::parse_token_version,
};

/// Options for [`verify`].
#[derive(bon::Builder)]
pub struct VerifyOptions<'a> {
    /// Base issuer URL this verifier trusts. Tokens whose `iss` claim does
    /// not extend this URL by exactly one path segment are rejected as
    /// malformed.
    pub base_issuer_url: &'a Url,

    /// Resolves the public key set for a structurally valid token.
    pub resolver: &'a dyn KeySetResolver,

    /// Expected `aud` claim. When unset, the audience is not validated.
    #[builder(into)]
    pub audience: Option<String>,
}

/// The outcome of successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    /// The verified key's identifier.
    pub key_id: Uuid,
    /// The `sub` claim: who the key was issued to.
    pub subject: String,
    /// The full verified claim map, protocol and caller claims alike.
    pub claims: serde_json::Map<String, Value>,
}

/// A token that passed the structural checks, not yet verified.
struct TokenShape {
    header: Header,
    key_id: Uuid,
    issuer: Url,
}

/// Runs the structural half of the chain: decode without signature
/// verification, check issuer shape, issuer/kid agreement and token
/// version. No cryptography and no I/O.
fn inspect(token: &str, base_issuer_url: &Url) -> Result<TokenShape> {
    let header = jsonwebtoken::decode_header(token)
        .map_err(|_| ApiKeyError::malformed_token("Invalid token"))?;

    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(ApiKeyError::malformed_token("Invalid token")),
    };
    let payload = {
        use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
        URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| ApiKeyError::malformed_token("Invalid token"))?
    };
    let claims: serde_json::Map<String, Value> = serde_json::from_slice(&payload)
        .map_err(|_| ApiKeyError::malformed_token("Invalid token"))?;

    let issuer = claims
        .get("iss")
        .and_then(Value::as_str)
        .filter(|iss| !iss.is_empty())
        .ok_or_else(|| ApiKeyError::malformed_token("Missing issuer"))?;

    let prefix = issuer_prefix(base_issuer_url);
    let key_id = issuer
        .strip_prefix(prefix.as_str())
        .ok_or_else(|| ApiKeyError::malformed_token("Invalid issuer"))?;
    let key_id: Uuid =
        key_id.parse().map_err(|_| ApiKeyError::malformed_token("Invalid issuer"))?;

    if header.kid.as_deref() != Some(key_id.to_string().as_str()) {
        return Err(ApiKeyError::malformed_token("Mismatched kid"));
    }

    let version = claims
        .get("ver")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiKeyError::malformed_token("Missing token version"))?;
    parse_token_version(version)?;

    let issuer =
        Url::parse(issuer).map_err(|_| ApiKeyError::malformed_token("Invalid issuer"))?;

    Ok(TokenShape { header, key_id, issuer })
}

/// Reports whether a bearer credential looks like a token issued by this
/// protocol under the given base issuer URL.
///
/// Never fails and performs no I/O or cryptography: every structural
/// defect, of any kind, reduces to `false`. A `true` result says nothing
/// about validity — it only routes the credential to [`verify`].
#[must_use]
pub fn sniff(token: &str, base_issuer_url: &Url) -> bool {
    inspect(token, base_issuer_url).is_ok()
}

/// Verifies a bearer token end to end.
///
/// Runs the structural chain, resolves the public key through
/// `options.resolver`, then checks the RS256 signature, `exp`, and — when
/// `options.audience` is set — `aud`.
///
/// # Errors
///
/// - [`ApiKeyError::MalformedToken`] for structural failures, reported
///   precisely.
/// - [`ApiKeyError::Unauthorized`] with one uniform message for every
///   failure from key resolution onward.
#[tracing::instrument(skip_all, fields(base_issuer_url = %options.base_issuer_url))]
pub async fn verify(token: &str, options: &VerifyOptions<'_>) -> Result<VerifiedClaims> {
    let shape = inspect(token, options.base_issuer_url)?;

    let lookup = KeyLookup { key_id: shape.key_id, issuer: shape.issuer };
    let key_set = options.resolver.resolve(&lookup).await.map_err(|e| {
        tracing::warn!(key_id = %lookup.key_id, error = %e, "key resolution failed");
        ApiKeyError::unauthorized()
    })?;

    let jwk = key_set
        .find(&shape.key_id.to_string())
        .ok_or_else(ApiKeyError::unauthorized)?;
    let decoding_key = DecodingKey::from_jwk(jwk).map_err(|e| {
        tracing::warn!(key_id = %lookup.key_id, error = %e, "resolved JWK is unusable");
        ApiKeyError::unauthorized()
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = true;
    match &options.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let data =
        jsonwebtoken::decode::<serde_json::Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(|_| ApiKeyError::unauthorized())?;

    // Issued tokens always carry sub; its absence means the signature was
    // made over a payload this protocol never produced
    let subject = data
        .claims
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(ApiKeyError::unauthorized)?
        .to_owned();

    debug_assert_eq!(data.header.alg, shape.header.alg);
    tracing::debug!(key_id = %shape.key_id, subject = %subject, "verified API key token");

    Ok(VerifiedClaims { key_id: shape.key_id, subject, claims: data.claims })
}
