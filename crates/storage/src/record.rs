//! Persisted key record for issued API keys.

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::Jwk;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted record for one issued API key.
///
/// Created once at issuance time from the artifacts the issuer returns; the
/// private half of the key pair never exists outside the issuance call, so
/// this record holds public material only.
///
/// # Mutation
///
/// `revoked` is the only mutable field and it is monotonic: `false` → `true`,
/// never reversed. Expiry is carried inside the signed token (`exp` claim)
/// and enforced at verification time, so records are never mutated when a
/// key expires.
///
/// # Example
///
/// ```
/// use keymint_storage::ApiKeyRecord;
/// use uuid::Uuid;
///
/// # fn sample_jwk() -> jsonwebtoken::jwk::Jwk {
/// #     serde_json::from_value(serde_json::json!({
/// #         "kty": "RSA", "n": "AQAB", "e": "AQAB", "alg": "RS256", "use": "sig",
/// #     })).unwrap()
/// # }
/// let record = ApiKeyRecord::builder()
///     .key_id(Uuid::now_v7())
///     .owner_id("user_123")
///     .public_jwk(sample_jwk())
///     .build();
///
/// assert!(!record.revoked);
/// assert!(record.revoked_at.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct ApiKeyRecord {
    /// Key ID (matches the token's `kid` header and the last path segment of
    /// its `iss` claim).
    ///
    /// Generated once at issuance with UUIDv7 semantics, so IDs are
    /// time-ordered and sorting by `key_id` is creation order.
    pub key_id: Uuid,

    /// Identifier of the user or client the key was issued to.
    ///
    /// Revocation is scoped to the owner: a revoke call for the wrong owner
    /// does not touch the record.
    #[builder(into)]
    pub owner_id: String,

    /// Whether this key has been revoked.
    ///
    /// Once `true`, never reversed. The publication layer stops serving the
    /// key's JWKS document as soon as this flips, which is what makes the
    /// bearer token unverifiable.
    #[builder(default)]
    pub revoked: bool,

    /// The public half of the key pair as a JSON Web Key, tagged with
    /// `kid == key_id`.
    pub public_jwk: Jwk,

    /// Opaque caller-supplied metadata (labels, descriptions, scopes).
    ///
    /// The protocol never reads this; it exists for the embedding
    /// application's listing and audit surfaces.
    #[serde(default)]
    #[builder(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// When the record was created.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,

    /// When the key was revoked, if it has been.
    ///
    /// Set once alongside `revoked`; a repeated revoke preserves the
    /// original timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
}
