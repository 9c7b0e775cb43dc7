//! Public key discovery.
//!
//! Verification depends on a [`KeySetResolver`] to turn an issuer URL and
//! key ID into the JWK set to check the signature against. The trait keeps
//! the verify chain free of transport detail: the core only observes
//! success or failure, and callers inject whichever resolution strategy
//! fits their deployment — an HTTP fetch against the issuer's published
//! JWKS document, or a direct lookup in the key-record store.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use keymint_storage::ApiKeyStore;
use url::Url;
use uuid::Uuid;

use crate::{
    error::{ApiKeyError, Result},
    issuer_url::{issuer_prefix, join_url},
    jwk::single_key_set,
};

/// Path under an issuer URL where its JWK set is published.
pub const WELL_KNOWN_JWKS_PATH: &str = ".well-known/jwks.json";

/// Timeout for JWKS fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies the key a verifier needs: the key ID from the token's `kid`
/// header and the full issuer URL from its `iss` claim.
///
/// The two are redundant by construction (the issuer's final path segment
/// is the key ID); the verifier has already checked they agree before any
/// resolver sees the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLookup {
    /// The key's identifier.
    pub key_id: Uuid,
    /// The full per-key issuer URL.
    pub issuer: Url,
}

/// Resolves the JWK set for a key lookup.
///
/// Implementations decide where keys come from and whether to cache them.
/// Any failure — unknown key, revoked key, transport problem — surfaces to
/// the bearer as the same uniform verification failure, so implementations
/// are free to return precise errors for their own callers and logs.
#[async_trait]
pub trait KeySetResolver: Send + Sync {
    /// Returns the JWK set containing the looked-up key.
    async fn resolve(&self, lookup: &KeyLookup) -> Result<JwkSet>;
}

/// Resolver that fetches the issuer's published JWKS document over HTTPS.
///
/// The issuer URL comes from an unverified token claim, so this resolver
/// re-validates it against an allowlist of trusted base issuers before
/// making any request. A verifier already enforces its own base issuer
/// prefix; the allowlist check here guards direct callers and
/// multi-issuer configurations.
#[derive(Debug, Clone)]
pub struct HttpKeySetResolver {
    client: reqwest::Client,
    allowed_prefixes: Vec<String>,
}

impl HttpKeySetResolver {
    /// Creates a resolver trusting the given base issuer URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ApiKeyError::Unknown`] if the HTTP client cannot be built.
    pub fn new(allowed_issuers: impl IntoIterator<Item = Url>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ApiKeyError::unknown("failed to build HTTP client", e))?;

        let allowed_prefixes = allowed_issuers.into_iter().map(|u| issuer_prefix(&u)).collect();

        Ok(Self { client, allowed_prefixes })
    }

    fn is_allowed(&self, issuer: &Url) -> bool {
        self.allowed_prefixes.iter().any(|prefix| issuer.as_str().starts_with(prefix.as_str()))
    }
}

#[async_trait]
impl KeySetResolver for HttpKeySetResolver {
    #[tracing::instrument(skip(self), fields(key_id = %lookup.key_id))]
    async fn resolve(&self, lookup: &KeyLookup) -> Result<JwkSet> {
        if !self.is_allowed(&lookup.issuer) {
            return Err(ApiKeyError::malformed_token("Untrusted issuer"));
        }

        let jwks_url = join_url(&lookup.issuer, WELL_KNOWN_JWKS_PATH);

        let response = self.client.get(jwks_url.clone()).send().await.map_err(|e| {
            tracing::warn!(url = %jwks_url, error = %e, "JWKS fetch failed");
            ApiKeyError::unauthorized()
        })?;

        // 404 is the expected shape for a revoked or unknown key: the JWKS
        // document exists only while the record is live
        if !response.status().is_success() {
            tracing::debug!(url = %jwks_url, status = %response.status(), "JWKS not available");
            return Err(ApiKeyError::unauthorized());
        }

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::warn!(url = %jwks_url, error = %e, "JWKS body could not be parsed");
            ApiKeyError::unauthorized()
        })
    }
}

/// Resolver backed directly by the key-record store.
///
/// For services that host both issuance and verification: skips the HTTP
/// round trip and reads the record the issuer wrote. Missing and revoked
/// records fail identically, mirroring the publication convention that a
/// key's JWKS document disappears when the record stops being live.
#[derive(Clone)]
pub struct StoreKeySetResolver {
    store: Arc<dyn ApiKeyStore>,
}

impl StoreKeySetResolver {
    /// Creates a resolver reading from the given store.
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for StoreKeySetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreKeySetResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeySetResolver for StoreKeySetResolver {
    #[tracing::instrument(skip(self), fields(key_id = %lookup.key_id))]
    async fn resolve(&self, lookup: &KeyLookup) -> Result<JwkSet> {
        let record = self.store.get_by_key_id(lookup.key_id).await.map_err(|e| {
            tracing::warn!(error = %e, "key record lookup failed");
            ApiKeyError::unauthorized()
        })?;

        match record {
            Some(record) if !record.revoked => Ok(single_key_set(record.public_jwk)),
            Some(_) => {
                tracing::debug!("key record is revoked");
                Err(ApiKeyError::unauthorized())
            },
            None => {
                tracing::debug!("no key record found");
                Err(ApiKeyError::unauthorized())
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use chrono::Utc;
    use keymint_storage::{ApiKeyRecord, MemoryApiKeyStore};
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;

    use super::*;
    use crate::jwk::rsa_public_jwk;

    fn sample_jwk(key_id: Uuid) -> jsonwebtoken::jwk::Jwk {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation");
        rsa_public_jwk(&private_key.to_public_key(), key_id)
    }

    fn lookup(base: &str, key_id: Uuid) -> KeyLookup {
        let base = Url::parse(base).expect("valid URL");
        KeyLookup { issuer: join_url(&base, &key_id.to_string()), key_id }
    }

    #[tokio::test]
    async fn test_http_resolver_rejects_untrusted_issuer() {
        let resolver =
            HttpKeySetResolver::new([Url::parse("https://trusted.example").expect("valid URL")])
                .expect("resolver");

        let result = resolver.resolve(&lookup("https://evil.example", Uuid::now_v7())).await;

        assert!(matches!(result, Err(ApiKeyError::MalformedToken(_))));
    }

    #[tokio::test]
    async fn test_http_resolver_prefix_match_is_segment_aware() {
        // "https://trusted.example.evil.example" must not pass as a prefix
        // match against "https://trusted.example"
        let resolver =
            HttpKeySetResolver::new([Url::parse("https://trusted.example").expect("valid URL")])
                .expect("resolver");

        let result =
            resolver.resolve(&lookup("https://trusted.example.evil.example", Uuid::now_v7())).await;

        assert!(matches!(result, Err(ApiKeyError::MalformedToken(_))));
    }

    #[tokio::test]
    async fn test_store_resolver_returns_live_key() {
        let store = Arc::new(MemoryApiKeyStore::new());
        let key_id = Uuid::now_v7();
        let record = ApiKeyRecord::builder()
            .key_id(key_id)
            .owner_id("u1")
            .public_jwk(sample_jwk(key_id))
            .build();
        store.insert(&record).await.expect("insert");

        let resolver = StoreKeySetResolver::new(store);
        let set = resolver
            .resolve(&lookup("https://example.com", key_id))
            .await
            .expect("live key resolves");

        assert_eq!(set.keys.len(), 1);
        assert!(set.find(&key_id.to_string()).is_some());
    }

    #[tokio::test]
    async fn test_store_resolver_rejects_unknown_key() {
        let resolver = StoreKeySetResolver::new(Arc::new(MemoryApiKeyStore::new()));

        let result = resolver.resolve(&lookup("https://example.com", Uuid::now_v7())).await;

        assert!(matches!(result, Err(ApiKeyError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_store_resolver_rejects_revoked_key() {
        let store = Arc::new(MemoryApiKeyStore::new());
        let key_id = Uuid::now_v7();
        let record = ApiKeyRecord::builder()
            .key_id(key_id)
            .owner_id("u1")
            .public_jwk(sample_jwk(key_id))
            .revoked(true)
            .revoked_at(Utc::now())
            .build();
        store.insert(&record).await.expect("insert");

        let resolver = StoreKeySetResolver::new(store);
        let result = resolver.resolve(&lookup("https://example.com", key_id)).await;

        assert!(matches!(result, Err(ApiKeyError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_revoked_and_unknown_are_indistinguishable() {
        let store = Arc::new(MemoryApiKeyStore::new());
        let revoked_id = Uuid::now_v7();
        let record = ApiKeyRecord::builder()
            .key_id(revoked_id)
            .owner_id("u1")
            .public_jwk(sample_jwk(revoked_id))
            .revoked(true)
            .build();
        store.insert(&record).await.expect("insert");

        let resolver = StoreKeySetResolver::new(store);
        let revoked = resolver
            .resolve(&lookup("https://example.com", revoked_id))
            .await
            .expect_err("revoked must fail");
        let unknown = resolver
            .resolve(&lookup("https://example.com", Uuid::now_v7()))
            .await
            .expect_err("unknown must fail");

        assert_eq!(revoked.to_string(), unknown.to_string());
    }
}
