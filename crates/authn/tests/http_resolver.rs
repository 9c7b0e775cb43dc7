//! HTTP JWKS resolver tests against a mock issuer.
//!
//! Exercises the published-key-set convention end to end: the resolver
//! fetches `<iss>/.well-known/jwks.json`, and a document that has gone
//! away (revoked key) fails with the uniform verification error.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::{Duration, Utc};
use keymint_authn::{
    HttpKeySetResolver, IssueOptions, KeyLookup, KeySetResolver, VerifyOptions,
    assert_api_key_error, issue, single_key_set, verify,
};
use url::Url;
use uuid::Uuid;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn lookup(base: &Url, key_id: Uuid) -> KeyLookup {
    let issuer = Url::parse(&format!("{}/{key_id}", base.as_str().trim_end_matches('/')))
        .expect("valid issuer URL");
    KeyLookup { key_id, issuer }
}

#[tokio::test]
async fn test_resolve_fetches_published_key_set() {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).expect("server URL");
    let key_id = Uuid::now_v7();
    let (_, public_jwk) = keymint_authn::testutil::generate_test_keypair(key_id);

    Mock::given(method("GET"))
        .and(path(format!("/{key_id}/.well-known/jwks.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(single_key_set(public_jwk)))
        .mount(&server)
        .await;

    let resolver = HttpKeySetResolver::new([base.clone()]).expect("resolver");
    let resolved = resolver.resolve(&lookup(&base, key_id)).await.expect("resolve");

    assert_eq!(resolved.keys.len(), 1);
    assert!(resolved.find(&key_id.to_string()).is_some());
}

#[tokio::test]
async fn test_missing_document_is_unauthorized() {
    // No mock mounted: the fetch 404s, as it would for a revoked key
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).expect("server URL");

    let resolver = HttpKeySetResolver::new([base.clone()]).expect("resolver");
    let result = resolver.resolve(&lookup(&base, Uuid::now_v7())).await;

    assert_api_key_error!(result, Unauthorized);
}

#[tokio::test]
async fn test_unparseable_document_is_unauthorized() {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).expect("server URL");
    let key_id = Uuid::now_v7();

    Mock::given(method("GET"))
        .and(path(format!("/{key_id}/.well-known/jwks.json")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not a JWKS document"))
        .mount(&server)
        .await;

    let resolver = HttpKeySetResolver::new([base.clone()]).expect("resolver");
    let result = resolver.resolve(&lookup(&base, key_id)).await;

    assert_api_key_error!(result, Unauthorized);
}

#[tokio::test]
async fn test_verify_end_to_end_over_http() {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).expect("server URL");

    let options = IssueOptions::builder()
        .subject("u1")
        .base_issuer_url(base.clone())
        .audience("api-key")
        .expires_at(Utc::now() + Duration::days(1))
        .build();
    let issued = issue(serde_json::Map::new(), &options).expect("issue");

    Mock::given(method("GET"))
        .and(path(format!("/{}/.well-known/jwks.json", issued.key_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(single_key_set(issued.public_jwk.clone())),
        )
        .mount(&server)
        .await;

    let resolver = HttpKeySetResolver::new([base.clone()]).expect("resolver");
    let verify_options = VerifyOptions::builder()
        .base_issuer_url(&base)
        .resolver(&resolver)
        .audience("api-key")
        .build();

    let verified = verify(&issued.token, &verify_options).await.expect("verify");

    assert_eq!(verified.subject, "u1");
    assert_eq!(verified.key_id, issued.key_id);
}
