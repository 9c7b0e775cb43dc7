//! RSA public key export as a JSON Web Key.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse,
    RSAKeyParameters, RSAKeyType,
};
use rsa::{RsaPublicKey, traits::PublicKeyParts};
use uuid::Uuid;

/// Exports an RSA public key as a JWK tagged with the given key ID.
///
/// The modulus and exponent are base64url-encoded without padding per
/// RFC 7517; `alg` is fixed to RS256 and `use` to signature, matching the
/// only algorithm this protocol accepts.
#[must_use]
pub fn rsa_public_jwk(public_key: &RsaPublicKey, key_id: Uuid) -> Jwk {
    Jwk {
        common: CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_algorithm: Some(KeyAlgorithm::RS256),
            key_id: Some(key_id.to_string()),
            ..Default::default()
        },
        algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
            key_type: RSAKeyType::RSA,
            n: URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }),
    }
}

/// Wraps a single JWK in a key set, the shape served at
/// `<issuer>/.well-known/jwks.json`.
#[must_use]
pub fn single_key_set(jwk: Jwk) -> JwkSet {
    JwkSet { keys: vec![jwk] }
}
