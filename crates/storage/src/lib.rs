//! # Keymint Storage
//!
//! Key-record persistence contract for Keymint API keys.
//!
//! This crate defines the shape of persisted key records and the
//! [`ApiKeyStore`] trait that storage backends implement. The protocol core
//! (`keymint-authn`) never talks to a database directly; it consumes this
//! contract through a resolver, so SQL-backed, KV-backed and in-memory
//! backends are interchangeable.
//!
//! ## Record lifecycle
//!
//! ```text
//! ┌─────────────┐          ┌─────────────┐
//! │   Created   │─────────►│   Revoked   │
//! │ (at issue)  │  revoke  │ (permanent) │
//! └─────────────┘          └─────────────┘
//! ```
//!
//! A record is written once at issuance and has exactly one mutation path:
//! `revoked` flips from `false` to `true`, never back. Key expiry is enforced
//! by token `exp` validation at verification time, not by record mutation.
//!
//! ## Example
//!
//! ```
//! use keymint_storage::{ApiKeyRecord, ApiKeyStore, MemoryApiKeyStore};
//! use uuid::Uuid;
//!
//! # fn sample_jwk() -> jsonwebtoken::jwk::Jwk {
//! #     serde_json::from_value(serde_json::json!({
//! #         "kty": "RSA", "n": "AQAB", "e": "AQAB", "alg": "RS256", "use": "sig",
//! #     })).unwrap()
//! # }
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = MemoryApiKeyStore::new();
//! let key_id = Uuid::now_v7();
//!
//! let record = ApiKeyRecord::builder()
//!     .key_id(key_id)
//!     .owner_id("user_123")
//!     .public_jwk(sample_jwk())
//!     .build();
//!
//! store.insert(&record).await.unwrap();
//! store.revoke("user_123", key_id).await.unwrap();
//!
//! let revoked = store.get_by_key_id(key_id).await.unwrap().unwrap();
//! assert!(revoked.revoked);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Storage error types.
pub mod error;
/// Persisted key record shape.
pub mod record;
/// Storage trait and in-memory implementation.
pub mod store;

pub use error::{StorageError, StorageResult};
pub use record::ApiKeyRecord;
pub use store::{ApiKeyStore, MemoryApiKeyStore};
