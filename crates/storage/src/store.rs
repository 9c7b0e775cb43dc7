//! Storage trait for API key record lifecycle operations.
//!
//! [`ApiKeyStore`] abstracts persistence so production backends (SQL,
//! key-value) and testing ([`MemoryApiKeyStore`]) share the same interface.
//! The verification side of the protocol reaches records only through a
//! key-set resolver, which turns a missing or revoked record into a
//! verification failure.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    error::{StorageError, StorageResult},
    record::ApiKeyRecord,
};

/// Persistence layer for API key records.
///
/// # Semantics
///
/// - Records are inserted exactly once; key IDs are never reused.
/// - Revocation is idempotent, owner-scoped, and permanent.
/// - There is no update operation: expiry is enforced by the token's `exp`
///   claim at verification time, never by record mutation.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Stores a new key record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if a record with the same
    /// `key_id` already exists, or a backend error.
    async fn insert(&self, record: &ApiKeyRecord) -> StorageResult<()>;

    /// Retrieves a key record by its key ID.
    ///
    /// Returns `Ok(None)` when no record exists; revoked records are
    /// returned as-is so callers can inspect `revoked`.
    async fn get_by_key_id(&self, key_id: Uuid) -> StorageResult<Option<ApiKeyRecord>>;

    /// Lists records belonging to an owner, newest first.
    ///
    /// Key IDs are time-ordered (UUIDv7), so ordering by `key_id`
    /// descending is creation order. `offset` rows are skipped before
    /// `limit` is applied.
    async fn find_by_owner(
        &self,
        owner_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> StorageResult<Vec<ApiKeyRecord>>;

    /// Revokes a key on behalf of its owner.
    ///
    /// Idempotent: revoking an already-revoked key succeeds without
    /// changing the original `revoked_at` timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no record with this `key_id`
    /// exists for this owner. A record owned by someone else is reported
    /// as not found rather than revealing its existence.
    async fn revoke(&self, owner_id: &str, key_id: Uuid) -> StorageResult<()>;
}

/// In-memory implementation of [`ApiKeyStore`] for testing and development.
///
/// Stores records in a [`parking_lot::RwLock`]ed hash map; data does not
/// persist between restarts. Cloning the store shares the underlying map.
#[derive(Debug, Default, Clone)]
pub struct MemoryApiKeyStore {
    records: std::sync::Arc<RwLock<HashMap<Uuid, ApiKeyRecord>>>,
}

impl MemoryApiKeyStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyStore for MemoryApiKeyStore {
    #[tracing::instrument(skip(self, record), fields(key_id = %record.key_id))]
    async fn insert(&self, record: &ApiKeyRecord) -> StorageResult<()> {
        let mut records = self.records.write();

        if records.contains_key(&record.key_id) {
            return Err(StorageError::conflict(record.key_id.to_string()));
        }

        records.insert(record.key_id, record.clone());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_key_id(&self, key_id: Uuid) -> StorageResult<Option<ApiKeyRecord>> {
        let records = self.records.read();
        Ok(records.get(&key_id).cloned())
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_owner(
        &self,
        owner_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> StorageResult<Vec<ApiKeyRecord>> {
        let records = self.records.read();

        let mut owned: Vec<ApiKeyRecord> =
            records.values().filter(|r| r.owner_id == owner_id).cloned().collect();

        // Newest first: UUIDv7 sorts by creation time
        owned.sort_by(|a, b| b.key_id.cmp(&a.key_id));

        let owned = owned
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        Ok(owned)
    }

    #[tracing::instrument(skip(self))]
    async fn revoke(&self, owner_id: &str, key_id: Uuid) -> StorageResult<()> {
        let mut records = self.records.write();

        let record = records
            .get_mut(&key_id)
            .filter(|r| r.owner_id == owner_id)
            .ok_or_else(|| StorageError::not_found(key_id.to_string()))?;

        // Idempotent: first revocation wins
        if !record.revoked {
            record.revoked = true;
            record.revoked_at = Some(Utc::now());
        }
        Ok(())
    }
}
