//! Storage for idempotency records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;

/// The stored outcome of a command executed under a client-supplied key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// Client-supplied idempotency key.
    pub key: String,

    /// The command result serialized as JSON.
    pub serialized_result: serde_json::Value,

    /// When the record was stored.
    pub created_at: DateTime<Utc>,

    /// When the record stops being honoured.
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Returns true once `now` has reached the expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Storage contract for idempotency records.
///
/// Writes go straight to the store and are not enlisted in any caller
/// transaction.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Returns the record stored under `key`, expired or not.
    async fn get(&self, key: &str) -> Result<Option<IdempotencyRecord>>;

    /// Stores a record unless a live one already exists for its key.
    ///
    /// An expired record under the same key is replaced. Returns true if
    /// the record was written.
    async fn put(&self, record: IdempotencyRecord, now: DateTime<Utc>) -> Result<bool>;

    /// Deletes all records expired at `now`, returning how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// In-memory idempotency store.
#[derive(Clone, Default)]
pub struct InMemoryIdempotencyStore {
    records: Arc<RwLock<HashMap<String, IdempotencyRecord>>>,
}

impl InMemoryIdempotencyStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records held, including expired ones.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no records are held.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get(&self, key: &str) -> Result<Option<IdempotencyRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, record: IdempotencyRecord, now: DateTime<Utc>) -> Result<bool> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.key)
            && !existing.is_expired(now)
        {
            return Ok(false);
        }
        records.insert(record.key.clone(), record);
        Ok(true)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok(before - records.len())
    }
}
