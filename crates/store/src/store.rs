use async_trait::async_trait;
use uuid::Uuid;

use crate::{Record, RecordQuery, Result, StoreError, Version};

/// Options for saving a record.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Version the caller last read, for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the record to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the record to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Core trait for record store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Saves a record, replacing any previous revision.
    ///
    /// The version check, the unique-key check and the write happen
    /// atomically. If `options.expected_version` is set and differs from the
    /// persisted version (0 for an absent record), the save fails with
    /// `VersionConflict` and nothing is written.
    ///
    /// Returns the new version, which is the previous one plus one.
    async fn save(&self, record: Record, options: SaveOptions) -> Result<Version>;

    /// Retrieves a record by kind and ID.
    async fn find_by_id(&self, kind: &str, id: Uuid) -> Result<Option<Record>>;

    /// Returns true if a record of `kind` holds `value` in unique key `field`.
    async fn exists_by_unique_key(&self, kind: &str, field: &str, value: &str) -> Result<bool>;

    /// Retrieves records matching a query, in insertion order.
    async fn query(&self, query: RecordQuery) -> Result<Vec<Record>>;

    /// Gets the current version of a record.
    ///
    /// Returns None if the record doesn't exist.
    async fn get_version(&self, kind: &str, id: Uuid) -> Result<Option<Version>>;
}

/// Extension trait providing convenience methods for record stores.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// Retrieves a record, failing with `NotFound` if it is absent.
    async fn get(&self, kind: &str, id: Uuid) -> Result<Record> {
        self.find_by_id(kind, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id,
            })
    }

    /// Checks if a record exists.
    async fn exists(&self, kind: &str, id: Uuid) -> Result<bool> {
        Ok(self.get_version(kind, id).await?.is_some())
    }
}

// Blanket implementation for all RecordStore implementations
impl<T: RecordStore + ?Sized> RecordStoreExt for T {}
