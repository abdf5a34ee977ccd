use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    Record, RecordQuery, Result, StoreError, Version,
    store::{RecordStore, SaveOptions},
};

#[derive(Default)]
struct MemoryState {
    records: HashMap<(String, Uuid), Record>,
    next_sequence: u64,
}

/// In-memory record store implementation.
///
/// A single write lock covers the version check, the unique-key check and
/// the write, which gives the same compare-and-swap semantics a row-versioned
/// table provides.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.next_sequence = 0;
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn save(&self, mut record: Record, options: SaveOptions) -> Result<Version> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let key = (record.kind.clone(), record.id);
        let existing = state.records.get(&key);
        let current_version = existing.map(|r| r.version).unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            tracing::warn!(
                kind = %record.kind,
                id = %record.id,
                %expected,
                actual = %current_version,
                "version conflict on save"
            );
            return Err(StoreError::VersionConflict {
                kind: record.kind,
                id: record.id,
                expected,
                actual: current_version,
            });
        }

        for (field, value) in &record.unique_keys {
            let taken = state.records.values().any(|other| {
                other.kind == record.kind
                    && other.id != record.id
                    && other.unique_key(field) == Some(value.as_str())
            });
            if taken {
                return Err(StoreError::DuplicateKey {
                    kind: record.kind.clone(),
                    field: field.clone(),
                    value: value.clone(),
                });
            }
        }

        let sequence = match existing {
            Some(previous) => previous.sequence,
            None => {
                state.next_sequence += 1;
                state.next_sequence
            }
        };

        let new_version = current_version.next();
        record.version = new_version;
        record.sequence = sequence;

        tracing::debug!(
            kind = %record.kind,
            id = %record.id,
            version = %new_version,
            "record saved"
        );
        state.records.insert(key, record);

        Ok(new_version)
    }

    async fn find_by_id(&self, kind: &str, id: Uuid) -> Result<Option<Record>> {
        let state = self.state.read().await;
        Ok(state.records.get(&(kind.to_string(), id)).cloned())
    }

    async fn exists_by_unique_key(&self, kind: &str, field: &str, value: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .any(|r| r.kind == kind && r.unique_key(field) == Some(value)))
    }

    async fn query(&self, query: RecordQuery) -> Result<Vec<Record>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .records
            .values()
            .filter(|r| {
                r.kind == query.kind
                    && query
                        .tags
                        .iter()
                        .all(|(field, value)| r.tag(field) == Some(value.as_str()))
            })
            .cloned()
            .collect();

        records.sort_by_key(|r| r.sequence);

        let offset = query.offset.unwrap_or(0);
        let records = records.into_iter().skip(offset);
        let records = match query.limit {
            Some(limit) => records.take(limit).collect(),
            None => records.collect(),
        };

        Ok(records)
    }

    async fn get_version(&self, kind: &str, id: Uuid) -> Result<Option<Version>> {
        let state = self.state.read().await;
        Ok(state
            .records
            .get(&(kind.to_string(), id))
            .map(|r| r.version))
    }
}
