use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Version;

/// A persisted document together with its bookkeeping fields.
///
/// The store does not interpret `payload`; it only looks at the identity,
/// the unique keys and the tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Kind of entity stored (e.g. "Invoice", "Payment").
    pub kind: String,

    /// Identifier, unique within `kind`.
    pub id: Uuid,

    /// Version after the last successful save. Assigned by the store.
    pub version: Version,

    /// Insertion order within the store. Assigned by the store on first save.
    pub sequence: u64,

    /// Fields whose values must be unique within `kind`.
    pub unique_keys: BTreeMap<String, String>,

    /// Non-unique fields that can be used to query records.
    pub tags: BTreeMap<String, String>,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,

    /// The entity serialized as JSON.
    pub payload: serde_json::Value,
}

impl Record {
    /// Creates a new record builder.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// Returns the value of a unique key, if set.
    pub fn unique_key(&self, field: &str) -> Option<&str> {
        self.unique_keys.get(field).map(String::as_str)
    }

    /// Returns the value of a tag, if set.
    pub fn tag(&self, field: &str) -> Option<&str> {
        self.tags.get(field).map(String::as_str)
    }
}

/// Builder for constructing records.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    kind: Option<String>,
    id: Option<Uuid>,
    unique_keys: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
}

impl RecordBuilder {
    /// Sets the record kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the record ID.
    pub fn id(mut self, id: impl Into<Uuid>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a field that must be unique within the record kind.
    pub fn unique_key(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.unique_keys.insert(field.into(), value.into());
        self
    }

    /// Adds a queryable, non-unique field.
    pub fn tag(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(field.into(), value.into());
        self
    }

    /// Sets the write timestamp. If not set, the current time will be used.
    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the record.
    ///
    /// # Panics
    ///
    /// Panics if `kind`, `id` or `payload` are not set.
    pub fn build(self) -> Record {
        Record {
            kind: self.kind.expect("kind is required"),
            id: self.id.expect("id is required"),
            version: Version::initial(),
            sequence: 0,
            unique_keys: self.unique_keys,
            tags: self.tags,
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
            payload: self.payload.expect("payload is required"),
        }
    }

    /// Tries to build the record, returning None if required fields are missing.
    pub fn try_build(self) -> Option<Record> {
        Some(Record {
            kind: self.kind?,
            id: self.id?,
            version: Version::initial(),
            sequence: 0,
            unique_keys: self.unique_keys,
            tags: self.tags,
            updated_at: self.updated_at.unwrap_or_else(Utc::now),
            payload: self.payload?,
        })
    }
}
