//! Core entity, aggregate and domain event traits.

use serde::{Serialize, de::DeserializeOwned};
use store::Version;
use uuid::Uuid;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}

/// Anything the core persists as a record.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Returns the record kind this entity is stored under.
    fn kind() -> &'static str;

    /// Returns the entity's identifier.
    fn record_id(&self) -> Uuid;

    /// Fields that must be unique across all entities of this kind.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Non-unique fields other entities are looked up by.
    fn tags(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Receives the store's insertion sequence when the entity is loaded.
    fn set_sequence(&mut self, _sequence: u64) {}
}

/// Trait for mutable aggregate roots.
///
/// An aggregate is a cluster of domain objects treated as a single unit of
/// consistency. Its methods validate every precondition before touching any
/// field, so a failed call leaves it unchanged.
///
/// Mutations record domain events in an outbox that is drained once the
/// aggregate has been saved.
pub trait Aggregate: Entity {
    /// The type of events this aggregate records.
    type Event: DomainEvent;

    /// Returns the version the aggregate was loaded at.
    ///
    /// `Version::initial()` for an aggregate that has never been saved.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the repository after a successful save.
    fn set_version(&mut self, version: Version);

    /// Returns events recorded since the last drain.
    fn pending_events(&self) -> &[Self::Event];

    /// Returns and clears the recorded events.
    fn drain_events(&mut self) -> Vec<Self::Event>;
}
