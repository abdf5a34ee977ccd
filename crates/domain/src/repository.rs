//! Typed repositories over a record store, with optimistic concurrency.

use std::marker::PhantomData;

use store::{Record, RecordQuery, RecordStore, RecordStoreExt, SaveOptions, StoreError, Version};
use uuid::Uuid;

use crate::aggregate::{Aggregate, Entity};
use crate::error::DomainError;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate as saved.
    pub aggregate: A,

    /// The events recorded by the command, drained after the save succeeded.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that target an existing aggregate.
///
/// Every such command carries the version its issuer last read; a mismatch
/// with the persisted version fails the command with a version conflict.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the version the issuer last read.
    fn expected_version(&self) -> Version;
}

/// Repository for one entity type.
///
/// Entities are stored as JSON records. For aggregates, every save passes the
/// version the aggregate was loaded at and the store rejects it if another
/// writer got there first.
pub struct Repository<S, E>
where
    S: RecordStore,
    E: Entity,
{
    store: S,
    _phantom: PhantomData<E>,
}

impl<S, E> Clone for Repository<S, E>
where
    S: RecordStore + Clone,
    E: Entity,
{
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<S, E> Repository<S, E>
where
    S: RecordStore,
    E: Entity,
{
    /// Creates a new repository over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an entity, returning None if it doesn't exist.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, DomainError> {
        self.store
            .find_by_id(E::kind(), id)
            .await?
            .map(Self::from_record)
            .transpose()
    }

    /// Returns true if an entity of this kind holds `value` in unique key `field`.
    pub async fn exists_by_unique_key(
        &self,
        field: &str,
        value: &str,
    ) -> Result<bool, DomainError> {
        Ok(self
            .store
            .exists_by_unique_key(E::kind(), field, value)
            .await?)
    }

    /// Loads all entities carrying the given tag value, in insertion order.
    pub async fn find_by_tag(&self, field: &str, value: &str) -> Result<Vec<E>, DomainError> {
        self.find_matching(RecordQuery::for_kind(E::kind()).tag(field, value))
            .await
    }

    /// Loads every entity of this kind, in insertion order.
    pub async fn find_all(&self) -> Result<Vec<E>, DomainError> {
        self.find_matching(RecordQuery::for_kind(E::kind())).await
    }

    async fn find_matching(&self, query: RecordQuery) -> Result<Vec<E>, DomainError> {
        let records = self.store.query(query).await?;

        records.into_iter().map(Self::from_record).collect()
    }

    fn from_record(record: Record) -> Result<E, DomainError> {
        let mut entity: E = serde_json::from_value(record.payload)?;
        entity.set_sequence(record.sequence);
        Ok(entity)
    }

    /// Stores an entity that must not exist yet.
    pub async fn insert(&self, entity: &E) -> Result<Version, DomainError> {
        let record = Self::to_record(entity)?;
        Ok(self.store.save(record, SaveOptions::expect_new()).await?)
    }

    fn to_record(entity: &E) -> Result<Record, DomainError> {
        let mut builder = Record::builder().kind(E::kind()).id(entity.record_id());
        for (field, value) in entity.unique_keys() {
            builder = builder.unique_key(field, value);
        }
        for (field, value) in entity.tags() {
            builder = builder.tag(field, value);
        }
        Ok(builder.payload(entity)?.build())
    }
}

impl<S, A> Repository<S, A>
where
    S: RecordStore,
    A: Aggregate,
{
    /// Loads an aggregate at its persisted version.
    ///
    /// Fails with `NotFound` if it doesn't exist.
    pub async fn load(&self, id: Uuid) -> Result<A, DomainError> {
        let record = self.store.get(A::kind(), id).await?;
        Self::restore(record)
    }

    /// Loads an aggregate at its persisted version, returning None if it
    /// doesn't exist.
    pub async fn find(&self, id: Uuid) -> Result<Option<A>, DomainError> {
        self.store
            .find_by_id(A::kind(), id)
            .await?
            .map(Self::restore)
            .transpose()
    }

    /// Loads all aggregates carrying the given tag value at their persisted
    /// versions, in insertion order.
    pub async fn load_by_tag(&self, field: &str, value: &str) -> Result<Vec<A>, DomainError> {
        self.store
            .query(RecordQuery::for_kind(A::kind()).tag(field, value))
            .await?
            .into_iter()
            .map(Self::restore)
            .collect()
    }

    fn restore(record: Record) -> Result<A, DomainError> {
        let version = record.version;
        let mut aggregate = Self::from_record(record)?;
        aggregate.set_version(version);
        Ok(aggregate)
    }

    /// Saves an aggregate, expecting the store to still hold the version it
    /// was loaded at.
    ///
    /// On success the aggregate's version is advanced to the stored one.
    pub async fn save(&self, aggregate: &mut A) -> Result<Version, DomainError> {
        let record = Self::to_record(aggregate)?;
        let options = SaveOptions::expect_version(aggregate.version());

        let new_version = self
            .store
            .save(record, options)
            .await
            .inspect_err(|err| {
                if matches!(err, StoreError::VersionConflict { .. }) {
                    metrics::counter!("version_conflicts_total").increment(1);
                }
            })?;

        aggregate.set_version(new_version);
        Ok(new_version)
    }

    /// Persists a freshly created aggregate and drains its events.
    pub async fn create(&self, mut aggregate: A) -> Result<CommandResult<A>, DomainError> {
        let new_version = self.save(&mut aggregate).await?;
        let events = aggregate.drain_events();

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Loads an aggregate, applies a mutation and saves the result.
    ///
    /// The mutation runs only if `expected_version` matches the loaded
    /// version. If it records no events nothing is written and the version
    /// stays the same.
    pub async fn execute<F, E>(
        &self,
        id: Uuid,
        expected_version: Version,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: FnOnce(&mut A) -> Result<(), E>,
        DomainError: From<E>,
    {
        let mut aggregate = self.load(id).await?;
        let current_version = aggregate.version();

        if current_version != expected_version {
            metrics::counter!("version_conflicts_total").increment(1);
            tracing::warn!(
                kind = A::kind(),
                %id,
                expected = %expected_version,
                actual = %current_version,
                "stale version supplied"
            );
            return Err(StoreError::VersionConflict {
                kind: A::kind().to_string(),
                id,
                expected: expected_version,
                actual: current_version,
            }
            .into());
        }

        command_fn(&mut aggregate)?;

        if aggregate.pending_events().is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        let new_version = self.save(&mut aggregate).await?;
        let events = aggregate.drain_events();

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Runs [`execute`](Self::execute) with the target and version taken from a command.
    pub async fn execute_command<C, F, E>(
        &self,
        command: &C,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        C: Command<Aggregate = A>,
        F: FnOnce(&mut A) -> Result<(), E>,
        DomainError: From<E>,
    {
        self.execute(command.aggregate_id(), command.expected_version(), command_fn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use crate::error::ErrorKind;
    use serde::{Deserialize, Serialize};
    use store::InMemoryRecordStore;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum NoteEvent {
        Written { text: String },
    }

    impl DomainEvent for NoteEvent {
        fn event_type(&self) -> &'static str {
            "NoteWritten"
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        slug: String,
        text: String,
        #[serde(skip)]
        version: Version,
        #[serde(skip)]
        events: Vec<NoteEvent>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("text must not be empty")]
    struct EmptyText;

    impl From<EmptyText> for DomainError {
        fn from(_: EmptyText) -> Self {
            DomainError::from(crate::error::ValidationError::new("text", "must not be empty"))
        }
    }

    impl Note {
        fn new(slug: &str) -> Self {
            Self {
                id: Uuid::new_v4(),
                slug: slug.to_string(),
                text: String::new(),
                version: Version::initial(),
                events: Vec::new(),
            }
        }

        fn write(&mut self, text: &str) -> Result<(), EmptyText> {
            if text.is_empty() {
                return Err(EmptyText);
            }
            if self.text != text {
                self.text = text.to_string();
                self.events.push(NoteEvent::Written {
                    text: text.to_string(),
                });
            }
            Ok(())
        }
    }

    impl Entity for Note {
        fn kind() -> &'static str {
            "Note"
        }

        fn record_id(&self) -> Uuid {
            self.id
        }

        fn unique_keys(&self) -> Vec<(&'static str, String)> {
            vec![("slug", self.slug.clone())]
        }
    }

    impl Aggregate for Note {
        type Event = NoteEvent;

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn pending_events(&self) -> &[NoteEvent] {
            &self.events
        }

        fn drain_events(&mut self) -> Vec<NoteEvent> {
            std::mem::take(&mut self.events)
        }
    }

    async fn created(repo: &Repository<InMemoryRecordStore, Note>, slug: &str) -> Uuid {
        let note = Note::new(slug);
        let id = note.id;
        repo.create(note).await.unwrap();
        id
    }

    #[tokio::test]
    async fn create_then_load() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;

        let note = repo.load(id).await.unwrap();
        assert_eq!(note.version(), Version::first());
        assert!(repo.exists_by_unique_key("slug", "hello").await.unwrap());
    }

    #[tokio::test]
    async fn execute_advances_version_and_drains_events() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;

        let result = repo
            .execute(id, Version::first(), |note| note.write("first"))
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.events.len(), 1);
        assert!(result.aggregate.pending_events().is_empty());
        assert_eq!(repo.load(id).await.unwrap().text, "first");
    }

    #[tokio::test]
    async fn execute_without_events_does_not_save() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;
        repo.execute(id, Version::first(), |note| note.write("same"))
            .await
            .unwrap();

        let result = repo
            .execute(id, Version::new(2), |note| note.write("same"))
            .await
            .unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(repo.load(id).await.unwrap().version(), Version::new(2));
    }

    #[tokio::test]
    async fn stale_expected_version_is_rejected_before_mutation() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;
        repo.execute(id, Version::first(), |note| note.write("a"))
            .await
            .unwrap();

        let mut ran = false;
        let err = repo
            .execute(id, Version::first(), |note| {
                ran = true;
                note.write("b")
            })
            .await
            .unwrap_err();

        assert!(!ran);
        assert_eq!(err.kind(), ErrorKind::VersionConflict);
    }

    #[tokio::test]
    async fn concurrent_save_of_stale_copy_conflicts() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;

        let mut first = repo.load(id).await.unwrap();
        let mut second = repo.load(id).await.unwrap();

        first.write("from first").unwrap();
        repo.save(&mut first).await.unwrap();

        second.write("from second").unwrap();
        let err = repo.save(&mut second).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::VersionConflict);
        assert_eq!(second.version(), Version::first());
        assert_eq!(repo.load(id).await.unwrap().text, "from first");
    }

    #[tokio::test]
    async fn failing_command_is_not_saved() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;

        let err = repo
            .execute(id, Version::first(), |note| note.write(""))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(repo.load(id).await.unwrap().version(), Version::first());
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let err = repo.load(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(repo.find(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_restores_version() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        let id = created(&repo, "hello").await;
        repo.execute(id, Version::first(), |note| note.write("a"))
            .await
            .unwrap();

        let note = repo.find(id).await.unwrap().unwrap();
        assert_eq!(note.version(), Version::new(2));

        // Plain entity lookups skip the version.
        let plain = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(plain.version(), Version::initial());
    }

    #[tokio::test]
    async fn duplicate_unique_key_is_rejected() {
        let repo: Repository<_, Note> = Repository::new(InMemoryRecordStore::new());
        created(&repo, "taken").await;

        let err = repo.create(Note::new("taken")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }
}
