//! Deduplication of retried commands by client-supplied key.
//!
//! The guard stores a command's serialized result under the caller's key
//! after the command has succeeded. A later request with the same key gets
//! the stored result back instead of running the command again.
//!
//! Storage is best-effort bookkeeping: the record is written outside the
//! command's own unit of work, and a failure to write it is logged and
//! ignored. Two requests racing with the same key before either has stored
//! its result may both run the command.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use common::Clock;
use serde::{Serialize, de::DeserializeOwned};
use store::{IdempotencyRecord, IdempotencyStore};

use crate::error::DomainError;

/// Default time-to-live of a stored result, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

/// Runs commands at most once per idempotency key within the TTL.
pub struct IdempotencyGuard<S, C> {
    store: S,
    clock: C,
    ttl: Duration,
}

impl<S, C> IdempotencyGuard<S, C>
where
    S: IdempotencyStore,
    C: Clock,
{
    /// Creates a guard with the default 24 hour TTL.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }

    /// Overrides the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the stored result for `key`, or None if there is none or it
    /// has expired.
    ///
    /// Expired records are ignored here and left for [`sweep_expired`](Self::sweep_expired).
    pub async fn check<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DomainError> {
        let Some(record) = self.store.get(key).await? else {
            return Ok(None);
        };
        if record.is_expired(self.clock.now()) {
            return Ok(None);
        }

        metrics::counter!("idempotency_hits_total").increment(1);
        tracing::debug!(key, "idempotency hit");

        Ok(Some(serde_json::from_value(record.serialized_result)?))
    }

    /// Stores `result` under `key` for the TTL.
    ///
    /// Returns false if a live record already holds the key; the first
    /// stored result wins. A TTL reaching past the representable range keeps
    /// the record until the end of time.
    pub async fn store<T: Serialize>(&self, key: &str, result: &T) -> Result<bool, DomainError> {
        let now = self.clock.now();
        let record = IdempotencyRecord {
            key: key.to_string(),
            serialized_result: serde_json::to_value(result)?,
            created_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        Ok(self.store.put(record, now).await?)
    }

    /// Runs `command` unless a result is already stored under `key`.
    ///
    /// Only successful results are stored. A failure to store is logged and
    /// does not affect the returned result.
    #[tracing::instrument(skip(self, command))]
    pub async fn execute<T, F, Fut>(&self, key: &str, command: F) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        if let Some(cached) = self.check(key).await? {
            return Ok(cached);
        }

        let result = command().await?;

        match self.store(key, &result).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(key, "idempotency key already held by another result"),
            Err(err) => tracing::warn!(key, error = %err, "failed to store idempotency record"),
        }

        Ok(result)
    }

    /// Deletes records expired at `now`, returning how many were removed.
    #[tracing::instrument(skip(self))]
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let removed = self.store.delete_expired(now).await?;

        if removed > 0 {
            metrics::counter!("idempotency_records_swept_total").increment(removed as u64);
            tracing::info!(removed, "swept expired idempotency records");
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use common::FixedClock;
    use serde::Deserialize;
    use store::{InMemoryIdempotencyStore, StoreError};

    use super::*;
    use crate::error::{ErrorKind, ValidationError};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Receipt {
        number: u32,
    }

    fn guard() -> IdempotencyGuard<InMemoryIdempotencyStore, FixedClock> {
        IdempotencyGuard::new(InMemoryIdempotencyStore::new(), FixedClock::new(Utc::now()))
    }

    #[tokio::test]
    async fn check_returns_stored_result_within_ttl() {
        let guard = guard();
        guard.store("k1", &Receipt { number: 7 }).await.unwrap();

        guard.clock().advance(Duration::hours(23));
        let hit: Option<Receipt> = guard.check("k1").await.unwrap();
        assert_eq!(hit, Some(Receipt { number: 7 }));
    }

    #[tokio::test]
    async fn check_ignores_expired_and_unknown_keys() {
        let guard = guard();
        guard.store("k1", &Receipt { number: 7 }).await.unwrap();

        guard.clock().advance(Duration::hours(24));
        let expired: Option<Receipt> = guard.check("k1").await.unwrap();
        let unknown: Option<Receipt> = guard.check("nope").await.unwrap();

        assert_eq!(expired, None);
        assert_eq!(unknown, None);
    }

    #[tokio::test]
    async fn unbounded_ttl_keeps_record_without_overflow() {
        let guard = guard().with_ttl(Duration::milliseconds(i64::MAX));
        assert!(guard.store("k1", &Receipt { number: 5 }).await.unwrap());

        guard.clock().advance(Duration::days(365 * 1000));
        let hit: Option<Receipt> = guard.check("k1").await.unwrap();
        assert_eq!(hit, Some(Receipt { number: 5 }));
        assert_eq!(guard.sweep_expired(guard.clock().now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn first_stored_result_wins() {
        let guard = guard();
        assert!(guard.store("k1", &Receipt { number: 1 }).await.unwrap());
        assert!(!guard.store("k1", &Receipt { number: 2 }).await.unwrap());

        let hit: Option<Receipt> = guard.check("k1").await.unwrap();
        assert_eq!(hit, Some(Receipt { number: 1 }));
    }

    #[tokio::test]
    async fn execute_runs_command_once_per_key() {
        let guard = guard();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            let receipt = guard
                .execute("pay-1", || async {
                    let n = runs.fetch_add(1, Ordering::SeqCst) as u32;
                    Ok(Receipt { number: n })
                })
                .await
                .unwrap();
            assert_eq!(receipt, Receipt { number: 0 });
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_reruns_after_expiry() {
        let guard = guard().with_ttl(Duration::minutes(5));
        let runs = AtomicUsize::new(0);
        let command = || async {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok::<_, DomainError>(Receipt { number: 1 })
        };

        guard.execute("k", command).await.unwrap();
        guard.clock().advance(Duration::minutes(5));
        guard.execute("k", command).await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_commands_are_not_cached() {
        let guard = guard();

        let err = guard
            .execute("k", || async {
                Err::<Receipt, DomainError>(
                    ValidationError::new("amount", "must be greater than 0").into(),
                )
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let receipt = guard
            .execute("k", || async { Ok(Receipt { number: 9 }) })
            .await
            .unwrap();
        assert_eq!(receipt, Receipt { number: 9 });
    }

    struct WriteFailingStore {
        inner: InMemoryIdempotencyStore,
    }

    #[async_trait]
    impl IdempotencyStore for WriteFailingStore {
        async fn get(&self, key: &str) -> store::Result<Option<IdempotencyRecord>> {
            self.inner.get(key).await
        }

        async fn put(
            &self,
            _record: IdempotencyRecord,
            _now: DateTime<Utc>,
        ) -> store::Result<bool> {
            let err = serde_json::from_str::<u32>("not json").unwrap_err();
            Err(StoreError::Serialization(err))
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> store::Result<usize> {
            self.inner.delete_expired(now).await
        }
    }

    #[tokio::test]
    async fn storage_failure_does_not_fail_the_command() {
        let guard = IdempotencyGuard::new(
            WriteFailingStore {
                inner: InMemoryIdempotencyStore::new(),
            },
            FixedClock::new(Utc::now()),
        );

        let receipt = guard
            .execute("k", || async { Ok(Receipt { number: 3 }) })
            .await
            .unwrap();

        assert_eq!(receipt, Receipt { number: 3 });
        let hit: Option<Receipt> = guard.check("k").await.unwrap();
        assert_eq!(hit, None);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let store = InMemoryIdempotencyStore::new();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let guard = IdempotencyGuard::new(store.clone(), clock.clone());

        guard.store("old", &Receipt { number: 1 }).await.unwrap();
        clock.advance(Duration::hours(12));
        guard.store("new", &Receipt { number: 2 }).await.unwrap();
        clock.advance(Duration::hours(12));

        let removed = guard.sweep_expired(clock.now()).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        let kept: Option<Receipt> = guard.check("new").await.unwrap();
        assert_eq!(kept, Some(Receipt { number: 2 }));
    }
}
