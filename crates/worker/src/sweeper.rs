//! Periodic removal of expired idempotency records.

use std::sync::Arc;
use std::time::Duration;

use common::Clock;
use domain::IdempotencyGuard;
use store::IdempotencyStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns a task that sweeps expired records every `period` until
/// `shutdown` turns true or its sender is dropped.
///
/// A failed sweep is logged and retried on the next tick.
pub fn spawn_idempotency_sweeper<S, C>(
    guard: Arc<IdempotencyGuard<S, C>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: IdempotencyStore + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(period_secs = period.as_secs(), "idempotency sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = guard.clock().now();
                    if let Err(e) = guard.sweep_expired(now).await {
                        tracing::warn!(error = %e, "idempotency sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("idempotency sweeper stopped");
    })
}
