//! Liveness reaper: evicts connections whose peer has gone away.
//!
//! A sweep is triggered after every accepted connection and, when enabled,
//! on a fixed interval so that dead peers do not linger while no new
//! clients arrive. At most one sweep runs at a time; a trigger that fires
//! while a sweep is still probing a slow peer is skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{ConnectionId, ConnectionRegistry};

/// Probes registered connections and removes the dead ones.
#[derive(Debug, Clone)]
pub struct LivenessReaper {
    registry: Arc<ConnectionRegistry>,
    in_flight: Arc<AtomicBool>,
}

/// Marks a sweep as running; cleared on drop, including when the sweeping
/// task is aborted.
struct SweepGuard(Arc<AtomicBool>);

impl SweepGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LivenessReaper {
    /// Creates a reaper sweeping `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs one sweep and returns the ids that were evicted.
    ///
    /// Returns an empty list without probing anything if another sweep
    /// started by this reaper (or a clone of it) is still running.
    pub async fn sweep(&self) -> Vec<ConnectionId> {
        let Some(_guard) = SweepGuard::acquire(&self.in_flight) else {
            tracing::debug!("liveness sweep already running, skipped");
            return Vec::new();
        };

        let removed = self.registry.remove_dead().await;
        if !removed.is_empty() {
            let remaining = self.registry.len().await;
            tracing::info!(removed = removed.len(), remaining, "liveness sweep finished");
        }
        removed
    }

    /// Runs one sweep on a background task without waiting for it.
    pub fn trigger(&self) -> JoinHandle<Vec<ConnectionId>> {
        let reaper = self.clone();
        tokio::spawn(async move { reaper.sweep().await })
    }

    /// Spawns a task that sweeps every `period` until aborted.
    pub fn spawn_periodic(&self, period: Duration) -> JoinHandle<()> {
        let reaper = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                reaper.sweep().await;
            }
        })
    }
}
