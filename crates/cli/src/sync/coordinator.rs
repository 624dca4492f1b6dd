// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator.
//!
//! Drains the pending queue against the backend, one FIFO pass per run.
//! At most one run is in flight: concurrent callers join it and receive the
//! same report.
//!
//! # Outcomes per operation
//!
//! | Replay result | Queue                  | Report                      |
//! |---------------|------------------------|-----------------------------|
//! | applied/dup   | removed, client notified | `succeeded`               |
//! | rejected      | moved to failed list   | `failed`, `dead_lettered`   |
//! | transient     | attempts + 1, stays    | `failed` (+ `dead_lettered` once attempts run out) |
//! | unreachable   | untouched, run stops   | `failed` for it and the rest |

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tack_core::{DeadLetterStore, FailureReason, Operation, PendingOperation, PendingStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::connectivity::{ConnectivityEvent, ConnectivityMonitor};
use super::notify::Notifier;
use super::replay::{ReplayError, ReplayResult, Replayer};
use super::status::StatusSnapshot;

/// Result of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Failures moved to the failed list during this run.
    pub dead_lettered: usize,
}

impl SyncReport {
    /// Failures that stay queued for another attempt.
    pub fn retryable(&self) -> usize {
        self.failed.saturating_sub(self.dead_lettered)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} synced, {} failed", self.succeeded, self.failed)?;
        if self.dead_lettered > 0 {
            write!(f, " ({} moved to failed list)", self.dead_lettered)?;
        }
        Ok(())
    }
}

/// Observable sync state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSession {
    pub is_syncing: bool,
    /// Report of the most recent completed run.
    pub last_result: Option<SyncReport>,
}

/// When to give up on an operation, and how long to wait between
/// automatic retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before dead-lettering (0 = unlimited).
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Returns true once `attempts` has used up the budget.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }

    /// Delay before the `retry`th consecutive automatic retry (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// The durable queues the coordinator owns.
pub struct Stores {
    pub pending: PendingStore,
    pub failed: DeadLetterStore,
}

type SyncRun = Shared<BoxFuture<'static, SyncReport>>;

/// Drains pending operations whenever connectivity allows.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    monitor: Arc<ConnectivityMonitor>,
    stores: tokio::sync::Mutex<Stores>,
    replayer: tokio::sync::Mutex<Box<dyn Replayer>>,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
    /// The run in flight. Only held to read or replace the slot.
    in_flight: Mutex<Option<SyncRun>>,
    session: watch::Sender<SyncSession>,
}

impl SyncCoordinator {
    pub fn new(
        monitor: Arc<ConnectivityMonitor>,
        stores: Stores,
        replayer: Box<dyn Replayer>,
        notifier: Arc<dyn Notifier>,
        policy: RetryPolicy,
    ) -> Self {
        let (session, _) = watch::channel(SyncSession::default());
        SyncCoordinator {
            inner: Arc::new(Inner {
                monitor,
                stores: tokio::sync::Mutex::new(stores),
                replayer: tokio::sync::Mutex::new(replayer),
                notifier,
                policy,
                in_flight: Mutex::new(None),
                session,
            }),
        }
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.inner.monitor
    }

    /// Current session state.
    pub fn session(&self) -> SyncSession {
        *self.inner.session.borrow()
    }

    /// Subscribes to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncSession> {
        self.inner.session.subscribe()
    }

    /// Runs `f` with exclusive access to the stores.
    pub async fn with_stores<R>(&self, f: impl FnOnce(&mut Stores) -> R) -> R {
        let mut stores = self.inner.stores.lock().await;
        f(&mut stores)
    }

    /// Snapshot for the status banner. Reloads both stores so that writes
    /// from other processes are counted.
    pub async fn status(&self) -> StatusSnapshot {
        let (pending_count, failed_count) = self
            .with_stores(|stores| {
                if let Err(e) = stores.pending.refresh() {
                    warn!(error = %e, "could not reload pending queue");
                }
                if let Err(e) = stores.failed.refresh() {
                    warn!(error = %e, "could not reload failed list");
                }
                (stores.pending.count(), stores.failed.count())
            })
            .await;
        let connectivity = self.inner.monitor.state();
        StatusSnapshot {
            is_online: connectivity.is_online,
            is_syncing: self.session().is_syncing,
            pending_count,
            failed_count,
            update_available: connectivity.update_available,
        }
    }

    /// Replays every pending operation once, oldest first.
    ///
    /// Returns immediately with an empty report while offline. If a run is
    /// already in flight, waits for it and returns its report instead of
    /// starting another.
    pub async fn sync_all(&self) -> SyncReport {
        if !self.inner.monitor.state().is_online {
            debug!("offline, sync skipped");
            return SyncReport::default();
        }
        self.join_or_start().await
    }

    fn join_or_start(&self) -> SyncRun {
        let mut slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(run) = slot.as_ref() {
            debug!("joining sync in flight");
            return run.clone();
        }

        self.inner.session.send_modify(|s| s.is_syncing = true);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.drain().await });
        let inner = Arc::clone(&self.inner);
        let run = async move {
            match task.await {
                Ok(report) => report,
                Err(e) => {
                    error!(error = %e, "sync run aborted");
                    let report = SyncReport::default();
                    inner.finish(report);
                    report
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(run.clone());
        run
    }

    /// Spawns the automatic trigger.
    ///
    /// Syncs on every offline to online transition, retries with backoff
    /// while failed operations remain queued, and, given a `poll_interval`,
    /// picks up operations queued by other processes.
    pub fn spawn_auto_sync(
        &self,
        poll_interval: Option<Duration>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let coordinator = self.clone();
        let mut events = self.inner.monitor.subscribe();
        let mut poll = tokio::time::interval(poll_interval.unwrap_or(Duration::from_secs(3600)));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            let mut retries = 0u32;
            let mut retry_at: Option<Instant> = None;

            loop {
                let retry = async move {
                    match retry_at {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                };

                let trigger = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(ConnectivityEvent::Online) => "reconnected",
                        Some(_) => continue,
                        None => break,
                    },
                    _ = retry => "retry",
                    _ = poll.tick(), if poll_interval.is_some() => {
                        if retry_at.is_some() || coordinator.status().await.pending_count == 0 {
                            continue;
                        }
                        "queued"
                    }
                };

                debug!(trigger, "auto sync");
                let report = coordinator.sync_all().await;

                if report.retryable() > 0 && coordinator.inner.monitor.state().is_online {
                    retries = retries.saturating_add(1);
                    let delay = coordinator.inner.policy.delay(retries);
                    info!(retry_in_ms = delay.as_millis() as u64, "scheduling retry");
                    retry_at = Some(Instant::now() + delay);
                } else {
                    retries = 0;
                    retry_at = None;
                }
            }
            debug!("auto sync stopped");
        })
    }
}

impl Inner {
    async fn drain(&self) -> SyncReport {
        let snapshot = {
            let mut stores = self.stores.lock().await;
            if let Err(e) = stores.pending.refresh() {
                warn!(error = %e, "could not reload pending queue");
            }
            if let Err(e) = stores.failed.refresh() {
                warn!(error = %e, "could not reload failed list");
            }
            settle_stranded(&mut stores);
            stores
                .pending
                .list()
                .into_iter()
                .filter(|op| !stores.failed.contains(op.id))
                .collect::<Vec<_>>()
        };

        let mut report = SyncReport::default();
        if snapshot.is_empty() {
            debug!("nothing to sync");
            self.finish(report);
            return report;
        }
        info!(pending = snapshot.len(), "sync started");

        let mut ops = snapshot.into_iter();
        {
            let mut replayer = self.replayer.lock().await;
            for op in ops.by_ref() {
                let result = replayer.replay(&op).await;
                let lost = matches!(result, Err(ReplayError::Unreachable(_)));
                self.settle(op, result, &mut report).await;
                if lost {
                    break;
                }
            }
            replayer.end_run().await;
        }

        // The backend is gone; the rest would fail the same way
        let skipped = ops.count();
        if skipped > 0 {
            debug!(skipped, "backend lost, leaving the rest queued");
            report.failed += skipped;
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            "sync finished"
        );
        self.finish(report);
        report
    }

    async fn settle(&self, op: PendingOperation, result: ReplayResult, report: &mut SyncReport) {
        match result {
            Ok(outcome) => {
                debug!(id = %op.id, kind = op.kind(), ?outcome, "replayed");
                let removed = self.stores.lock().await.pending.remove(op.id);
                match removed {
                    Ok(_) => {
                        report.succeeded += 1;
                        self.notify(&op.operation);
                    }
                    Err(e) => {
                        // Stays queued; the backend will answer duplicate next time
                        warn!(id = %op.id, error = %e, "replayed but not removed from queue");
                        report.failed += 1;
                    }
                }
            }
            Err(ReplayError::Unreachable(reason)) => {
                debug!(id = %op.id, %reason, "backend unreachable");
                report.failed += 1;
            }
            Err(ReplayError::Rejected(message)) => {
                warn!(id = %op.id, kind = op.kind(), %message, "operation rejected");
                report.failed += 1;
                if self
                    .dead_letter(&op, FailureReason::Rejected { message })
                    .await
                {
                    report.dead_lettered += 1;
                }
            }
            Err(ReplayError::Transient(reason)) => {
                report.failed += 1;
                let bumped = self
                    .stores
                    .lock()
                    .await
                    .pending
                    .increment_attempts(op.id, Some(&reason));
                match bumped {
                    Ok(Some(attempts)) if self.policy.exhausted(attempts) => {
                        warn!(id = %op.id, attempts, %reason, "giving up on operation");
                        let failure = FailureReason::MaxAttemptsExceeded {
                            attempts,
                            last_error: Some(reason),
                        };
                        if self.dead_letter(&op, failure).await {
                            report.dead_lettered += 1;
                        }
                    }
                    Ok(Some(attempts)) => debug!(id = %op.id, attempts, %reason, "will retry"),
                    Ok(None) => debug!(id = %op.id, "operation left the queue during sync"),
                    Err(e) => warn!(id = %op.id, error = %e, "could not record attempt"),
                }
            }
        }
    }

    /// Moves an operation to the failed list. Returns whether it was recorded.
    async fn dead_letter(&self, op: &PendingOperation, reason: FailureReason) -> bool {
        let mut stores = self.stores.lock().await;
        let current = stores.pending.get(op.id).unwrap_or_else(|| op.clone());
        if let Err(e) = stores.failed.push(current, reason) {
            warn!(id = %op.id, error = %e, "could not record failed operation");
            return false;
        }
        if let Err(e) = stores.pending.remove(op.id) {
            warn!(id = %op.id, error = %e, "failed operation still queued");
        }
        true
    }

    fn notify(&self, operation: &Operation) {
        let Some(note) = operation.notification() else {
            return;
        };
        if let Err(e) = self.notifier.notify(&note) {
            warn!(kind = %note.kind, error = %e, "notification failed");
        }
    }

    /// Ends the run: clears the in-flight slot and publishes the report.
    fn finish(&self, report: SyncReport) {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        self.session.send_modify(|s| {
            s.is_syncing = false;
            s.last_result = Some(report);
        });
    }
}

/// Drops queued operations that already sit on the failed list, left behind
/// when a dead-lettering could not remove them from the queue.
fn settle_stranded(stores: &mut Stores) {
    let stranded: Vec<_> = stores
        .pending
        .list()
        .into_iter()
        .filter(|op| stores.failed.contains(op.id))
        .map(|op| op.id)
        .collect();
    for id in stranded {
        match stores.pending.remove(id) {
            Ok(_) => debug!(%id, "removed queued copy of failed operation"),
            Err(e) => warn!(%id, error = %e, "failed operation still queued"),
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
