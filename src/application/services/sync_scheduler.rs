use crate::application::ports::{SyncEvent, SyncObserver};
use crate::application::services::dispatcher::{DispatchOutcome, Dispatcher};
use crate::application::services::queue_store::QueueStore;
use crate::application::services::retry_policy::RetryPolicy;
use crate::domain::entities::{ActionInput, ActionRecord};
use crate::domain::value_objects::{ActionKind, ConnectivityStatus, EntityId};
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::SyncError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Observable engine state for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub is_online: bool,
    pub pending: usize,
    pub dead_lettered: usize,
    pub last_flush_at: Option<i64>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Startup,
    Enqueue,
    Reconnect,
    Interval,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub passes: usize,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub rejected: usize,
    pub dead_lettered: usize,
    /// Held back because an entity they reference has not been created remotely yet.
    pub deferred: usize,
    pub persistence_errors: usize,
    pub remaining: usize,
}

impl FlushReport {
    fn absorb(&mut self, pass: FlushReport) {
        self.passes += pass.passes;
        self.attempted += pass.attempted;
        self.delivered += pass.delivered;
        self.failed += pass.failed;
        self.rejected += pass.rejected;
        self.dead_lettered += pass.dead_lettered;
        self.deferred += pass.deferred;
        self.persistence_errors += pass.persistence_errors;
        self.remaining = pass.remaining;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    Completed(FlushReport),
    /// Another flush was in flight; it will re-check the queue when it finishes.
    Coalesced,
    SkippedOffline,
}

/// Decides when the queue is flushed and guarantees a single flush at a time.
pub struct SyncScheduler {
    queue: Arc<QueueStore>,
    dispatcher: Dispatcher,
    policy: RetryPolicy,
    connectivity: Arc<ConnectivityMonitor>,
    observer: Arc<dyn SyncObserver>,
    interval: Duration,
    flushing: AtomicBool,
    rerun: AtomicBool,
    wake: Notify,
    status: watch::Sender<SyncStatus>,
}

impl SyncScheduler {
    pub fn new(
        queue: Arc<QueueStore>,
        dispatcher: Dispatcher,
        policy: RetryPolicy,
        connectivity: Arc<ConnectivityMonitor>,
        observer: Arc<dyn SyncObserver>,
        interval: Duration,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus {
            is_syncing: false,
            is_online: connectivity.is_online(),
            pending: 0,
            dead_lettered: 0,
            last_flush_at: None,
            last_error: None,
        });

        Self {
            queue,
            dispatcher,
            policy,
            connectivity,
            observer,
            interval,
            flushing: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
            wake: Notify::new(),
            status,
        }
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::Acquire)
    }

    /// Persists the action, then wakes the background loop so it is flushed right away.
    pub async fn enqueue(&self, input: ActionInput) -> Result<ActionRecord, SyncError> {
        match self.queue.enqueue(input).await {
            Ok(record) => {
                self.refresh_status().await;
                self.wake.notify_one();
                Ok(record)
            }
            Err(err) => {
                self.status
                    .send_modify(|status| status.last_error = Some(err.to_string()));
                Err(err)
            }
        }
    }

    pub async fn pending(&self) -> Result<Vec<ActionRecord>, SyncError> {
        self.queue.list_pending(self.policy.max_retries()).await
    }

    pub async fn dead_letters(&self) -> Result<Vec<ActionRecord>, SyncError> {
        self.queue
            .list_dead_lettered(self.policy.max_retries())
            .await
    }

    /// Runs a flush unless one is already in flight or the host is offline.
    pub async fn flush(&self, trigger: FlushTrigger) -> FlushOutcome {
        if !self.connectivity.is_online() {
            tracing::debug!(target: "sync::flush", ?trigger, "offline, flush skipped");
            return FlushOutcome::SkippedOffline;
        }

        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.rerun.store(true, Ordering::Release);
            tracing::debug!(target: "sync::flush", ?trigger, "flush in flight, trigger coalesced");
            return FlushOutcome::Coalesced;
        }

        let mut report = FlushReport::default();
        loop {
            self.status.send_modify(|status| status.is_syncing = true);

            loop {
                self.rerun.store(false, Ordering::Release);
                report.absorb(self.run_pass().await);
                if !self.rerun.load(Ordering::Acquire) || !self.connectivity.is_online() {
                    break;
                }
            }

            self.flushing.store(false, Ordering::Release);
            let clean = report.persistence_errors == 0 && report.dead_lettered == 0;
            self.status.send_modify(|status| {
                status.is_syncing = false;
                status.last_flush_at = Some(Utc::now().timestamp_millis());
                if clean {
                    status.last_error = None;
                }
            });
            self.refresh_status().await;

            // A trigger can land between the last pass and releasing the guard.
            if !self.rerun.load(Ordering::Acquire) || !self.connectivity.is_online() {
                break;
            }
            if self
                .flushing
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                break;
            }
        }

        FlushOutcome::Completed(report)
    }

    /// One pass over a snapshot of the pending actions, in queue order.
    async fn run_pass(&self) -> FlushReport {
        let mut report = FlushReport {
            passes: 1,
            ..FlushReport::default()
        };

        let records = match self.queue.snapshot().await {
            Ok(records) => records,
            Err(err) => {
                report.persistence_errors += 1;
                self.persistence_failed(None, &err);
                return report;
            }
        };
        let max_retries = self.policy.max_retries();

        // Entities whose create has not reached the remote store. Anything that names them
        // waits, so an update or child never overtakes the create it depends on.
        let mut uncreated: HashSet<EntityId> = records
            .iter()
            .filter(|record| {
                record.kind == ActionKind::Create && record.is_dead_lettered(max_retries)
            })
            .map(|record| record.entity_id.clone())
            .collect();
        let pending: Vec<ActionRecord> = records
            .into_iter()
            .filter(|record| !record.is_dead_lettered(max_retries))
            .collect();
        if pending.is_empty() {
            return report;
        }

        self.observer.on_event(&SyncEvent::FlushStarted {
            pending: pending.len(),
        });

        let mut rebound: HashMap<EntityId, EntityId> = HashMap::new();
        let mut unsaved_rebinds: Vec<(ActionRecord, EntityId, SyncError)> = Vec::new();
        for mut record in pending {
            if !self.connectivity.is_online() {
                tracing::debug!(target: "sync::flush", "connectivity lost, deferring rest of pass");
                break;
            }
            for (placeholder, remote) in &rebound {
                record.rebind(placeholder, remote);
            }

            if let Some(blocker) = uncreated.iter().find(|id| record.references(id)).cloned() {
                report.deferred += 1;
                if record.kind == ActionKind::Create {
                    uncreated.insert(record.entity_id.clone());
                }
                tracing::debug!(
                    target: "sync::flush",
                    action_id = %record.id,
                    waiting_on = %blocker,
                    "action deferred until its dependency is created"
                );
                continue;
            }

            report.attempted += 1;
            match self.dispatcher.apply(&record).await {
                DispatchOutcome::Delivered { remote_id } => {
                    report.delivered += 1;
                    if let Err(err) = self.queue.remove(&record.id).await {
                        report.persistence_errors += 1;
                        self.persistence_failed(Some(&record), &err);
                    }
                    self.observer.on_event(&SyncEvent::ActionDelivered {
                        action_id: record.id.clone(),
                        kind: record.kind,
                        entity: record.entity.clone(),
                        entity_id: record.entity_id.clone(),
                        remote_id: remote_id.clone(),
                    });

                    if let (ActionKind::Create, Some(remote)) = (record.kind, remote_id) {
                        if remote != record.entity_id {
                            if let Err(err) =
                                self.queue.rebind_entity(&record.entity_id, &remote).await
                            {
                                unsaved_rebinds.push((record.clone(), remote.clone(), err));
                            }
                            rebound.insert(record.entity_id.clone(), remote);
                        }
                    }
                }
                DispatchOutcome::Failed(err) if err.is_permanent() => {
                    report.rejected += 1;
                    if record.kind == ActionKind::Create {
                        uncreated.insert(record.entity_id.clone());
                    }
                    if let Err(remove_err) = self.queue.remove(&record.id).await {
                        report.persistence_errors += 1;
                        self.persistence_failed(Some(&record), &remove_err);
                    }
                    self.observer.on_event(&SyncEvent::ActionRejected {
                        action_id: record.id.clone(),
                        reason: err.to_string(),
                    });
                }
                DispatchOutcome::Failed(err) => {
                    report.failed += 1;
                    if record.kind == ActionKind::Create {
                        uncreated.insert(record.entity_id.clone());
                    }
                    match self.queue.increment_retry(&record.id).await {
                        Ok(Some(retry_count)) => {
                            self.observer.on_event(&SyncEvent::ActionFailed {
                                action_id: record.id.clone(),
                                retry_count,
                                reason: err.to_string(),
                            });
                            if !self.policy.should_retry(retry_count) {
                                report.dead_lettered += 1;
                                self.observer.on_event(&SyncEvent::ActionDeadLettered {
                                    action_id: record.id.clone(),
                                    retry_count,
                                });
                                let dead = SyncError::DeadLettered {
                                    action_id: record.id.to_string(),
                                    retries: retry_count,
                                };
                                self.status
                                    .send_modify(|status| status.last_error = Some(dead.to_string()));
                            }
                        }
                        // Cleared while the remote call was in flight.
                        Ok(None) => {}
                        Err(store_err) => {
                            report.persistence_errors += 1;
                            self.persistence_failed(Some(&record), &store_err);
                        }
                    }
                }
            }
        }

        // One more attempt once the pass is done, then the loss is reported.
        for (record, remote, first_err) in unsaved_rebinds {
            tracing::warn!(
                target: "sync::queue",
                placeholder = %record.entity_id,
                remote_id = %remote,
                error = %first_err,
                "rebind write failed, retrying"
            );
            if let Err(err) = self.queue.rebind_entity(&record.entity_id, &remote).await {
                report.persistence_errors += 1;
                self.observer.on_event(&SyncEvent::RebindFailed {
                    action_id: record.id.clone(),
                    placeholder: record.entity_id.clone(),
                    remote_id: remote,
                    reason: err.to_string(),
                });
                self.status
                    .send_modify(|status| status.last_error = Some(err.to_string()));
            }
        }

        report.remaining = match self.queue.len().await {
            Ok(len) => len,
            Err(err) => {
                report.persistence_errors += 1;
                self.persistence_failed(None, &err);
                0
            }
        };
        self.observer.on_event(&SyncEvent::FlushCompleted {
            delivered: report.delivered,
            failed: report.failed + report.rejected,
            remaining: report.remaining,
        });
        report
    }

    fn persistence_failed(&self, record: Option<&ActionRecord>, err: &SyncError) {
        self.observer.on_event(&SyncEvent::PersistenceFailed {
            action_id: record.map(|record| record.id.clone()),
            reason: err.to_string(),
        });
        self.status
            .send_modify(|status| status.last_error = Some(err.to_string()));
    }

    async fn refresh_status(&self) {
        let is_online = self.connectivity.is_online();
        match self.queue.snapshot().await {
            Ok(records) => {
                let max_retries = self.policy.max_retries();
                let dead_lettered = records
                    .iter()
                    .filter(|record| record.is_dead_lettered(max_retries))
                    .count();
                self.status.send_modify(|status| {
                    status.is_online = is_online;
                    status.pending = records.len() - dead_lettered;
                    status.dead_lettered = dead_lettered;
                });
            }
            Err(err) => {
                self.status.send_modify(|status| {
                    status.is_online = is_online;
                    status.last_error = Some(err.to_string());
                });
            }
        }
    }

    /// Spawns the trigger loop: enqueue wake-ups, reconnects and the interval timer.
    pub fn start(self: &Arc<Self>) -> SchedulerHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let scheduler = Arc::clone(self);
        let task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });
        SchedulerHandle { shutdown, task }
    }

    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut connectivity = self.connectivity.watch();
        let initial = *connectivity.borrow_and_update();
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.refresh_status().await;
        if initial.is_online() {
            self.flush(FlushTrigger::Startup).await;
        }

        loop {
            // The selected branch runs to completion before shutdown is looked at again,
            // so an in-flight flush is never cut short.
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    // The monitor only publishes real transitions, so reading Online here means
                    // the host came back, even if an Offline in between was never observed.
                    let status = *connectivity.borrow_and_update();
                    self.status.send_modify(|s| s.is_online = status.is_online());
                    if status == ConnectivityStatus::Online {
                        self.flush(FlushTrigger::Reconnect).await;
                    }
                }
                _ = self.wake.notified() => {
                    self.flush(FlushTrigger::Enqueue).await;
                }
                _ = ticker.tick() => {
                    if self.connectivity.is_online() && self.status().pending > 0 {
                        self.flush(FlushTrigger::Interval).await;
                    }
                }
            }
        }

        tracing::debug!(target: "sync::flush", "scheduler loop stopped");
    }
}

/// Handle for the background loop started by [`SyncScheduler::start`].
///
/// Dropping the handle also stops the loop once any in-flight flush finishes.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the timer and waits for the loop, letting an in-flight flush complete.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::warn!(target: "sync::flush", error = %err, "scheduler loop ended abnormally");
        }
    }
}
