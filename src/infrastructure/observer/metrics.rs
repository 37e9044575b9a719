use crate::application::ports::{SyncEvent, SyncObserver};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcomeStatus {
    Delivered,
    Failed,
    DeadLettered,
    Rejected,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlushMetricsSnapshot {
    pub flushes: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub total_dead_lettered: u64,
    pub total_rejected: u64,
    pub persistence_failures: u64,
    pub consecutive_failure: u64,
    pub last_delivered_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<DeliveryOutcomeStatus>,
    pub last_action_id: Option<String>,
    pub last_retry_count: Option<u32>,
    pub last_reason: Option<String>,
    pub last_remaining: Option<usize>,
}

#[derive(Default, Clone)]
struct LastOutcome {
    outcome: Option<DeliveryOutcomeStatus>,
    action_id: Option<String>,
    retry_count: Option<u32>,
    reason: Option<String>,
    remaining: Option<usize>,
}

/// Delivery counters fed by engine events.
pub struct FlushMetrics {
    flushes: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dead_lettered: AtomicU64,
    rejected: AtomicU64,
    persistence_failures: AtomicU64,
    consecutive_failure: AtomicU64,
    last_delivered_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    last: Mutex<LastOutcome>,
}

impl FlushMetrics {
    pub fn new() -> Self {
        Self {
            flushes: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            persistence_failures: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            last_delivered_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            last: Mutex::new(LastOutcome::default()),
        }
    }

    pub fn snapshot(&self) -> FlushMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| LastOutcome::default());

        FlushMetricsSnapshot {
            flushes: self.flushes.load(Ordering::Relaxed),
            total_delivered: self.delivered.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            total_dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            total_rejected: self.rejected.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            last_delivered_ms: to_option(self.last_delivered_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: last.outcome,
            last_action_id: last.action_id,
            last_retry_count: last.retry_count,
            last_reason: last.reason,
            last_remaining: last.remaining,
        }
    }

    fn record(
        &self,
        outcome: DeliveryOutcomeStatus,
        action_id: &str,
        retry_count: Option<u32>,
        reason: Option<&str>,
    ) {
        if let Ok(mut guard) = self.last.lock() {
            guard.outcome = Some(outcome);
            guard.action_id = Some(action_id.to_string());
            guard.retry_count = retry_count;
            guard.reason = reason.map(str::to_string);
        }
    }
}

impl Default for FlushMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncObserver for FlushMetrics {
    fn on_event(&self, event: &SyncEvent) {
        match event {
            SyncEvent::FlushStarted { .. } => {
                self.flushes.fetch_add(1, Ordering::Relaxed);
            }
            SyncEvent::ActionDelivered { action_id, .. } => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failure.store(0, Ordering::Relaxed);
                self.last_delivered_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.record(
                    DeliveryOutcomeStatus::Delivered,
                    action_id.as_str(),
                    None,
                    None,
                );
            }
            SyncEvent::ActionFailed {
                action_id,
                retry_count,
                reason,
            } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.record(
                    DeliveryOutcomeStatus::Failed,
                    action_id.as_str(),
                    Some(*retry_count),
                    Some(reason.as_str()),
                );
            }
            SyncEvent::ActionDeadLettered {
                action_id,
                retry_count,
            } => {
                self.dead_lettered.fetch_add(1, Ordering::Relaxed);
                self.record(
                    DeliveryOutcomeStatus::DeadLettered,
                    action_id.as_str(),
                    Some(*retry_count),
                    None,
                );
            }
            SyncEvent::ActionRejected { action_id, reason } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                self.record(
                    DeliveryOutcomeStatus::Rejected,
                    action_id.as_str(),
                    None,
                    Some(reason.as_str()),
                );
            }
            SyncEvent::PersistenceFailed { .. } | SyncEvent::RebindFailed { .. } => {
                self.persistence_failures.fetch_add(1, Ordering::Relaxed);
            }
            SyncEvent::FlushCompleted { remaining, .. } => {
                if let Ok(mut guard) = self.last.lock() {
                    guard.remaining = Some(*remaining);
                }
            }
        }
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 {
        None
    } else {
        Some(value)
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ActionId, ActionKind, EntityId, EntityKind};

    fn action_id(value: &str) -> ActionId {
        ActionId::new(value.to_string()).unwrap()
    }

    #[test]
    fn records_delivery_and_failure() {
        let metrics = FlushMetrics::new();

        metrics.on_event(&SyncEvent::FlushStarted { pending: 2 });
        metrics.on_event(&SyncEvent::ActionFailed {
            action_id: action_id("1-a"),
            retry_count: 1,
            reason: "503".into(),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.flushes, 1);
        assert_eq!(snapshot.total_failed, 1);
        assert_eq!(snapshot.consecutive_failure, 1);
        assert_eq!(snapshot.last_outcome, Some(DeliveryOutcomeStatus::Failed));
        assert_eq!(snapshot.last_retry_count, Some(1));
        assert_eq!(snapshot.last_reason.as_deref(), Some("503"));
        assert!(snapshot.last_failure_ms.is_some());

        metrics.on_event(&SyncEvent::ActionDelivered {
            action_id: action_id("1-b"),
            kind: ActionKind::Delete,
            entity: EntityKind::Task,
            entity_id: EntityId::new("t1".into()).unwrap(),
            remote_id: None,
        });
        metrics.on_event(&SyncEvent::FlushCompleted {
            delivered: 1,
            failed: 1,
            remaining: 1,
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_delivered, 1);
        assert_eq!(snapshot.consecutive_failure, 0);
        assert_eq!(snapshot.last_action_id.as_deref(), Some("1-b"));
        assert_eq!(snapshot.last_remaining, Some(1));
    }

    #[test]
    fn counts_dead_letters_and_rejections() {
        let metrics = FlushMetrics::default();
        metrics.on_event(&SyncEvent::ActionDeadLettered {
            action_id: action_id("1-a"),
            retry_count: 3,
        });
        metrics.on_event(&SyncEvent::ActionRejected {
            action_id: action_id("1-b"),
            reason: "not found".into(),
        });
        metrics.on_event(&SyncEvent::PersistenceFailed {
            action_id: None,
            reason: "disk full".into(),
        });
        metrics.on_event(&SyncEvent::RebindFailed {
            action_id: action_id("1-c"),
            placeholder: EntityId::new("temp-1".into()).unwrap(),
            remote_id: EntityId::new("t-1".into()).unwrap(),
            reason: "disk full".into(),
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_dead_lettered, 1);
        assert_eq!(snapshot.total_rejected, 1);
        assert_eq!(snapshot.persistence_failures, 2);
        assert_eq!(snapshot.last_outcome, Some(DeliveryOutcomeStatus::Rejected));
    }
}
