use crate::domain::value_objects::{ActionId, ActionKind, EntityId, EntityKind};
use serde::Serialize;

/// Structured events emitted by the flush loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    FlushStarted {
        pending: usize,
    },
    ActionDelivered {
        action_id: ActionId,
        kind: ActionKind,
        entity: EntityKind,
        entity_id: EntityId,
        remote_id: Option<EntityId>,
    },
    ActionFailed {
        action_id: ActionId,
        retry_count: u32,
        reason: String,
    },
    ActionDeadLettered {
        action_id: ActionId,
        retry_count: u32,
    },
    ActionRejected {
        action_id: ActionId,
        reason: String,
    },
    PersistenceFailed {
        action_id: Option<ActionId>,
        reason: String,
    },
    /// A create was delivered but queued records still name its placeholder on disk.
    RebindFailed {
        action_id: ActionId,
        placeholder: EntityId,
        remote_id: EntityId,
        reason: String,
    },
    FlushCompleted {
        delivered: usize,
        failed: usize,
        remaining: usize,
    },
}

pub trait SyncObserver: Send + Sync {
    fn on_event(&self, event: &SyncEvent);
}

/// Fans one event out to several observers.
impl<T: SyncObserver> SyncObserver for Vec<T> {
    fn on_event(&self, event: &SyncEvent) {
        for observer in self {
            observer.on_event(event);
        }
    }
}

impl<T: SyncObserver + ?Sized> SyncObserver for std::sync::Arc<T> {
    fn on_event(&self, event: &SyncEvent) {
        (**self).on_event(event);
    }
}
