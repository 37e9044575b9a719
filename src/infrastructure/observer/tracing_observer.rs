use crate::application::ports::{SyncEvent, SyncObserver};

/// Writes engine events to the `sync::flush` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_event(&self, event: &SyncEvent) {
        match event {
            SyncEvent::FlushStarted { pending } => {
                tracing::info!(target: "sync::flush", pending, "flush started");
            }
            SyncEvent::ActionDelivered {
                action_id,
                kind,
                entity,
                entity_id,
                remote_id,
            } => {
                tracing::info!(
                    target: "sync::flush",
                    action_id = %action_id,
                    kind = %kind,
                    entity = %entity,
                    entity_id = %entity_id,
                    remote_id = remote_id.as_ref().map(|id| id.as_str()),
                    "action delivered"
                );
            }
            SyncEvent::ActionFailed {
                action_id,
                retry_count,
                reason,
            } => {
                tracing::warn!(
                    target: "sync::flush",
                    action_id = %action_id,
                    retry_count,
                    reason = %reason,
                    "action failed"
                );
            }
            SyncEvent::ActionDeadLettered {
                action_id,
                retry_count,
            } => {
                tracing::error!(
                    target: "sync::flush",
                    action_id = %action_id,
                    retry_count,
                    "action dead-lettered"
                );
            }
            SyncEvent::ActionRejected { action_id, reason } => {
                tracing::warn!(
                    target: "sync::flush",
                    action_id = %action_id,
                    reason = %reason,
                    "action rejected by remote store, dropped"
                );
            }
            SyncEvent::PersistenceFailed { action_id, reason } => {
                tracing::error!(
                    target: "sync::flush",
                    action_id = action_id.as_ref().map(|id| id.as_str()),
                    reason = %reason,
                    "queue persistence failed"
                );
            }
            SyncEvent::RebindFailed {
                action_id,
                placeholder,
                remote_id,
                reason,
            } => {
                tracing::error!(
                    target: "sync::flush",
                    action_id = %action_id,
                    placeholder = %placeholder,
                    remote_id = %remote_id,
                    reason = %reason,
                    "placeholder rebind not persisted"
                );
            }
            SyncEvent::FlushCompleted {
                delivered,
                failed,
                remaining,
            } => {
                if *remaining == 0 {
                    tracing::info!(target: "sync::flush", delivered, "all actions synced");
                } else {
                    tracing::info!(
                        target: "sync::flush",
                        delivered,
                        failed,
                        remaining,
                        "flush completed with actions still queued"
                    );
                }
            }
        }
    }
}
