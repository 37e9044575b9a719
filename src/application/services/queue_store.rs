use crate::application::ports::KeyValueStore;
use crate::domain::entities::{ActionInput, ActionRecord};
use crate::domain::value_objects::{ActionId, EntityId};
use crate::shared::error::SyncError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Durable FIFO of pending actions, stored as one JSON array under a single slot.
///
/// Every operation reads, modifies and writes the whole collection while holding `gate`, so
/// two operations never interleave their reads and writes.
pub struct QueueStore {
    storage: Arc<dyn KeyValueStore>,
    slot: String,
    gate: Mutex<()>,
}

impl QueueStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub async fn enqueue(&self, input: ActionInput) -> Result<ActionRecord, SyncError> {
        let _guard = self.gate.lock().await;
        let mut queue = self.load().await?;

        let mut id = ActionId::generate();
        while queue.iter().any(|record| record.id == id) {
            id = ActionId::generate();
        }

        let now = Utc::now().timestamp_millis();
        let enqueued_at = queue
            .last()
            .map(|last| now.max(last.enqueued_at))
            .unwrap_or(now);

        let record = ActionRecord::from_input(input, id, enqueued_at);
        queue.push(record.clone());
        self.save(&queue).await?;

        tracing::debug!(
            target: "sync::queue",
            action_id = %record.id,
            kind = %record.kind,
            entity = %record.entity,
            entity_id = %record.entity_id,
            queued = queue.len(),
            "action enqueued"
        );
        Ok(record)
    }

    /// Removes the record if present. Removing an unknown id is not an error.
    pub async fn remove(&self, id: &ActionId) -> Result<(), SyncError> {
        let _guard = self.gate.lock().await;
        let mut queue = self.load().await?;
        let before = queue.len();
        queue.retain(|record| &record.id != id);
        if queue.len() != before {
            self.save(&queue).await?;
        }
        Ok(())
    }

    /// Bumps the retry count by one. Returns the new count, or `None` when the id is unknown.
    pub async fn increment_retry(&self, id: &ActionId) -> Result<Option<u32>, SyncError> {
        let _guard = self.gate.lock().await;
        let mut queue = self.load().await?;
        let Some(record) = queue.iter_mut().find(|record| &record.id == id) else {
            return Ok(None);
        };
        record.retry_count = record.retry_count.saturating_add(1);
        let retry_count = record.retry_count;
        self.save(&queue).await?;
        Ok(Some(retry_count))
    }

    pub async fn list_pending(&self, max_retries: u32) -> Result<Vec<ActionRecord>, SyncError> {
        Ok(self
            .snapshot()
            .await?
            .into_iter()
            .filter(|record| !record.is_dead_lettered(max_retries))
            .collect())
    }

    pub async fn list_dead_lettered(
        &self,
        max_retries: u32,
    ) -> Result<Vec<ActionRecord>, SyncError> {
        Ok(self
            .snapshot()
            .await?
            .into_iter()
            .filter(|record| record.is_dead_lettered(max_retries))
            .collect())
    }

    /// All records, pending and dead-lettered, in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<ActionRecord>, SyncError> {
        let _guard = self.gate.lock().await;
        self.load().await
    }

    pub async fn len(&self) -> Result<usize, SyncError> {
        Ok(self.snapshot().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len().await? == 0)
    }

    pub async fn clear(&self) -> Result<(), SyncError> {
        let _guard = self.gate.lock().await;
        self.save(&[]).await
    }

    /// Retargets queued records from a placeholder to the id the remote store assigned.
    pub async fn rebind_entity(
        &self,
        placeholder: &EntityId,
        remote: &EntityId,
    ) -> Result<usize, SyncError> {
        let _guard = self.gate.lock().await;
        let mut queue = self.load().await?;
        let rewritten = queue
            .iter_mut()
            .map(|record| record.rebind(placeholder, remote))
            .filter(|changed| *changed)
            .count();
        if rewritten > 0 {
            self.save(&queue).await?;
            tracing::debug!(
                target: "sync::queue",
                placeholder = %placeholder,
                remote_id = %remote,
                rewritten,
                "placeholder rebound to remote id"
            );
        }
        Ok(rewritten)
    }

    async fn load(&self) -> Result<Vec<ActionRecord>, SyncError> {
        let Some(raw) = self.storage.get(&self.slot).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|err| {
            SyncError::Persistence(format!("queue slot '{}' is unreadable: {err}", self.slot))
        })
    }

    async fn save(&self, queue: &[ActionRecord]) -> Result<(), SyncError> {
        let raw = serde_json::to_string(queue)?;
        self.storage.set(&self.slot, &raw).await.inspect_err(|err| {
            tracing::error!(
                target: "sync::queue",
                slot = %self.slot,
                error = %err,
                "failed to persist sync queue"
            );
        })
    }
}
