use crate::domain::value_objects::{ActionId, ActionKind, ActionPayload, EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// A mutation waiting to be applied to the remote store, before the queue assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInput {
    pub kind: ActionKind,
    pub entity: EntityKind,
    pub entity_id: EntityId,
    pub payload: ActionPayload,
}

impl ActionInput {
    pub fn new(
        kind: ActionKind,
        entity: EntityKind,
        entity_id: EntityId,
        payload: ActionPayload,
    ) -> Self {
        Self {
            kind,
            entity,
            entity_id,
            payload,
        }
    }

    pub fn create(entity: EntityKind, entity_id: EntityId, payload: ActionPayload) -> Self {
        Self::new(ActionKind::Create, entity, entity_id, payload)
    }

    pub fn update(entity: EntityKind, entity_id: EntityId, payload: ActionPayload) -> Self {
        Self::new(ActionKind::Update, entity, entity_id, payload)
    }

    pub fn delete(entity: EntityKind, entity_id: EntityId) -> Self {
        Self::new(ActionKind::Delete, entity, entity_id, ActionPayload::default())
    }
}

/// Stored form of a queued action. Field names match the persisted queue layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub entity: EntityKind,
    #[serde(rename = "entityId")]
    pub entity_id: EntityId,
    #[serde(rename = "data", default)]
    pub payload: ActionPayload,
    #[serde(rename = "timestamp")]
    pub enqueued_at: i64,
    #[serde(rename = "retries", default)]
    pub retry_count: u32,
}

impl ActionRecord {
    pub fn from_input(input: ActionInput, id: ActionId, enqueued_at: i64) -> Self {
        Self {
            id,
            kind: input.kind,
            entity: input.entity,
            entity_id: input.entity_id,
            payload: input.payload,
            enqueued_at,
            retry_count: 0,
        }
    }

    pub fn is_dead_lettered(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }

    /// Whether the record targets `id` or carries it as a field value.
    pub fn references(&self, id: &EntityId) -> bool {
        &self.entity_id == id || self.payload.references(id.as_str())
    }

    /// Points the record at `remote` wherever it referenced `placeholder`.
    pub fn rebind(&mut self, placeholder: &EntityId, remote: &EntityId) -> bool {
        let mut changed = false;
        if &self.entity_id == placeholder {
            self.entity_id = remote.clone();
            changed = true;
        }
        if self
            .payload
            .replace_references(placeholder.as_str(), remote.as_str())
        {
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ActionRecord {
        ActionRecord::from_input(
            ActionInput::create(
                EntityKind::Task,
                EntityId::new("temp-1".into()).unwrap(),
                ActionPayload::default().with("title", "Buy milk"),
            ),
            ActionId::new("1700000000000-abcdefghi".into()).unwrap(),
            1_700_000_000_000,
        )
    }

    #[test]
    fn serializes_to_queue_layout() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1700000000000-abcdefghi",
                "type": "create",
                "entity": "task",
                "entityId": "temp-1",
                "data": { "title": "Buy milk" },
                "timestamp": 1_700_000_000_000i64,
                "retries": 0
            })
        );
    }

    #[test]
    fn reads_record_without_data_or_retries() {
        let record: ActionRecord = serde_json::from_value(json!({
            "id": "1-a",
            "type": "delete",
            "entity": "task_list",
            "entityId": "l1",
            "timestamp": 1
        }))
        .unwrap();
        assert_eq!(record.kind, ActionKind::Delete);
        assert_eq!(record.retry_count, 0);
        assert!(record.payload.is_empty());
    }

    #[test]
    fn dead_letter_threshold_is_inclusive() {
        let mut record = sample();
        record.retry_count = 2;
        assert!(!record.is_dead_lettered(3));
        record.retry_count = 3;
        assert!(record.is_dead_lettered(3));
    }

    #[test]
    fn rebind_rewrites_target_and_references() {
        let placeholder = EntityId::new("temp-1".into()).unwrap();
        let remote = EntityId::new("t-99".into()).unwrap();
        let mut record = sample();
        assert!(record.references(&placeholder));
        assert!(record.rebind(&placeholder, &remote));
        assert!(!record.references(&placeholder));
        assert!(record.references(&remote));
        assert_eq!(record.entity_id, remote);
        assert!(!record.rebind(&placeholder, &remote));
    }
}
