use crate::application::services::sync_scheduler::SyncScheduler;
use crate::domain::entities::{ActionInput, ActionRecord, TaskChanges};
use crate::domain::value_objects::{ActionPayload, EntityId, EntityKind};
use crate::shared::error::SyncError;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

/// UI-facing task and task-list operations. Every mutation goes through the sync queue.
pub struct TaskMutations {
    scheduler: Arc<SyncScheduler>,
}

impl TaskMutations {
    pub fn new(scheduler: Arc<SyncScheduler>) -> Self {
        Self { scheduler }
    }

    /// Queues a new list under a placeholder id and returns that id.
    pub async fn add_task_list(&self, name: &str) -> Result<EntityId, SyncError> {
        let name = required(name, "Task list name")?;
        let id = EntityId::placeholder();
        self.scheduler
            .enqueue(ActionInput::create(
                EntityKind::TaskList,
                id.clone(),
                ActionPayload::default().with("name", name),
            ))
            .await?;
        Ok(id)
    }

    pub async fn delete_task_list(&self, id: &EntityId) -> Result<ActionRecord, SyncError> {
        self.scheduler
            .enqueue(ActionInput::delete(EntityKind::TaskList, id.clone()))
            .await
    }

    /// Queues a new task under a placeholder id and returns that id.
    pub async fn add_task(&self, list_id: &EntityId, title: &str) -> Result<EntityId, SyncError> {
        let title = required(title, "Task title")?;
        let id = EntityId::placeholder();
        self.scheduler
            .enqueue(ActionInput::create(
                EntityKind::Task,
                id.clone(),
                ActionPayload::default()
                    .with("list_id", list_id.as_str())
                    .with("title", title)
                    .with("completed", false),
            ))
            .await?;
        Ok(id)
    }

    pub async fn update_task(
        &self,
        id: &EntityId,
        changes: TaskChanges,
    ) -> Result<ActionRecord, SyncError> {
        if changes.is_empty() {
            return Err(SyncError::InvalidInput(format!(
                "No changes given for task {id}"
            )));
        }
        if let Some(title) = &changes.title {
            required(title, "Task title")?;
        }

        let payload = changes.into_payload().with("updated_at", timestamp());
        self.scheduler
            .enqueue(ActionInput::update(EntityKind::Task, id.clone(), payload))
            .await
    }

    pub async fn toggle_task(
        &self,
        id: &EntityId,
        completed: bool,
    ) -> Result<ActionRecord, SyncError> {
        self.update_task(id, TaskChanges::completed(completed)).await
    }

    pub async fn delete_task(&self, id: &EntityId) -> Result<ActionRecord, SyncError> {
        self.scheduler
            .enqueue(ActionInput::delete(EntityKind::Task, id.clone()))
            .await
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, SyncError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SyncError::InvalidInput(format!("{field} cannot be empty")));
    }
    Ok(trimmed)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
