use crate::domain::value_objects::{ActionPayload, EntityId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Remote shape of a task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: EntityId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Remote shape of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub list_id: EntityId,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changed subset of a task's editable fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskChanges {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none() && self.due_date.is_none()
    }

    pub fn into_payload(self) -> ActionPayload {
        let mut payload = ActionPayload::default();
        if let Some(title) = self.title {
            payload = payload.with("title", title);
        }
        if let Some(completed) = self.completed {
            payload = payload.with("completed", completed);
        }
        if let Some(due_date) = self.due_date {
            let value = due_date
                .map(|date| serde_json::Value::String(date.to_string()))
                .unwrap_or(serde_json::Value::Null);
            payload = payload.with("due_date", value);
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_contains_only_changed_fields() {
        let payload = TaskChanges::completed(true).into_payload();
        assert_eq!(payload.as_map().len(), 1);
        assert_eq!(payload.get("completed"), Some(&json!(true)));
    }

    #[test]
    fn clearing_due_date_writes_null() {
        let changes = TaskChanges {
            due_date: Some(None),
            ..TaskChanges::default()
        };
        assert!(!changes.is_empty());
        assert_eq!(changes.into_payload().get("due_date"), Some(&json!(null)));
    }

    #[test]
    fn due_date_is_iso_formatted() {
        let changes = TaskChanges {
            due_date: Some(NaiveDate::from_ymd_opt(2026, 10, 19)),
            ..TaskChanges::default()
        };
        assert_eq!(changes.into_payload().get("due_date"), Some(&json!("2026-10-19")));
    }
}
