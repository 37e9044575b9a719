use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of remote entity an action targets.
///
/// Unknown kinds are kept verbatim so a queue written by a newer client still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Task,
    TaskList,
    Other(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Task => "task",
            EntityKind::TaskList => "task_list",
            EntityKind::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for EntityKind {
    fn from(value: &str) -> Self {
        match value {
            "task" => EntityKind::Task,
            "task_list" => EntityKind::TaskList,
            other => EntityKind::Other(other.to_string()),
        }
    }
}

impl From<String> for EntityKind {
    fn from(value: String) -> Self {
        EntityKind::from(value.as_str())
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
