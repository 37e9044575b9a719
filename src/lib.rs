//! Offline mutation queue and reconciliation engine for a task-list client.
//!
//! Edits are recorded as durable actions while the client is offline and replayed against
//! the remote store, in order, once connectivity returns.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
mod state;

pub use application::ports::{
    ConnectivityProbe, KeyValueStore, RemoteError, RemoteStore, SyncEvent, SyncObserver,
};
pub use application::services::{
    FlushOutcome, FlushReport, FlushTrigger, QueueStore, RetryPolicy, SyncScheduler, SyncStatus,
    TaskMutations,
};
pub use domain::entities::{ActionInput, ActionRecord, Task, TaskChanges, TaskList};
pub use domain::value_objects::{
    ActionId, ActionKind, ActionPayload, ConnectivityStatus, EntityId, EntityKind,
};
pub use shared::logging::init_logging;
pub use shared::{Result, SyncConfig, SyncError};
pub use state::SyncEngine;
