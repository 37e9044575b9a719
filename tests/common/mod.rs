#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tasksync::application::services::{Dispatcher, QueueStore, RetryPolicy, SyncScheduler};
use tasksync::infrastructure::connectivity::{ConnectivityMonitor, FlagProbe};
use tasksync::infrastructure::storage::MemoryKeyValueStore;
use tasksync::{
    ActionKind, ActionPayload, EntityId, EntityKind, KeyValueStore, RemoteError, RemoteStore,
    SyncError, SyncEvent, SyncObserver,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub kind: ActionKind,
    pub entity: EntityKind,
    pub id: Option<EntityId>,
    pub fields: Option<ActionPayload>,
}

/// In-memory remote store with scripted failures and call recording.
#[derive(Default)]
pub struct FakeRemote {
    next_id: AtomicU64,
    latency: Mutex<Option<Duration>>,
    scripted: Mutex<VecDeque<RemoteError>>,
    always: Mutex<Option<RemoteError>>,
    calls: Mutex<Vec<RemoteCall>>,
    rows: Mutex<HashMap<String, Map<String, Value>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// The next calls fail with these errors, in order.
    pub fn fail_next(&self, errors: impl IntoIterator<Item = RemoteError>) {
        self.scripted.lock().unwrap().extend(errors);
    }

    pub fn fail_always(&self, error: Option<RemoteError>) {
        *self.always.lock().unwrap() = error;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn row(&self, id: &str) -> Option<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .map(Value::Object)
    }

    pub fn insert_row(&self, id: &str, fields: Value) {
        let Value::Object(mut map) = fields else {
            panic!("row must be an object");
        };
        map.insert("id".into(), Value::String(id.into()));
        self.rows.lock().unwrap().insert(id.into(), map);
    }

    async fn call(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.scripted.lock().unwrap().pop_front() {
            return Err(error);
        }
        if let Some(error) = self.always.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn create(
        &self,
        entity: &EntityKind,
        fields: &ActionPayload,
    ) -> Result<EntityId, RemoteError> {
        self.call(RemoteCall {
            kind: ActionKind::Create,
            entity: entity.clone(),
            id: None,
            fields: Some(fields.clone()),
        })
        .await?;

        let prefix = match entity {
            EntityKind::TaskList => "l",
            _ => "t",
        };
        let id = format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let now = Value::String(Utc::now().to_rfc3339());
        let mut row = fields.as_map().clone();
        row.insert("id".into(), Value::String(id.clone()));
        row.insert("created_at".into(), now.clone());
        row.insert("updated_at".into(), now);
        self.rows.lock().unwrap().insert(id.clone(), row);

        Ok(EntityId::new(id).unwrap())
    }

    async fn update(
        &self,
        entity: &EntityKind,
        id: &EntityId,
        fields: &ActionPayload,
    ) -> Result<(), RemoteError> {
        self.call(RemoteCall {
            kind: ActionKind::Update,
            entity: entity.clone(),
            id: Some(id.clone()),
            fields: Some(fields.clone()),
        })
        .await?;

        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(id.as_str()) else {
            return Err(RemoteError::Permanent(format!("{entity} {id} not found")));
        };
        for (key, value) in fields.as_map() {
            row.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete(&self, entity: &EntityKind, id: &EntityId) -> Result<(), RemoteError> {
        self.call(RemoteCall {
            kind: ActionKind::Delete,
            entity: entity.clone(),
            id: Some(id.clone()),
            fields: None,
        })
        .await?;

        match self.rows.lock().unwrap().remove(id.as_str()) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Permanent(format!("{entity} {id} not found"))),
        }
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_event(&self, event: &SyncEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Reads succeed, writes fail.
#[derive(Default)]
pub struct ReadOnlyKeyValueStore;

#[async_trait]
impl KeyValueStore for ReadOnlyKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, SyncError> {
        Ok(None)
    }

    async fn set(&self, key: &str, _value: &str) -> Result<(), SyncError> {
        Err(SyncError::Persistence(format!("slot '{key}' is read-only")))
    }

    async fn remove(&self, key: &str) -> Result<(), SyncError> {
        Err(SyncError::Persistence(format!("slot '{key}' is read-only")))
    }
}

pub struct Harness {
    pub remote: Arc<FakeRemote>,
    pub probe: Arc<FlagProbe>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub queue: Arc<QueueStore>,
    pub observer: Arc<RecordingObserver>,
    pub scheduler: Arc<SyncScheduler>,
}

impl Harness {
    pub fn new(online: bool) -> Self {
        Self::with_storage(online, Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn with_storage(online: bool, storage: Arc<dyn KeyValueStore>) -> Self {
        let remote = FakeRemote::new();
        let probe = Arc::new(FlagProbe::new(online));
        let monitor = Arc::new(ConnectivityMonitor::new(probe.clone()));
        let queue = Arc::new(QueueStore::new(storage, "sync_queue"));
        let observer = Arc::new(RecordingObserver::default());
        let scheduler = Arc::new(SyncScheduler::new(
            queue.clone(),
            Dispatcher::new(remote.clone(), Duration::from_secs(10)),
            RetryPolicy::new(3),
            monitor.clone(),
            observer.clone(),
            Duration::from_secs(5),
        ));

        Self {
            remote,
            probe,
            monitor,
            queue,
            observer,
            scheduler,
        }
    }

    pub fn go_online(&self) {
        self.probe.set_online(true);
        self.monitor.report(tasksync::ConnectivityStatus::Online);
    }

    pub fn go_offline(&self) {
        self.probe.set_online(false);
        self.monitor.report(tasksync::ConnectivityStatus::Offline);
    }
}

pub fn entity_id(value: &str) -> EntityId {
    EntityId::new(value.to_string()).unwrap()
}
