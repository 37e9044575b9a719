use crate::application::ports::{ConnectivityProbe, RemoteStore, SyncObserver};
use crate::application::services::{
    Dispatcher, FlushOutcome, FlushTrigger, QueueStore, RetryPolicy, SchedulerHandle,
    SyncScheduler, SyncStatus, TaskMutations,
};
use crate::domain::entities::ActionRecord;
use crate::domain::value_objects::ConnectivityStatus;
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::infrastructure::observer::{FlushMetrics, FlushMetricsSnapshot, TracingObserver};
use crate::infrastructure::storage::SqliteKeyValueStore;
use crate::shared::config::SyncConfig;
use crate::shared::error::SyncError;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Fully wired offline sync engine.
pub struct SyncEngine {
    config: SyncConfig,
    storage: SqliteKeyValueStore,
    queue: Arc<QueueStore>,
    connectivity: Arc<ConnectivityMonitor>,
    scheduler: Arc<SyncScheduler>,
    metrics: Arc<FlushMetrics>,
    mutations: TaskMutations,
    handle: Mutex<Option<SchedulerHandle>>,
}

impl SyncEngine {
    /// Opens the SQLite-backed queue and wires the scheduler against `remote`.
    ///
    /// The background loop starts immediately when `auto_sync` is enabled.
    pub async fn open(
        config: SyncConfig,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::Configuration)?;

        let storage = SqliteKeyValueStore::connect(&config.storage.database_url).await?;
        let queue = Arc::new(QueueStore::new(
            Arc::new(storage.clone()),
            config.storage.queue_slot.clone(),
        ));
        let connectivity = Arc::new(ConnectivityMonitor::new(probe));
        let metrics = Arc::new(FlushMetrics::new());
        let observers: Vec<Arc<dyn SyncObserver>> = vec![
            Arc::new(TracingObserver) as Arc<dyn SyncObserver>,
            metrics.clone() as Arc<dyn SyncObserver>,
        ];

        let scheduler = Arc::new(SyncScheduler::new(
            queue.clone(),
            Dispatcher::new(remote, config.scheduler.dispatch_timeout()),
            RetryPolicy::new(config.scheduler.max_retries),
            connectivity.clone(),
            Arc::new(observers),
            config.scheduler.flush_interval(),
        ));
        let mutations = TaskMutations::new(scheduler.clone());

        let handle = config.scheduler.auto_sync.then(|| scheduler.start());

        tracing::info!(
            target: "sync::flush",
            database_url = %config.storage.database_url,
            slot = %queue.slot(),
            auto_sync = config.scheduler.auto_sync,
            online = connectivity.is_online(),
            "sync engine opened"
        );

        Ok(Self {
            config,
            storage,
            queue,
            connectivity,
            scheduler,
            metrics,
            mutations,
            handle: Mutex::new(handle),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn tasks(&self) -> &TaskMutations {
        &self.mutations
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.queue
    }

    pub fn scheduler(&self) -> &Arc<SyncScheduler> {
        &self.scheduler
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    /// Feeds a host connectivity transition into the engine.
    pub fn report_connectivity(&self, status: ConnectivityStatus) -> bool {
        self.connectivity.report(status)
    }

    pub fn status(&self) -> SyncStatus {
        self.scheduler.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.scheduler.subscribe_status()
    }

    pub fn metrics(&self) -> FlushMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub async fn pending(&self) -> Result<Vec<ActionRecord>, SyncError> {
        self.scheduler.pending().await
    }

    pub async fn dead_letters(&self) -> Result<Vec<ActionRecord>, SyncError> {
        self.scheduler.dead_letters().await
    }

    pub async fn flush_now(&self) -> FlushOutcome {
        self.scheduler.flush(FlushTrigger::Manual).await
    }

    /// Starts the background loop if it is not already running.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(SchedulerHandle::is_running) {
            return;
        }
        *handle = Some(self.scheduler.start());
    }

    /// Stops the background loop, waits for an in-flight flush and closes the database.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.shutdown().await;
        }
        self.storage.close().await;
        tracing::info!(target: "sync::flush", "sync engine stopped");
    }
}
