use crate::application::ports::ConnectivityProbe;
use crate::domain::value_objects::ConnectivityStatus;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

pub type ConnectivityListener = Arc<dyn Fn(ConnectivityStatus) + Send + Sync>;

struct MonitorState {
    status: ConnectivityStatus,
    next_id: u64,
    listeners: BTreeMap<u64, ConnectivityListener>,
}

/// Tracks the host's online/offline signal and fans transitions out to listeners.
///
/// Listeners run while the monitor's lock is held, which is what makes `unsubscribe` final.
/// A listener must therefore not call back into the monitor.
pub struct ConnectivityMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    state: Arc<Mutex<MonitorState>>,
    sender: watch::Sender<ConnectivityStatus>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        let status = probe.current();
        let (sender, _) = watch::channel(status);
        Self {
            probe,
            state: Arc::new(Mutex::new(MonitorState {
                status,
                next_id: 0,
                listeners: BTreeMap::new(),
            })),
            sender,
        }
    }

    pub fn current_status(&self) -> ConnectivityStatus {
        lock(&self.state).status
    }

    pub fn is_online(&self) -> bool {
        self.current_status().is_online()
    }

    /// Re-reads the probe, then registers `listener` for subsequent transitions.
    pub fn subscribe(&self, listener: ConnectivityListener) -> Subscription {
        self.refresh();
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, listener);
        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Receiver for async consumers; only sees actual transitions.
    pub fn watch(&self) -> watch::Receiver<ConnectivityStatus> {
        self.sender.subscribe()
    }

    /// Applies the probe's current reading as a transition event.
    pub fn refresh(&self) -> bool {
        self.report(self.probe.current())
    }

    /// Feeds a host transition event. Returns `false` when the status did not change.
    pub fn report(&self, status: ConnectivityStatus) -> bool {
        let mut state = lock(&self.state);
        if state.status == status {
            return false;
        }
        state.status = status;
        tracing::info!(target: "sync::connectivity", ?status, "connectivity changed");

        for listener in state.listeners.values() {
            listener(status);
        }
        self.sender.send_replace(status);
        true
    }
}

/// Handle returned by [`ConnectivityMonitor::subscribe`]. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<MonitorState>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state).listeners.remove(&self.id);
        }
    }
}

fn lock(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
