pub mod connectivity_probe;
pub mod key_value_store;
pub mod remote_store;
pub mod sync_observer;

pub use connectivity_probe::ConnectivityProbe;
pub use key_value_store::KeyValueStore;
pub use remote_store::{RemoteError, RemoteStore};
pub use sync_observer::{SyncEvent, SyncObserver};
