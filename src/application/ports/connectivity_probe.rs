use crate::domain::value_objects::ConnectivityStatus;

/// The host's current online/offline indicator.
pub trait ConnectivityProbe: Send + Sync {
    fn current(&self) -> ConnectivityStatus;
}
