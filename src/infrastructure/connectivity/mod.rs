pub mod monitor;
pub mod probe;

pub use monitor::{ConnectivityListener, ConnectivityMonitor, Subscription};
pub use probe::FlagProbe;
