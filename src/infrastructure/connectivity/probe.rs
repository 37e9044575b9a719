use crate::application::ports::ConnectivityProbe;
use crate::domain::value_objects::ConnectivityStatus;
use std::sync::atomic::{AtomicBool, Ordering};

/// Probe backed by a flag the host flips from its own network callbacks.
#[derive(Debug)]
pub struct FlagProbe {
    online: AtomicBool,
}

impl FlagProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for FlagProbe {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for FlagProbe {
    fn current(&self) -> ConnectivityStatus {
        ConnectivityStatus::from_online(self.online.load(Ordering::SeqCst))
    }
}
