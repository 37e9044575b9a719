pub mod config;
pub mod error;
pub mod logging;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
