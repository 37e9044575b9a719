use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_QUEUE_SLOT: &str = "sync_queue";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub auto_sync: bool,
    pub flush_interval_secs: u64,
    pub max_retries: u32,
    pub dispatch_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub queue_slot: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            flush_interval_secs: 5,
            max_retries: DEFAULT_MAX_RETRIES,
            dispatch_timeout_ms: 10_000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            queue_slot: DEFAULT_QUEUE_SLOT.to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("TASKSYNC_AUTO_SYNC") {
            cfg.scheduler.auto_sync = parse_bool(&v, cfg.scheduler.auto_sync);
        }
        if let Some(value) = env_u64("TASKSYNC_FLUSH_INTERVAL_SECS") {
            cfg.scheduler.flush_interval_secs = value.max(1);
        }
        if let Some(value) = env_u64("TASKSYNC_MAX_RETRIES") {
            cfg.scheduler.max_retries = u32::try_from(value).unwrap_or(u32::MAX).max(1);
        }
        if let Some(value) = env_u64("TASKSYNC_DISPATCH_TIMEOUT_MS") {
            cfg.scheduler.dispatch_timeout_ms = value.max(1);
        }
        if let Ok(v) = std::env::var("TASKSYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.storage.database_url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("TASKSYNC_QUEUE_SLOT") {
            if !v.trim().is_empty() {
                cfg.storage.queue_slot = v.trim().to_string();
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scheduler.flush_interval_secs == 0 {
            return Err("Scheduler flush_interval_secs must be greater than 0".to_string());
        }
        if self.scheduler.max_retries == 0 {
            return Err("Scheduler max_retries must be greater than 0".to_string());
        }
        if self.scheduler.dispatch_timeout_ms == 0 {
            return Err("Scheduler dispatch_timeout_ms must be greater than 0".to_string());
        }
        if self.storage.database_url.trim().is_empty() {
            return Err("Storage database_url cannot be empty".to_string());
        }
        if self.storage.queue_slot.trim().is_empty() {
            return Err("Storage queue_slot cannot be empty".to_string());
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|dir| dir.join("tasksync"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!("sqlite:{}", dir.join("queue.db").display())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
