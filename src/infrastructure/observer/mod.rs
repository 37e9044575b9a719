pub mod metrics;
pub mod tracing_observer;

pub use metrics::{DeliveryOutcomeStatus, FlushMetrics, FlushMetricsSnapshot};
pub use tracing_observer::TracingObserver;
