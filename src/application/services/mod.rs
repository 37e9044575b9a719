pub mod dispatcher;
pub mod queue_store;
pub mod retry_policy;
pub mod sync_scheduler;
pub mod task_mutations;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use queue_store::QueueStore;
pub use retry_policy::RetryPolicy;
pub use sync_scheduler::{
    FlushOutcome, FlushReport, FlushTrigger, SchedulerHandle, SyncScheduler, SyncStatus,
};
pub use task_mutations::TaskMutations;
