pub mod action_record;
pub mod task;

pub use action_record::{ActionInput, ActionRecord};
pub use task::{Task, TaskChanges, TaskList};
