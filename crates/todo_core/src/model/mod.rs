mod task;

pub use task::{Task, TaskId, parse_due_date};
