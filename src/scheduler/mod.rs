//! Job model, schedule grammar, and the job queue.

pub mod job;
pub mod queue;
pub mod schedule;

pub use job::{Job, JobSpec, JobStatus, JobUpdate, LogEntry, LogLevel, Priority, RetryPolicy};
pub use queue::JobQueue;
pub use schedule::Recurrence;
