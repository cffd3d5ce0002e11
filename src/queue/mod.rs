pub mod job;
mod persist;
pub mod store;
pub mod sweeper;

pub use job::{DequeuedJob, Job, JobState, JobStatus};
pub use store::JobQueue;
