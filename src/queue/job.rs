use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use uuid::Uuid;

/// A single job record owned by the queue.
///
/// Args and results are opaque JSON blobs; the queue never interprets them.
/// The lease token and the derived dependency counter are volatile and are
/// not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub args: Box<RawValue>,
    pub deps: Vec<Uuid>,
    pub result: Option<Box<RawValue>>,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub canceled: bool,
    #[serde(skip)]
    pub token: Option<Uuid>,
    #[serde(skip)]
    pub unfinished_deps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Blocked,
    Pending,
    Running,
    Finished,
    Canceled,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Blocked => write!(f, "blocked"),
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Finished => write!(f, "finished"),
            JobState::Canceled => write!(f, "canceled"),
        }
    }
}

impl Job {
    pub fn new(job_type: String, args: Box<RawValue>, deps: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type,
            args,
            deps,
            result: None,
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            canceled: false,
            token: None,
            unfinished_deps: 0,
        }
    }

    pub fn state(&self) -> JobState {
        if self.canceled {
            JobState::Canceled
        } else if self.finished_at.is_some() {
            JobState::Finished
        } else if self.started_at.is_some() {
            JobState::Running
        } else if self.unfinished_deps > 0 {
            JobState::Blocked
        } else {
            JobState::Pending
        }
    }
}

/// Read-only status view of a job, with args omitted and deps copied.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub job_type: String,
    pub result: Option<Box<RawValue>>,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub canceled: bool,
    pub deps: Vec<Uuid>,
}

/// What a worker receives from a successful dequeue: the job identity, a
/// lease token granting the right to finish it, and the payload. Deps are in
/// enqueue order so dependants can read dependency results positionally.
#[derive(Debug, Clone)]
pub struct DequeuedJob {
    pub id: Uuid,
    pub token: Uuid,
    pub job_type: String,
    pub args: Box<RawValue>,
    pub deps: Vec<Uuid>,
}
