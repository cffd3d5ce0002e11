use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the job queue and the worker layer built on top of it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("job does not exist")]
    NotExist,

    #[error("job is not in a pending state")]
    NotPending,

    #[error("job is not running")]
    NotRunning,

    #[error("dequeue context was canceled or timed out")]
    DequeueTimeout,

    #[error("dependency does not exist: {0}")]
    UnknownDep(Uuid),

    #[error("cannot encode job payload: {0}")]
    BadArgs(#[from] serde_json::Error),

    #[error("job storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
