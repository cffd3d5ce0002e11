use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    /// Object-store bucket AWS-flavoured upload targets write into.
    pub bucket: String,
    /// A worker lease with no heartbeat for this long is considered dead.
    pub heartbeat_timeout_ms: u64,
    /// How often the sweeper checks for stale leases.
    pub sweeper_interval_ms: u64,
    /// How long a worker poll may block before it has to retry.
    pub worker_poll_timeout_ms: u64,
    /// Watchdog for out-of-band manifest generation.
    pub manifest_deadline_ms: u64,
    /// Directory jobs are persisted into; in-memory only when unset.
    pub jobs_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8700".parse().unwrap(),
            bucket: "composer-images".to_string(),
            heartbeat_timeout_ms: 120_000,
            sweeper_interval_ms: 30_000,
            worker_poll_timeout_ms: 30_000,
            manifest_deadline_ms: 300_000,
            jobs_dir: None,
        }
    }
}

impl ServiceConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn sweeper_interval(&self) -> Duration {
        Duration::from_millis(self.sweeper_interval_ms)
    }

    pub fn worker_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_poll_timeout_ms)
    }

    pub fn manifest_deadline(&self) -> Duration {
        Duration::from_millis(self.manifest_deadline_ms)
    }
}
