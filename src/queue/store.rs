//! The job queue core: a durable store of typed jobs with dependencies,
//! per-type FIFO ready queues, a blocking dispatcher and lease tracking.
//!
//! Jobs form a DAG: dependencies must already exist at enqueue time, so the
//! graph is acyclic by construction. When the last unfinished dependency of a
//! job finishes, the job is promoted to the ready queue of its type; workers
//! block in [`JobQueue::dequeue`] until a job of one of their types is ready.
//! A dequeued job is leased to the worker through an opaque token, and the
//! lease records heartbeats so a sweeper can reap jobs whose worker died.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::value::RawValue;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::queue::job::{DequeuedJob, Job, JobState, JobStatus};
use crate::queue::persist::JobDir;

/// A live lease held by a worker for one job.
#[derive(Debug, Clone)]
struct Lease {
    job: Uuid,
    last_heartbeat: Instant,
}

/// Entry in a ready queue. The sequence number is assigned when the job
/// becomes pending and orders jobs across queues of different types.
#[derive(Debug, Clone, Copy)]
struct ReadyEntry {
    seq: u64,
    id: Uuid,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: HashMap<Uuid, Job>,
    /// One FIFO per job-type string seen so far.
    queues: HashMap<String, VecDeque<ReadyEntry>>,
    /// For each job, the jobs whose deps contain it.
    dependants: HashMap<Uuid, Vec<Uuid>>,
    /// Token -> lease. At most one live token per job.
    leases: HashMap<Uuid, Lease>,
    next_seq: u64,
}

impl QueueState {
    /// Insert a job whose dependencies are all satisfied into the ready
    /// queue of its type.
    fn promote(&mut self, id: Uuid) {
        if let Some(job) = self.jobs.get(&id) {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.queues
                .entry(job.job_type.clone())
                .or_default()
                .push_back(ReadyEntry { seq, id });
        }
    }

    /// Pop the oldest pending job across the named queues. Ordering is by
    /// the moment the job became pending; the sequence numbers are unique so
    /// the caller's type order only matters for queues it names twice.
    fn pop_ready(&mut self, types: &[String]) -> Option<Uuid> {
        let mut best: Option<(u64, usize)> = None;
        for (i, job_type) in types.iter().enumerate() {
            if let Some(front) = self.queues.get(job_type).and_then(|q| q.front()) {
                if best.map_or(true, |(seq, _)| front.seq < seq) {
                    best = Some((front.seq, i));
                }
            }
        }
        let (_, i) = best?;
        self.queues
            .get_mut(&types[i])
            .and_then(|q| q.pop_front())
            .map(|entry| entry.id)
    }

    /// Remove a job from its type's ready queue, if it is queued there.
    fn remove_ready(&mut self, id: Uuid) {
        if let Some(job) = self.jobs.get(&id) {
            if let Some(queue) = self.queues.get_mut(&job.job_type) {
                queue.retain(|entry| entry.id != id);
            }
        }
    }

    /// Mark a job started and mint a fresh lease token for it.
    fn start(&mut self, id: Uuid) -> Option<DequeuedJob> {
        let token = Uuid::new_v4();
        let job = self.jobs.get_mut(&id)?;
        job.started_at = Some(chrono::Utc::now());
        job.token = Some(token);
        let dequeued = DequeuedJob {
            id,
            token,
            job_type: job.job_type.clone(),
            args: job.args.clone(),
            deps: job.deps.clone(),
        };
        self.leases.insert(
            token,
            Lease {
                job: id,
                last_heartbeat: Instant::now(),
            },
        );
        Some(dequeued)
    }

    /// Cancel a job and, transitively, everything depending on it. Finished
    /// jobs are left alone. Returns the ids that were actually canceled.
    fn cancel_tree(&mut self, root: Uuid) -> Vec<Uuid> {
        let mut canceled = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let token = match self.jobs.get_mut(&id) {
                Some(job) if job.finished_at.is_none() && !job.canceled => {
                    job.canceled = true;
                    job.token.take()
                }
                _ => continue,
            };
            if let Some(token) = token {
                self.leases.remove(&token);
            }
            self.remove_ready(id);
            canceled.push(id);
            if let Some(deps) = self.dependants.get(&id) {
                stack.extend(deps.iter().copied());
            }
        }
        canceled
    }
}

/// The job queue. Cheap to share behind an `Arc`; all operations take
/// `&self` and serialize internally.
#[derive(Debug)]
pub struct JobQueue {
    state: RwLock<QueueState>,
    /// Generation counter bumped on every ready-queue insertion. Dequeue
    /// waiters subscribe before checking the queues, so a promotion between
    /// the check and the wait still wakes them.
    ready: watch::Sender<u64>,
    persist: Option<JobDir>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    /// Create an in-memory queue. State does not survive a restart.
    pub fn new() -> Self {
        let (ready, _) = watch::channel(0);
        Self {
            state: RwLock::new(QueueState::default()),
            ready,
            persist: None,
        }
    }

    /// Create a queue persisting every job as a JSON file under `dir`,
    /// loading whatever is already there. Leases are volatile: a job that
    /// was running when the process stopped is returned to the pending
    /// state.
    pub async fn with_persistence(dir: impl Into<PathBuf>) -> Result<Self> {
        let persist = JobDir::open(dir.into()).await?;
        let jobs = persist.load_all().await?;

        let mut state = QueueState::default();
        for mut job in jobs {
            if job.finished_at.is_none() {
                job.started_at = None;
            }
            job.token = None;
            for dep in &job.deps {
                state.dependants.entry(*dep).or_default().push(job.id);
            }
            state.jobs.insert(job.id, job);
        }

        // Rebuild dependency counters and re-queue pending jobs in their
        // original enqueue order.
        let mut order: Vec<(chrono::DateTime<chrono::Utc>, Uuid)> = state
            .jobs
            .values()
            .map(|job| (job.queued_at, job.id))
            .collect();
        order.sort();
        for (_, id) in order {
            let unfinished = {
                let job = &state.jobs[&id];
                job.deps
                    .iter()
                    .filter(|dep| match state.jobs.get(dep) {
                        Some(d) => d.finished_at.is_none() && !d.canceled,
                        // A dep whose record is missing can never finish;
                        // keep the job blocked rather than running it with
                        // absent inputs.
                        None => true,
                    })
                    .count()
            };
            let mut pending = false;
            if let Some(job) = state.jobs.get_mut(&id) {
                job.unfinished_deps = unfinished;
                pending = job.state() == JobState::Pending;
            }
            if pending {
                state.promote(id);
            }
        }

        tracing::info!(jobs = state.jobs.len(), "Loaded job queue from disk");

        let (ready, _) = watch::channel(0);
        Ok(Self {
            state: RwLock::new(state),
            ready,
            persist: Some(persist),
        })
    }

    /// Add a job of the given type. All deps must already exist, otherwise
    /// nothing is mutated. The job becomes pending immediately if every dep
    /// is already finished or canceled.
    pub async fn enqueue<T>(&self, job_type: &str, args: &T, deps: &[Uuid]) -> Result<Uuid>
    where
        T: Serialize + ?Sized,
    {
        let args = serde_json::value::to_raw_value(args)?;

        let mut state = self.state.write().await;
        for dep in deps {
            if !state.jobs.contains_key(dep) {
                return Err(Error::UnknownDep(*dep));
            }
        }

        let mut job = Job::new(job_type.to_string(), args, deps.to_vec());
        let id = job.id;
        job.unfinished_deps = deps
            .iter()
            .filter(|dep| {
                let d = &state.jobs[*dep];
                d.finished_at.is_none() && !d.canceled
            })
            .count();
        let pending = job.unfinished_deps == 0;

        for dep in deps {
            state.dependants.entry(*dep).or_default().push(id);
        }
        state.jobs.insert(id, job);
        if pending {
            state.promote(id);
            self.notify_ready();
        }
        self.persist_job(&state, id).await?;

        tracing::debug!(job_id = %id, job_type, deps = deps.len(), "Job enqueued");
        Ok(id)
    }

    /// Read a job's immutable parameters, independent of its state.
    pub async fn job(&self, id: Uuid) -> Result<(String, Box<RawValue>, Vec<Uuid>)> {
        let state = self.state.read().await;
        let job = state.jobs.get(&id).ok_or(Error::NotExist)?;
        Ok((job.job_type.clone(), job.args.clone(), job.deps.clone()))
    }

    /// Read a job's status: result, timestamps, cancel flag and deps.
    pub async fn job_status(&self, id: Uuid) -> Result<JobStatus> {
        let state = self.state.read().await;
        let job = state.jobs.get(&id).ok_or(Error::NotExist)?;
        Ok(JobStatus {
            job_type: job.job_type.clone(),
            result: job.result.clone(),
            queued_at: job.queued_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
            canceled: job.canceled,
            deps: job.deps.clone(),
        })
    }

    /// Block until a job of one of the given types is pending, pop the
    /// oldest one and lease it to the caller. Returns `DequeueTimeout` when
    /// `cancel` fires first. Waiting never holds the queue lock, so
    /// concurrent dequeues of disjoint types do not block one another.
    pub async fn dequeue(
        &self,
        cancel: &CancellationToken,
        types: &[String],
    ) -> Result<DequeuedJob> {
        loop {
            let mut ready = self.ready.subscribe();
            {
                let mut state = self.state.write().await;
                if let Some(id) = state.pop_ready(types) {
                    if let Some(dequeued) = state.start(id) {
                        tracing::debug!(job_id = %id, job_type = %dequeued.job_type, "Job dequeued");
                        return Ok(dequeued);
                    }
                }
            }
            tokio::select! {
                _ = ready.changed() => {}
                _ = cancel.cancelled() => return Err(Error::DequeueTimeout),
            }
        }
    }

    /// Non-blocking dequeue of one specific job. Fails with `NotPending`
    /// unless the job's deps are finished and nobody holds a lease on it.
    pub async fn dequeue_by_id(&self, id: Uuid) -> Result<DequeuedJob> {
        let mut state = self.state.write().await;
        let job = state.jobs.get(&id).ok_or(Error::NotExist)?;
        if job.state() != JobState::Pending {
            return Err(Error::NotPending);
        }
        state.remove_ready(id);
        state.start(id).ok_or(Error::NotExist)
    }

    /// Record a result and mark the job finished. The job must be running.
    /// Dependants whose last dependency this was become pending atomically
    /// with the finish.
    pub async fn finish_job<T>(&self, id: Uuid, result: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let result = serde_json::value::to_raw_value(result)?;

        let mut state = self.state.write().await;
        let token = {
            let job = state.jobs.get_mut(&id).ok_or(Error::NotExist)?;
            if job.canceled || job.started_at.is_none() || job.finished_at.is_some() {
                return Err(Error::NotRunning);
            }
            job.result = Some(result);
            job.finished_at = Some(chrono::Utc::now());
            job.token.take()
        };
        if let Some(token) = token {
            state.leases.remove(&token);
        }

        let dependants = state.dependants.get(&id).cloned().unwrap_or_default();
        let mut promoted = false;
        for dep_id in dependants {
            let mut ready = false;
            if let Some(dependant) = state.jobs.get_mut(&dep_id) {
                dependant.unfinished_deps = dependant.unfinished_deps.saturating_sub(1);
                ready = dependant.unfinished_deps == 0 && !dependant.canceled;
            }
            if ready {
                state.promote(dep_id);
                promoted = true;
            }
        }
        if promoted {
            self.notify_ready();
        }
        self.persist_job(&state, id).await?;

        tracing::debug!(job_id = %id, "Job finished");
        Ok(())
    }

    /// Cancel a non-terminal job and, transitively, all of its dependants.
    /// The lease, if any, is dropped; a later finish against it fails with
    /// `NotRunning`.
    pub async fn cancel_job(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        match state.jobs.get(&id) {
            None => return Err(Error::NotExist),
            Some(job) if job.finished_at.is_some() || job.canceled => {
                return Err(Error::NotRunning)
            }
            Some(_) => {}
        }
        let canceled = state.cancel_tree(id);
        for canceled_id in &canceled {
            self.persist_job(&state, *canceled_id).await?;
        }
        tracing::info!(job_id = %id, count = canceled.len(), "Job canceled");
        Ok(())
    }

    /// Resolve a lease token to its job id. Fails with `NotExist` once the
    /// job is finished or canceled.
    pub async fn id_from_token(&self, token: Uuid) -> Result<Uuid> {
        let state = self.state.read().await;
        state
            .leases
            .get(&token)
            .map(|lease| lease.job)
            .ok_or(Error::NotExist)
    }

    /// Record that the worker holding this token is still alive. Unknown
    /// tokens are ignored.
    pub async fn refresh_heartbeat(&self, token: Uuid) {
        let mut state = self.state.write().await;
        if let Some(lease) = state.leases.get_mut(&token) {
            lease.last_heartbeat = Instant::now();
        }
    }

    /// Enumerate tokens of live leases whose last heartbeat is at least
    /// `older_than` in the past. Finished and canceled jobs hold no lease
    /// and are never returned.
    pub async fn heartbeats(&self, older_than: Duration) -> Vec<Uuid> {
        let state = self.state.read().await;
        state
            .leases
            .iter()
            .filter(|(_, lease)| lease.last_heartbeat.elapsed() >= older_than)
            .map(|(token, _)| *token)
            .collect()
    }

    fn notify_ready(&self) {
        self.ready.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    async fn persist_job(&self, state: &QueueState, id: Uuid) -> Result<()> {
        if let Some(dir) = &self.persist {
            if let Some(job) = state.jobs.get(&id) {
                dir.write(job).await?;
            }
        }
        Ok(())
    }
}
