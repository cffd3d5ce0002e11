//! The worker-facing side of the service.
//!
//! [`WorkerServer`] wraps the raw job queue with the typed job payloads the
//! compose front-end and the workers agree on:
//! - **Typed enqueue**: one method per job type, wiring dependencies the way
//!   the compose DAG shapes expect them
//! - **Typed status**: readers that decode result blobs into their job-type
//!   result structs
//! - **Leases**: dequeue hands out a token; finishing, heartbeating and
//!   cancellation checks all go through it
//!
//! Build jobs are enqueued with an architecture-scoped type
//! (`osbuild:x86_64`) so workers subscribe per architecture; [`job_kind`]
//! strips the suffix back off for callers that only care about the kind.
//!
//! [`job_kind`]: WorkerServer::job_kind

pub mod api;
pub mod jobs;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::queue::{JobQueue, JobStatus};
use self::jobs::{
    DepsolveJob, DepsolveJobResult, KojiFinalizeJob, KojiFinalizeJobResult, KojiInitJob,
    KojiInitJobResult, ManifestJobByID, ManifestJobByIDResult, OSBuildJob, OSBuildJobResult,
    OSBuildKojiJob, OSBuildKojiJobResult,
};

pub const JOB_KIND_DEPSOLVE: &str = "depsolve";
pub const JOB_KIND_MANIFEST: &str = "manifest-id-only";
pub const JOB_KIND_OSBUILD: &str = "osbuild";
pub const JOB_KIND_OSBUILD_KOJI: &str = "osbuild-koji";
pub const JOB_KIND_KOJI_INIT: &str = "koji-init";
pub const JOB_KIND_KOJI_FINALIZE: &str = "koji-finalize";

/// A dequeued job as handed to a worker: identity, lease token, payload and
/// the results of its dependencies in enqueue order.
#[derive(Debug, Clone)]
pub struct RequestedJob {
    pub id: Uuid,
    pub token: Uuid,
    pub job_type: String,
    pub args: Box<RawValue>,
    pub deps: Vec<Uuid>,
    pub dynamic_args: Vec<Box<RawValue>>,
}

#[derive(Clone, Debug)]
pub struct WorkerServer {
    queue: Arc<JobQueue>,
}

impl WorkerServer {
    pub fn new(queue: Arc<JobQueue>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub async fn enqueue_depsolve(&self, job: &DepsolveJob) -> Result<Uuid> {
        self.queue.enqueue(JOB_KIND_DEPSOLVE, job, &[]).await
    }

    /// Enqueue a manifest job resolved out-of-band from its depsolve dep.
    pub async fn enqueue_manifest_job_by_id(&self, depsolve: Uuid) -> Result<Uuid> {
        self.queue
            .enqueue(JOB_KIND_MANIFEST, &ManifestJobByID::default(), &[depsolve])
            .await
    }

    pub async fn enqueue_osbuild_as_dependency(
        &self,
        arch: &str,
        job: &OSBuildJob,
        manifest: Uuid,
    ) -> Result<Uuid> {
        let job_type = format!("{JOB_KIND_OSBUILD}:{arch}");
        self.queue.enqueue(&job_type, job, &[manifest]).await
    }

    pub async fn enqueue_koji_init(&self, job: &KojiInitJob) -> Result<Uuid> {
        self.queue.enqueue(JOB_KIND_KOJI_INIT, job, &[]).await
    }

    /// Koji build jobs depend on their manifest first, then the shared init
    /// job; workers read the manifest positionally from the first dep.
    pub async fn enqueue_osbuild_koji_as_dependency(
        &self,
        arch: &str,
        job: &OSBuildKojiJob,
        manifest: Uuid,
        init: Uuid,
    ) -> Result<Uuid> {
        let job_type = format!("{JOB_KIND_OSBUILD_KOJI}:{arch}");
        self.queue.enqueue(&job_type, job, &[manifest, init]).await
    }

    pub async fn enqueue_koji_finalize(
        &self,
        job: &KojiFinalizeJob,
        init: Uuid,
        builds: &[Uuid],
    ) -> Result<Uuid> {
        let mut deps = Vec::with_capacity(builds.len() + 1);
        deps.push(init);
        deps.extend_from_slice(builds);
        self.queue.enqueue(JOB_KIND_KOJI_FINALIZE, job, &deps).await
    }

    /// The job's kind: its queue type without the architecture suffix build
    /// jobs carry.
    pub async fn job_kind(&self, id: Uuid) -> Result<String> {
        let (job_type, _, _) = self.queue.job(id).await?;
        Ok(match job_type.split_once(':') {
            Some((kind, _)) => kind.to_string(),
            None => job_type,
        })
    }

    pub async fn job_status(&self, id: Uuid) -> Result<JobStatus> {
        self.queue.job_status(id).await
    }

    /// Block until a job of one of `types` is pending and lease it, with the
    /// results of its dependencies attached.
    pub async fn request_job(
        &self,
        cancel: &CancellationToken,
        types: &[String],
    ) -> Result<RequestedJob> {
        let dequeued = self.queue.dequeue(cancel, types).await?;
        self.attach_dynamic_args(dequeued).await
    }

    /// Lease one specific pending job; never blocks.
    pub async fn request_job_by_id(&self, id: Uuid) -> Result<RequestedJob> {
        let dequeued = self.queue.dequeue_by_id(id).await?;
        self.attach_dynamic_args(dequeued).await
    }

    pub async fn finish_job<T>(&self, token: Uuid, result: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let id = self.queue.id_from_token(token).await?;
        self.queue.finish_job(id, result).await
    }

    pub async fn refresh_heartbeat(&self, token: Uuid) {
        self.queue.refresh_heartbeat(token).await;
    }

    /// Whether the job behind a live lease has been canceled. Fails with
    /// `NotExist` once the lease is gone.
    pub async fn check_job(&self, token: Uuid) -> Result<bool> {
        let id = self.queue.id_from_token(token).await?;
        let status = self.queue.job_status(id).await?;
        Ok(status.canceled)
    }

    pub async fn depsolve_job_status(&self, id: Uuid) -> Result<(JobStatus, DepsolveJobResult)> {
        self.typed_job_status(id, JOB_KIND_DEPSOLVE).await
    }

    pub async fn manifest_job_status(
        &self,
        id: Uuid,
    ) -> Result<(JobStatus, ManifestJobByIDResult)> {
        self.typed_job_status(id, JOB_KIND_MANIFEST).await
    }

    pub async fn osbuild_job_status(&self, id: Uuid) -> Result<(JobStatus, OSBuildJobResult)> {
        self.typed_job_status(id, JOB_KIND_OSBUILD).await
    }

    pub async fn osbuild_koji_job_status(
        &self,
        id: Uuid,
    ) -> Result<(JobStatus, OSBuildKojiJobResult)> {
        self.typed_job_status(id, JOB_KIND_OSBUILD_KOJI).await
    }

    pub async fn koji_init_job_status(&self, id: Uuid) -> Result<(JobStatus, KojiInitJobResult)> {
        self.typed_job_status(id, JOB_KIND_KOJI_INIT).await
    }

    pub async fn koji_finalize_job_status(
        &self,
        id: Uuid,
    ) -> Result<(JobStatus, KojiFinalizeJobResult)> {
        self.typed_job_status(id, JOB_KIND_KOJI_FINALIZE).await
    }

    pub async fn osbuild_job(&self, id: Uuid) -> Result<OSBuildJob> {
        self.typed_job_args(id, JOB_KIND_OSBUILD).await
    }

    pub async fn osbuild_koji_job(&self, id: Uuid) -> Result<OSBuildKojiJob> {
        self.typed_job_args(id, JOB_KIND_OSBUILD_KOJI).await
    }

    async fn typed_job_status<T>(&self, id: Uuid, kind: &str) -> Result<(JobStatus, T)>
    where
        T: DeserializeOwned + Default,
    {
        if self.job_kind(id).await? != kind {
            return Err(Error::NotExist);
        }
        let status = self.queue.job_status(id).await?;
        let result = match &status.result {
            Some(raw) => serde_json::from_str(raw.get())?,
            None => T::default(),
        };
        Ok((status, result))
    }

    async fn typed_job_args<T>(&self, id: Uuid, kind: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let (job_type, args, _) = self.queue.job(id).await?;
        match job_type.split_once(':') {
            Some((k, _)) if k == kind => {}
            None if job_type == kind => {}
            _ => return Err(Error::NotExist),
        }
        Ok(serde_json::from_str(args.get())?)
    }

    async fn attach_dynamic_args(&self, dequeued: crate::queue::DequeuedJob) -> Result<RequestedJob> {
        let mut dynamic_args = Vec::with_capacity(dequeued.deps.len());
        for dep in &dequeued.deps {
            let status = self.queue.job_status(*dep).await?;
            let result = match status.result {
                Some(raw) => raw,
                None => serde_json::value::to_raw_value(&serde_json::Value::Null)?,
            };
            dynamic_args.push(result);
        }
        Ok(RequestedJob {
            id: dequeued.id,
            token: dequeued.token,
            job_type: dequeued.job_type,
            args: dequeued.args,
            deps: dequeued.deps,
            dynamic_args,
        })
    }
}
