//! Out-of-band manifest generation.
//!
//! Manifest jobs are enqueued with empty args and resolved by the service
//! itself: a task per job waits for its depsolve dependency, turns the
//! resolved package set into a build manifest and finishes the job. Workers
//! never see manifest jobs; build jobs read the manifest positionally from
//! their first dependency's result.

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use uuid::Uuid;

use crate::compose::assembler::ImageOptions;
use crate::compose::blueprint::Blueprint;
use crate::distro::ImageTypeDef;
use crate::error::Error;
use crate::worker::jobs::{
    client_errors, DepsolveJobResult, ManifestJobByIDResult, PackageSpec, RepoConfig, WorkerError,
};
use crate::worker::WorkerServer;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait for the manifest job to become pending, then resolve and finish it.
///
/// The deadline is a watchdog: if the depsolve dependency has not finished
/// in time, the task returns without touching the job and the lease sweeper
/// eventually reaps the compose. Once the job is leased it is always
/// finished, with an error result if anything goes wrong.
pub async fn generate_manifest(
    workers: WorkerServer,
    deadline: Duration,
    manifest_id: Uuid,
    image_type: ImageTypeDef,
    repos: Vec<RepoConfig>,
    options: ImageOptions,
    seed: i64,
    blueprint: Blueprint,
) {
    let started = Instant::now();
    let job = loop {
        match workers.request_job_by_id(manifest_id).await {
            Ok(job) => break job,
            Err(Error::NotPending) => {
                if started.elapsed() >= deadline {
                    tracing::warn!(
                        job_id = %manifest_id,
                        "Manifest job dependencies did not finish before the deadline, leaving it for the sweeper",
                    );
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(error) => {
                tracing::error!(job_id = %manifest_id, %error, "Requesting manifest job failed");
                return;
            }
        }
    };

    let result = manifest_result(&job.dynamic_args, &image_type, &repos, &options, seed, &blueprint);
    if let Some(job_error) = &result.job_error {
        tracing::error!(job_id = %manifest_id, reason = %job_error.reason, "Manifest job failed");
    }
    if let Err(error) = workers.finish_job(job.token, &result).await {
        tracing::error!(job_id = %manifest_id, %error, "Finishing manifest job failed");
    }
}

/// Turn the depsolve result into a manifest, categorizing depsolve failures
/// as bad-package-set vs generic dependency errors.
fn manifest_result(
    dynamic_args: &[Box<serde_json::value::RawValue>],
    image_type: &ImageTypeDef,
    repos: &[RepoConfig],
    options: &ImageOptions,
    seed: i64,
    blueprint: &Blueprint,
) -> ManifestJobByIDResult {
    let failed = |id, reason: &str| ManifestJobByIDResult {
        manifest: None,
        job_error: Some(WorkerError::new(id, reason)),
    };

    let raw = match dynamic_args.first() {
        Some(raw) => raw,
        None => return failed(client_errors::ERROR_NO_DYNAMIC_ARGS, "No dynamic arguments"),
    };
    let depsolved: DepsolveJobResult = match serde_json::from_str(raw.get()) {
        Ok(result) => result,
        Err(_) => {
            return failed(
                client_errors::ERROR_PARSING_DYNAMIC_ARGS,
                "Error parsing dynamic arguments",
            )
        }
    };

    if let Some(job_error) = &depsolved.job_error {
        let reason = if job_error.id == client_errors::ERROR_DNF_DEPSOLVE
            || job_error.id == client_errors::ERROR_DNF_MARKING
        {
            "Error in depsolve job dependency input, bad package set requested"
        } else {
            "Error in depsolve job dependency"
        };
        return failed(client_errors::ERROR_DEPSOLVE_DEPENDENCY, reason);
    }

    ManifestJobByIDResult {
        manifest: Some(render_manifest(
            image_type,
            repos,
            options,
            &depsolved.package_specs,
            seed,
            blueprint,
        )),
        job_error: None,
    }
}

/// Render the build manifest for one image. This is the only place outside
/// workers that interprets a job result.
fn render_manifest(
    image_type: &ImageTypeDef,
    repos: &[RepoConfig],
    options: &ImageOptions,
    packages: &[PackageSpec],
    seed: i64,
    blueprint: &Blueprint,
) -> Value {
    let package_list: Vec<Value> = packages
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "epoch": p.epoch,
                "version": p.version,
                "release": p.release,
                "arch": p.arch,
            })
        })
        .collect();
    let sources: Vec<Value> = repos
        .iter()
        .filter_map(|r| r.baseurl.as_ref().or(r.mirrorlist.as_ref()).or(r.metalink.as_ref()))
        .map(|url| json!({ "url": url }))
        .collect();

    let mut os_stages = vec![json!({
        "type": "org.osbuild.rpm",
        "options": { "packages": package_list, "sources": sources },
    })];
    if let Some(customizations) = &blueprint.customizations {
        if let Some(users) = &customizations.users {
            os_stages.push(json!({
                "type": "org.osbuild.users",
                "options": { "users": users },
            }));
        }
    }
    if let Some(subscription) = &options.subscription {
        os_stages.push(json!({
            "type": "org.osbuild.subscription",
            "options": {
                "organization": subscription.organization,
                "server_url": subscription.server_url,
                "base_url": subscription.base_url,
                "insights": subscription.insights,
            },
        }));
    }
    if !options.ostree.reference.is_empty() {
        os_stages.push(json!({
            "type": "org.osbuild.ostree.config",
            "options": { "ref": options.ostree.reference, "url": options.ostree.url },
        }));
    }

    let payload: Vec<Value> = image_type
        .payload_pipelines
        .iter()
        .map(|name| {
            if name == "os" {
                json!({ "name": "os", "stages": os_stages })
            } else {
                json!({
                    "name": name,
                    "stages": [{
                        "type": format!("org.osbuild.{name}"),
                        "options": { "filename": image_type.filename, "size": options.size },
                    }],
                })
            }
        })
        .collect();

    let mut pipelines = vec![json!({ "name": "build", "stages": [] })];
    pipelines.extend(payload);

    json!({
        "version": "2",
        "metadata": { "generator": "composer-lite", "seed": seed },
        "pipelines": pipelines,
    })
}
