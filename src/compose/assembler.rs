//! Assembles the job DAG for a validated compose request.
//!
//! Two shapes exist. A plain compose builds exactly one image and uploads it
//! directly:
//!
//! ```text
//! depsolve -> manifest -> osbuild
//! ```
//!
//! A koji compose coordinates any number of images with an external build
//! system, which also takes over the upload:
//!
//! ```text
//! init -> { depsolve_i -> manifest_i -> osbuild_i } -> finalize
//! ```
//!
//! The id of the terminal job (osbuild, or finalize) doubles as the compose
//! id returned to the client.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::compose::blueprint::{Blueprint, Subscription};
use crate::compose::manifest::generate_manifest;
use crate::distro::{Distro, ImageTypeDef};
use crate::worker::jobs::{
    DepsolveJob, KojiFinalizeJob, KojiInitJob, OSBuildJob, OSBuildKojiJob, PipelineNames,
    RepoConfig, UploadTarget,
};
use crate::worker::WorkerServer;

/// One image to build, fully resolved against the distro registry.
#[derive(Debug, Clone)]
pub struct ImageBuildRequest {
    pub image_type: ImageTypeDef,
    pub arch: String,
    pub repositories: Vec<RepoConfig>,
    pub package_sets_repositories: HashMap<String, Vec<RepoConfig>>,
    pub image_options: ImageOptions,
    pub target: Option<UploadTarget>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    pub size: u64,
    pub ostree: OstreeSpec,
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Default)]
pub struct OstreeSpec {
    pub reference: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KojiParams {
    pub server: String,
    pub task_id: u64,
    pub name: String,
    pub version: String,
    pub release: String,
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("a compose must contain exactly one image request")]
    InvalidNumberOfImageBuilds,

    #[error("failed to enqueue job: {0}")]
    Enqueue(#[from] crate::error::Error),
}

fn depsolve_job(distro: &Distro, blueprint: &Blueprint, request: &ImageBuildRequest) -> DepsolveJob {
    DepsolveJob {
        package_sets: request.image_type.package_sets(&blueprint.package_names()),
        repos: request.repositories.clone(),
        module_platform_id: distro.module_platform_id.clone(),
        arch: request.arch.clone(),
        releasever: distro.releasever.clone(),
        package_sets_repositories: request.package_sets_repositories.clone(),
    }
}

fn pipeline_names(image_type: &ImageTypeDef) -> PipelineNames {
    PipelineNames {
        build: image_type.build_pipelines.clone(),
        payload: image_type.payload_pipelines.clone(),
    }
}

fn spawn_manifest_task(
    workers: &WorkerServer,
    deadline: Duration,
    manifest_id: Uuid,
    request: &ImageBuildRequest,
    seed: i64,
    blueprint: &Blueprint,
) {
    tokio::spawn(generate_manifest(
        workers.clone(),
        deadline,
        manifest_id,
        request.image_type.clone(),
        request.repositories.clone(),
        request.image_options.clone(),
        seed,
        blueprint.clone(),
    ));
}

/// Enqueue a single-image compose. Returns the osbuild job id, which is the
/// compose id.
pub async fn enqueue_compose(
    workers: &WorkerServer,
    manifest_deadline: Duration,
    distro: &Distro,
    blueprint: &Blueprint,
    manifest_seed: i64,
    mut requests: Vec<ImageBuildRequest>,
) -> Result<Uuid, ComposeError> {
    if requests.len() != 1 {
        return Err(ComposeError::InvalidNumberOfImageBuilds);
    }
    let request = requests.remove(0);

    let depsolve_id = workers
        .enqueue_depsolve(&depsolve_job(distro, blueprint, &request))
        .await?;
    let manifest_id = workers.enqueue_manifest_job_by_id(depsolve_id).await?;
    let compose_id = workers
        .enqueue_osbuild_as_dependency(
            &request.arch,
            &OSBuildJob {
                image_name: request.image_type.filename.clone(),
                targets: request.target.iter().cloned().collect(),
                exports: request.image_type.exports.clone(),
                pipeline_names: pipeline_names(&request.image_type),
            },
            manifest_id,
        )
        .await?;

    spawn_manifest_task(
        workers,
        manifest_deadline,
        manifest_id,
        &request,
        manifest_seed,
        blueprint,
    );

    Ok(compose_id)
}

/// Enqueue a koji compose: one init job, a depsolve/manifest/build triple
/// per image, and a finalize job depending on the init job and every build.
/// Returns the finalize job id, which is the compose id.
pub async fn enqueue_koji_compose(
    workers: &WorkerServer,
    manifest_deadline: Duration,
    koji: &KojiParams,
    distro: &Distro,
    blueprint: &Blueprint,
    manifest_seed: i64,
    requests: Vec<ImageBuildRequest>,
) -> Result<Uuid, ComposeError> {
    let koji_directory = format!("composer-koji-{}", Uuid::new_v4());

    let init_id = workers
        .enqueue_koji_init(&KojiInitJob {
            server: koji.server.clone(),
            name: koji.name.clone(),
            version: koji.version.clone(),
            release: koji.release.clone(),
        })
        .await?;

    let mut koji_filenames = Vec::with_capacity(requests.len());
    let mut build_ids = Vec::with_capacity(requests.len());
    for request in &requests {
        let depsolve_id = workers
            .enqueue_depsolve(&depsolve_job(distro, blueprint, request))
            .await?;
        let manifest_id = workers.enqueue_manifest_job_by_id(depsolve_id).await?;

        let koji_filename = format!(
            "{}-{}-{}.{}{}",
            koji.name,
            koji.version,
            koji.release,
            request.arch,
            split_extension(&request.image_type.filename),
        );
        let build_id = workers
            .enqueue_osbuild_koji_as_dependency(
                &request.arch,
                &OSBuildKojiJob {
                    image_name: request.image_type.filename.clone(),
                    exports: request.image_type.exports.clone(),
                    pipeline_names: pipeline_names(&request.image_type),
                    koji_server: koji.server.clone(),
                    koji_directory: koji_directory.clone(),
                    koji_filename: koji_filename.clone(),
                },
                manifest_id,
                init_id,
            )
            .await?;
        koji_filenames.push(koji_filename);
        build_ids.push(build_id);

        spawn_manifest_task(
            workers,
            manifest_deadline,
            manifest_id,
            request,
            manifest_seed,
            blueprint,
        );
    }

    let compose_id = workers
        .enqueue_koji_finalize(
            &KojiFinalizeJob {
                server: koji.server.clone(),
                name: koji.name.clone(),
                version: koji.version.clone(),
                release: koji.release.clone(),
                koji_filenames,
                koji_directory,
                task_id: koji.task_id,
                start_time: chrono::Utc::now().timestamp() as u64,
            },
            init_id,
            &build_ids,
        )
        .await?;

    Ok(compose_id)
}

/// The full extension of a filename: `image.tar.gz` gives `.tar.gz`, a name
/// without dots gives an empty string.
fn split_extension(filename: &str) -> String {
    let mut parts: Vec<&str> = filename.split('.').collect();
    if parts.first() == Some(&"") {
        parts.remove(0);
    }
    if parts.len() <= 1 {
        return String::new();
    }
    format!(".{}", parts[1..].join("."))
}

#[cfg(test)]
mod tests {
    use super::split_extension;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("image.raw"), ".raw");
        assert_eq!(split_extension("image.tar.gz"), ".tar.gz");
        assert_eq!(split_extension("image"), "");
        assert_eq!(split_extension(".hidden"), "");
        assert_eq!(split_extension(".hidden.gz"), ".gz");
    }
}
