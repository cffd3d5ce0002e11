//! The compose front-end: the HTTP API clients use to submit compose
//! requests and follow their progress.
//!
//! Mounted under `/api/image-builder-composer/v2`. `POST /compose` validates
//! the request against the distro registry, assembles the job DAG and
//! returns the terminal job id as the compose id; the read endpoints project
//! raw job state back into API shapes.

pub mod errors;
pub mod request;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::compose::assembler::{
    enqueue_compose, enqueue_koji_compose, ComposeError, ImageBuildRequest, ImageOptions,
    KojiParams, OstreeSpec,
};
use crate::compose::blueprint::{Blueprint, Package, UserCustomization};
use crate::compose::status::{
    compose_status_from_build, compose_status_from_koji, image_status_from_build,
    image_status_from_koji_build,
};
use crate::distro::{verify_ostree_ref, DistroRegistry, ImageTypeDef};
use crate::worker::jobs::{
    OSBuildJobResult, RepoConfig, TargetResult, UploadStatusValue, UploadTarget,
};
use crate::worker::{WorkerServer, JOB_KIND_KOJI_FINALIZE, JOB_KIND_OSBUILD};
use self::errors::{api_error, error_list, HttpError, ServiceErrorCode};
use self::request::{
    AwsEc2UploadOptions, AwsS3UploadOptions, AzureUploadOptions, ComposeLogsResponse,
    ComposeManifestsResponse, ComposeMetadataResponse, ComposeRequest, ComposeStatusResponse,
    GcpUploadOptions, ImageStatus, ImageTypes, KojiLogs, KojiStatus, ObjectReference,
    PackageMetadata, Repository, UploadStatus, UploadTypes,
};

pub const BASE_PATH: &str = "/api/image-builder-composer/v2";

#[derive(Clone)]
pub struct ComposeApiState {
    pub workers: WorkerServer,
    pub distros: Arc<DistroRegistry>,
    /// Object-store bucket AWS-flavoured targets upload into.
    pub bucket: String,
    pub manifest_deadline: Duration,
}

pub fn router(state: ComposeApiState) -> Router {
    Router::new()
        .route("/compose", post(post_compose_handler))
        .route("/composes/{id}", get(compose_status_handler))
        .route("/composes/{id}/metadata", get(compose_metadata_handler))
        .route("/composes/{id}/logs", get(compose_logs_handler))
        .route("/composes/{id}/manifests", get(compose_manifests_handler))
        .route("/errors", get(error_list_handler))
        .route("/errors/{id}", get(error_handler))
        .route("/openapi", get(openapi_handler))
        .with_state(state)
}

fn reference(id: Uuid, kind: &str, path: &str) -> ObjectReference {
    ObjectReference {
        href: format!("{BASE_PATH}{path}"),
        id: id.to_string(),
        kind: kind.to_string(),
    }
}

/// Service-maintained images are discovered by the `composer-api-` name
/// prefix, so generated names must keep it.
fn generated_name() -> String {
    format!("composer-api-{}", Uuid::new_v4())
}

fn internal_image_type(image_type: ImageTypes) -> &'static str {
    match image_type {
        ImageTypes::Aws => "ami",
        ImageTypes::AwsRhui => "ec2",
        ImageTypes::AwsHaRhui => "ec2-ha",
        ImageTypes::AwsSapRhui => "ec2-sap",
        ImageTypes::Gcp => "gce",
        ImageTypes::Azure => "vhd",
        ImageTypes::GuestImage => "qcow2",
        ImageTypes::Vsphere => "vmdk",
        ImageTypes::ImageInstaller => "image-installer",
        ImageTypes::EdgeCommit => "edge-commit",
        ImageTypes::EdgeContainer => "edge-container",
        ImageTypes::EdgeInstaller => "edge-installer",
    }
}

fn repo_config(repo: &Repository) -> Result<RepoConfig, HttpError> {
    if repo.baseurl.is_none() && repo.mirrorlist.is_none() && repo.metalink.is_none() {
        return Err(HttpError::new(ServiceErrorCode::InvalidRepository));
    }
    Ok(RepoConfig {
        rhsm: repo.rhsm,
        baseurl: repo.baseurl.clone(),
        mirrorlist: repo.mirrorlist.clone(),
        metalink: repo.metalink.clone(),
        gpg_key: repo.gpg_key.clone(),
        check_gpg: repo.check_gpg,
        ignore_ssl: repo.ignore_ssl,
    })
}

fn payload_repo_config(repo: &Repository) -> Result<RepoConfig, HttpError> {
    if repo.baseurl.is_none() {
        return Err(HttpError::new(ServiceErrorCode::NoBaseURLInPayloadRepository));
    }
    Ok(RepoConfig {
        rhsm: false,
        baseurl: repo.baseurl.clone(),
        mirrorlist: None,
        metalink: None,
        gpg_key: repo.gpg_key.clone(),
        check_gpg: repo.check_gpg,
        ignore_ssl: repo.ignore_ssl,
    })
}

/// Decode the upload options into the target matching the image type. The
/// options are a tagged union keyed by `image_type`, so each arm decodes its
/// own shape.
fn build_target(
    image_type: ImageTypes,
    options: &Value,
    image_def: &ImageTypeDef,
    bucket: &str,
) -> Result<UploadTarget, HttpError> {
    let decode_error = |cause| HttpError::with_internal(ServiceErrorCode::JSONUnMarshallingError, cause);
    match image_type {
        ImageTypes::Aws | ImageTypes::AwsRhui | ImageTypes::AwsHaRhui | ImageTypes::AwsSapRhui => {
            let opts: AwsEc2UploadOptions =
                serde_json::from_value(options.clone()).map_err(decode_error)?;
            let key = generated_name();
            Ok(UploadTarget::Aws {
                filename: image_def.filename.clone(),
                region: opts.region,
                bucket: bucket.to_string(),
                image_name: opts.snapshot_name.unwrap_or_else(|| key.clone()),
                key,
                share_with_accounts: opts.share_with_accounts,
            })
        }
        ImageTypes::GuestImage
        | ImageTypes::Vsphere
        | ImageTypes::ImageInstaller
        | ImageTypes::EdgeInstaller
        | ImageTypes::EdgeContainer
        | ImageTypes::EdgeCommit => {
            let opts: AwsS3UploadOptions =
                serde_json::from_value(options.clone()).map_err(decode_error)?;
            let key = generated_name();
            Ok(UploadTarget::AwsS3 {
                filename: image_def.filename.clone(),
                region: opts.region,
                bucket: bucket.to_string(),
                image_name: key.clone(),
                key,
            })
        }
        ImageTypes::Gcp => {
            let opts: GcpUploadOptions =
                serde_json::from_value(options.clone()).map_err(decode_error)?;
            let object = generated_name();
            Ok(UploadTarget::Gcp {
                filename: image_def.filename.clone(),
                region: opts.region,
                bucket: opts.bucket,
                image_name: opts.image_name.unwrap_or_else(|| object.clone()),
                object,
                share_with_accounts: opts.share_with_accounts.unwrap_or_default(),
            })
        }
        ImageTypes::Azure => {
            let opts: AzureUploadOptions =
                serde_json::from_value(options.clone()).map_err(decode_error)?;
            Ok(UploadTarget::AzureImage {
                filename: image_def.filename.clone(),
                tenant_id: opts.tenant_id,
                subscription_id: opts.subscription_id,
                resource_group: opts.resource_group,
                location: opts.location,
                image_name: opts.image_name.unwrap_or_else(generated_name),
            })
        }
    }
}

async fn post_compose_handler(
    State(state): State<ComposeApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("application/json") {
        return Err(HttpError::new(ServiceErrorCode::UnsupportedMediaType));
    }
    let compose: ComposeRequest = serde_json::from_slice(&body)
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::BodyDecodingError, e))?;

    let distro = state
        .distros
        .get(&compose.distribution)
        .ok_or(HttpError::new(ServiceErrorCode::UnsupportedDistribution))?;

    let mut blueprint = Blueprint::default();
    blueprint
        .initialize()
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::FailedToInitializeBlueprint, e))?;

    let mut subscription = None;
    let mut payload_repositories: Vec<Repository> = Vec::new();
    if let Some(customizations) = &compose.customizations {
        if let Some(users) = &customizations.users {
            blueprint.customizations = Some(crate::compose::blueprint::Customizations {
                users: Some(
                    users
                        .iter()
                        .map(|user| UserCustomization {
                            name: user.name.clone(),
                            key: user.key.clone(),
                            groups: user.groups.clone(),
                        })
                        .collect(),
                ),
            });
        }
        if let Some(packages) = &customizations.packages {
            blueprint.packages = packages
                .iter()
                .map(|name| Package {
                    name: name.clone(),
                    version: None,
                })
                .collect();
        }
        subscription = customizations.subscription.clone();
        if let Some(repos) = &customizations.payload_repositories {
            payload_repositories = repos.clone();
        }
    }

    // One seed for every image of the compose so identical inputs produce
    // identical manifests.
    let manifest_seed: i64 = rand::random();

    // The API accepts a single request or an array; exactly one of the two.
    let image_requests = match (compose.image_request, compose.image_requests) {
        (Some(_), Some(_)) => {
            return Err(HttpError::new(ServiceErrorCode::InvalidNumberOfImageBuilds))
        }
        (Some(single), None) => vec![single],
        (None, Some(many)) if !many.is_empty() => many,
        _ => return Err(HttpError::new(ServiceErrorCode::InvalidNumberOfImageBuilds)),
    };

    let mut builds = Vec::with_capacity(image_requests.len());
    for image_request in &image_requests {
        let arch = distro
            .arch(&image_request.architecture)
            .ok_or(HttpError::new(ServiceErrorCode::UnsupportedArchitecture))?;
        let image_type = arch
            .image_type(internal_image_type(image_request.image_type))
            .ok_or(HttpError::new(ServiceErrorCode::UnsupportedImageType))?
            .clone();

        let repositories = image_request
            .repositories
            .iter()
            .map(repo_config)
            .collect::<Result<Vec<_>, _>>()?;

        let mut package_sets_repositories = std::collections::HashMap::new();
        if !payload_repositories.is_empty() {
            let payload_repos = payload_repositories
                .iter()
                .map(payload_repo_config)
                .collect::<Result<Vec<_>, _>>()?;
            for set in &image_type.payload_package_sets {
                package_sets_repositories.insert(set.clone(), payload_repos.clone());
            }
        }

        let mut ostree = OstreeSpec {
            reference: image_type.default_ostree_ref.clone().unwrap_or_default(),
            url: None,
        };
        if let Some(options) = &image_request.ostree {
            if let Some(requested_ref) = &options.reference {
                if !verify_ostree_ref(requested_ref) {
                    return Err(HttpError::new(ServiceErrorCode::InvalidOSTreeRef));
                }
                ostree.reference = requested_ref.clone();
            }
            ostree.url = options.url.clone();
        }

        let target = match &image_request.upload_options {
            None => {
                // Nowhere to put the image unless koji takes over the upload.
                if compose.koji.is_none() {
                    return Err(HttpError::new(ServiceErrorCode::JSONUnMarshallingError));
                }
                None
            }
            Some(options) => {
                if compose.koji.is_some() {
                    return Err(HttpError::new(ServiceErrorCode::JSONUnMarshallingError));
                }
                Some(build_target(
                    image_request.image_type,
                    options,
                    &image_type,
                    &state.bucket,
                )?)
            }
        };

        builds.push(ImageBuildRequest {
            image_options: ImageOptions {
                size: image_type.default_size,
                ostree,
                subscription: subscription.clone(),
            },
            image_type,
            arch: arch.name.clone(),
            repositories,
            package_sets_repositories,
            target,
        });
    }

    let enqueue_error = |error: ComposeError| match error {
        ComposeError::InvalidNumberOfImageBuilds => {
            HttpError::new(ServiceErrorCode::InvalidNumberOfImageBuilds)
        }
        ComposeError::Enqueue(cause) => {
            HttpError::with_internal(ServiceErrorCode::EnqueueingJob, cause)
        }
    };

    let id = match &compose.koji {
        Some(koji) => enqueue_koji_compose(
            &state.workers,
            state.manifest_deadline,
            &KojiParams {
                server: koji.server.clone(),
                task_id: koji.task_id,
                name: koji.name.clone(),
                version: koji.version.clone(),
                release: koji.release.clone(),
            },
            distro,
            &blueprint,
            manifest_seed,
            builds,
        )
        .await
        .map_err(enqueue_error)?,
        None => enqueue_compose(
            &state.workers,
            state.manifest_deadline,
            distro,
            &blueprint,
            manifest_seed,
            builds,
        )
        .await
        .map_err(enqueue_error)?,
    };

    tracing::info!(compose_id = %id, distribution = %compose.distribution, "Compose enqueued");

    Ok((
        StatusCode::CREATED,
        Json(reference(id, "ComposeId", "/compose")),
    )
        .into_response())
}

/// Decode the single target result of a build, if any, into the API upload
/// status.
fn upload_status_from_result(result: &OSBuildJobResult) -> Result<Option<UploadStatus>, HttpError> {
    let target_results = match &result.target_results {
        Some(targets) => targets,
        None => return Ok(None),
    };
    // Only a single upload target is allowed, so only a single result is.
    if target_results.len() != 1 {
        return Err(HttpError::new(ServiceErrorCode::SeveralUploadTargets));
    }
    let target: TargetResult = serde_json::from_value(target_results[0].clone())
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::UnknownUploadTarget, e))?;
    let (upload_type, options) = match target {
        TargetResult::Aws { ami, region } => {
            (UploadTypes::Aws, json!({ "ami": ami, "region": region }))
        }
        TargetResult::AwsS3 { url } => (UploadTypes::AwsS3, json!({ "url": url })),
        TargetResult::Gcp {
            image_name,
            project_id,
        } => (
            UploadTypes::Gcp,
            json!({ "image_name": image_name, "project_id": project_id }),
        ),
        TargetResult::AzureImage { image_name } => {
            (UploadTypes::Azure, json!({ "image_name": image_name }))
        }
    };
    Ok(Some(UploadStatus {
        status: result.upload_status.unwrap_or(UploadStatusValue::Pending),
        upload_type,
        options,
    }))
}

async fn compose_status_handler(
    State(state): State<ComposeApiState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let job_id =
        Uuid::parse_str(&id).map_err(|_| HttpError::new(ServiceErrorCode::InvalidComposeId))?;
    let kind = state
        .workers
        .job_kind(job_id)
        .await
        .map_err(|_| HttpError::new(ServiceErrorCode::ComposeNotFound))?;

    if kind == JOB_KIND_OSBUILD {
        let (status, result) = state.workers.osbuild_job_status(job_id).await.map_err(|e| {
            HttpError::with_internal(ServiceErrorCode::MalformedOSBuildJobResult, e)
        })?;
        let upload_status = upload_status_from_result(&result)?;
        Ok(Json(ComposeStatusResponse {
            reference: reference(job_id, "ComposeStatus", &format!("/composes/{job_id}")),
            status: compose_status_from_build(&status, &result),
            image_status: ImageStatus {
                status: image_status_from_build(&status, &result),
                upload_status,
            },
            image_statuses: None,
            koji_status: None,
        })
        .into_response())
    } else if kind == JOB_KIND_KOJI_FINALIZE {
        let (finalize_status, finalize_result) = state
            .workers
            .koji_finalize_job_status(job_id)
            .await
            .map_err(|e| {
                HttpError::with_internal(ServiceErrorCode::MalformedOSBuildJobResult, e)
            })?;
        if finalize_status.deps.len() < 2 {
            return Err(HttpError::new(
                ServiceErrorCode::UnexpectedNumberOfImageBuilds,
            ));
        }
        let (_, init_result) = state
            .workers
            .koji_init_job_status(finalize_status.deps[0])
            .await
            .map_err(|e| {
                HttpError::with_internal(ServiceErrorCode::MalformedOSBuildJobResult, e)
            })?;

        let mut build_results = Vec::new();
        let mut image_statuses = Vec::new();
        for build_id in &finalize_status.deps[1..] {
            let (build_status, build_result) = state
                .workers
                .osbuild_koji_job_status(*build_id)
                .await
                .map_err(|e| {
                    HttpError::with_internal(ServiceErrorCode::MalformedOSBuildJobResult, e)
                })?;
            image_statuses.push(ImageStatus {
                status: image_status_from_koji_build(&build_status, &init_result, &build_result),
                upload_status: None,
            });
            build_results.push(build_result);
        }

        Ok(Json(ComposeStatusResponse {
            reference: reference(job_id, "ComposeStatus", &format!("/composes/{job_id}")),
            status: compose_status_from_koji(
                &finalize_status,
                &init_result,
                &build_results,
                &finalize_result,
            ),
            image_status: image_statuses[0].clone(),
            image_statuses: Some(image_statuses),
            koji_status: Some(KojiStatus {
                build_id: (init_result.build_id != 0).then_some(init_result.build_id),
            }),
        })
        .into_response())
    } else {
        Err(HttpError::new(ServiceErrorCode::InvalidJobType))
    }
}

async fn compose_metadata_handler(
    State(state): State<ComposeApiState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let job_id =
        Uuid::parse_str(&id).map_err(|_| HttpError::new(ServiceErrorCode::InvalidComposeId))?;
    let kind = state
        .workers
        .job_kind(job_id)
        .await
        .map_err(|_| HttpError::new(ServiceErrorCode::ComposeNotFound))?;
    if kind != JOB_KIND_OSBUILD {
        return Err(HttpError::new(ServiceErrorCode::InvalidJobType));
    }

    let (status, result) = state
        .workers
        .osbuild_job_status(job_id)
        .await
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::ComposeNotFound, e))?;

    let metadata_reference = reference(
        job_id,
        "ComposeMetadata",
        &format!("/composes/{job_id}/metadata"),
    );

    // Still running, canceled or failed: no metadata to report.
    if status.finished_at.is_none() || status.canceled || !result.success {
        return Ok(Json(ComposeMetadataResponse {
            reference: metadata_reference,
            packages: None,
            ostree_commit: None,
        })
        .into_response());
    }

    let packages = result
        .packages
        .iter()
        .map(|package| PackageMetadata {
            package_type: "rpm".to_string(),
            name: package.name.clone(),
            version: package.version.clone(),
            release: package.release.clone(),
            epoch: (package.epoch != 0).then(|| package.epoch.to_string()),
            arch: package.arch.clone(),
            sigmd5: package.sigmd5.clone().unwrap_or_default(),
            signature: package.signature.clone(),
        })
        .collect();

    Ok(Json(ComposeMetadataResponse {
        reference: metadata_reference,
        packages: Some(packages),
        ostree_commit: result.ostree_commit.clone(),
    })
    .into_response())
}

async fn raw_result(state: &ComposeApiState, id: Uuid) -> Result<Value, HttpError> {
    let status = state
        .workers
        .job_status(id)
        .await
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::ComposeNotFound, e))?;
    match status.result {
        Some(raw) => serde_json::from_str(raw.get()).map_err(|e| {
            HttpError::with_internal(ServiceErrorCode::MalformedOSBuildJobResult, e)
        }),
        None => Ok(Value::Null),
    }
}

async fn compose_logs_handler(
    State(state): State<ComposeApiState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let job_id =
        Uuid::parse_str(&id).map_err(|_| HttpError::new(ServiceErrorCode::InvalidComposeId))?;
    let kind = state
        .workers
        .job_kind(job_id)
        .await
        .map_err(|_| HttpError::new(ServiceErrorCode::ComposeNotFound))?;
    if kind != JOB_KIND_KOJI_FINALIZE {
        return Err(HttpError::new(ServiceErrorCode::InvalidJobType));
    }

    let (finalize_status, _) = state
        .workers
        .koji_finalize_job_status(job_id)
        .await
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::ComposeNotFound, e))?;
    if finalize_status.deps.is_empty() {
        return Err(HttpError::new(
            ServiceErrorCode::UnexpectedNumberOfImageBuilds,
        ));
    }

    // Worker result blobs are returned as-is; their contents are meant for
    // humans digging through build logs, not for API clients.
    let init = raw_result(&state, finalize_status.deps[0]).await?;
    let import = raw_result(&state, job_id).await?;
    let mut image_builds = Vec::new();
    for build_id in &finalize_status.deps[1..] {
        image_builds.push(raw_result(&state, *build_id).await?);
    }

    Ok(Json(ComposeLogsResponse {
        reference: reference(job_id, "ComposeLogs", &format!("/composes/{job_id}/logs")),
        image_builds,
        koji: Some(KojiLogs { init, import }),
    })
    .into_response())
}

async fn compose_manifests_handler(
    State(state): State<ComposeApiState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let job_id =
        Uuid::parse_str(&id).map_err(|_| HttpError::new(ServiceErrorCode::InvalidComposeId))?;
    let kind = state
        .workers
        .job_kind(job_id)
        .await
        .map_err(|_| HttpError::new(ServiceErrorCode::ComposeNotFound))?;
    if kind != JOB_KIND_KOJI_FINALIZE {
        return Err(HttpError::new(ServiceErrorCode::InvalidJobType));
    }

    let (finalize_status, _) = state
        .workers
        .koji_finalize_job_status(job_id)
        .await
        .map_err(|e| HttpError::with_internal(ServiceErrorCode::ComposeNotFound, e))?;

    let mut manifests = Vec::new();
    for build_id in &finalize_status.deps[1..] {
        // Build jobs depend on their manifest job first.
        let build_status = state
            .workers
            .job_status(*build_id)
            .await
            .map_err(|e| HttpError::with_internal(ServiceErrorCode::ComposeNotFound, e))?;
        let manifest_id = build_status
            .deps
            .first()
            .copied()
            .ok_or(HttpError::new(ServiceErrorCode::ComposeNotFound))?;
        let (_, manifest_result) = state
            .workers
            .manifest_job_status(manifest_id)
            .await
            .map_err(|e| HttpError::with_internal(ServiceErrorCode::ComposeNotFound, e))?;
        manifests.push(manifest_result.manifest.unwrap_or(Value::Null));
    }

    Ok(Json(ComposeManifestsResponse {
        reference: reference(
            job_id,
            "ComposeManifests",
            &format!("/composes/{job_id}/manifests"),
        ),
        manifests,
    })
    .into_response())
}

#[derive(Deserialize)]
struct ErrorListParams {
    page: Option<String>,
    size: Option<String>,
}

async fn error_list_handler(
    Query(params): Query<ErrorListParams>,
) -> Result<Response, HttpError> {
    let page = match params.page {
        Some(raw) => raw
            .parse()
            .map_err(|_| HttpError::new(ServiceErrorCode::InvalidPageParam))?,
        None => 0,
    };
    let size = match params.size {
        Some(raw) => raw
            .parse()
            .map_err(|_| HttpError::new(ServiceErrorCode::InvalidSizeParam))?,
        None => 100,
    };
    Ok(Json(error_list(page, size)).into_response())
}

async fn error_handler(Path(id): Path<String>) -> Result<Response, HttpError> {
    let error_id: u32 = id
        .parse()
        .map_err(|_| HttpError::new(ServiceErrorCode::InvalidErrorId))?;
    match ServiceErrorCode::from_id(error_id) {
        Some(code) => Ok(Json(api_error(code)).into_response()),
        None => Err(HttpError::new(ServiceErrorCode::ErrorNotFound)),
    }
}

async fn openapi_handler() -> Response {
    Json(json!({
        "openapi": "3.0.1",
        "info": {
            "title": "Image-builder composer API",
            "version": "2",
        },
        "paths": {
            "/compose": { "post": { "summary": "Submit a compose request" } },
            "/composes/{id}": { "get": { "summary": "The status of a compose" } },
            "/composes/{id}/metadata": { "get": { "summary": "Package metadata of a finished compose" } },
            "/composes/{id}/logs": { "get": { "summary": "Build logs of a koji compose" } },
            "/composes/{id}/manifests": { "get": { "summary": "Manifests of a koji compose" } },
            "/errors": { "get": { "summary": "The service error catalog" } },
            "/errors/{id}": { "get": { "summary": "One catalog entry" } },
            "/openapi": { "get": { "summary": "This document" } },
        },
    }))
    .into_response()
}
