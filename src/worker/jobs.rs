//! Typed job payloads exchanged between the compose front-end and workers.
//!
//! The queue itself stores args and results as opaque JSON; these are the
//! shapes the two sides agree on for each job type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Repository configuration passed to depsolve jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default)]
    pub rhsm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseurl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirrorlist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metalink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_gpg: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_ssl: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepsolveJob {
    pub package_sets: HashMap<String, Vec<String>>,
    pub repos: Vec<RepoConfig>,
    pub module_platform_id: String,
    pub arch: String,
    pub releasever: String,
    #[serde(default)]
    pub package_sets_repositories: HashMap<String, Vec<RepoConfig>>,
}

/// One resolved package, identified by its NEVRA plus header digests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub arch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigmd5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepsolveJobResult {
    #[serde(default)]
    pub package_specs: Vec<PackageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<WorkerError>,
}

/// Manifest jobs carry no arguments: the service resolves them out-of-band
/// from the depsolve result of their single dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestJobByID {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestJobByIDResult {
    pub manifest: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<WorkerError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineNames {
    pub build: Vec<String>,
    pub payload: Vec<String>,
}

/// Where a finished image is uploaded. Tagged by the upload driver name so
/// workers can route without structural matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum UploadTarget {
    #[serde(rename = "org.osbuild.aws")]
    Aws {
        filename: String,
        region: String,
        bucket: String,
        key: String,
        image_name: String,
        #[serde(default)]
        share_with_accounts: Vec<String>,
    },
    #[serde(rename = "org.osbuild.aws.s3")]
    AwsS3 {
        filename: String,
        region: String,
        bucket: String,
        key: String,
        image_name: String,
    },
    #[serde(rename = "org.osbuild.gcp")]
    Gcp {
        filename: String,
        region: String,
        bucket: String,
        object: String,
        image_name: String,
        #[serde(default)]
        share_with_accounts: Vec<String>,
    },
    #[serde(rename = "org.osbuild.azure.image")]
    AzureImage {
        filename: String,
        tenant_id: String,
        subscription_id: String,
        resource_group: String,
        location: String,
        image_name: String,
    },
}

/// Per-target outcome reported by a build worker, keyed like
/// [`UploadTarget`] with the driver-specific fields under `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "options")]
pub enum TargetResult {
    #[serde(rename = "org.osbuild.aws")]
    Aws { ami: String, region: String },
    #[serde(rename = "org.osbuild.aws.s3")]
    AwsS3 { url: String },
    #[serde(rename = "org.osbuild.gcp")]
    Gcp { image_name: String, project_id: String },
    #[serde(rename = "org.osbuild.azure.image")]
    AzureImage { image_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatusValue {
    Pending,
    Running,
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OSBuildJob {
    pub image_name: String,
    pub targets: Vec<UploadTarget>,
    pub exports: Vec<String>,
    pub pipeline_names: PipelineNames,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OSBuildJobResult {
    #[serde(default)]
    pub success: bool,
    /// NEVRA metadata of the packages installed into the image.
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostree_commit: Option<String>,
    /// Raw per-target results; decoded by the status projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_results: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<UploadStatusValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<WorkerError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KojiInitJob {
    pub server: String,
    pub name: String,
    pub version: String,
    pub release: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KojiInitJobResult {
    #[serde(default)]
    pub build_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<WorkerError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OSBuildKojiJob {
    pub image_name: String,
    pub exports: Vec<String>,
    pub pipeline_names: PipelineNames,
    pub koji_server: String,
    pub koji_directory: String,
    pub koji_filename: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OSBuildKojiJobResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostree_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<WorkerError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KojiFinalizeJob {
    pub server: String,
    pub name: String,
    pub version: String,
    pub release: String,
    pub koji_filenames: Vec<String>,
    pub koji_directory: String,
    pub task_id: u64,
    pub start_time: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KojiFinalizeJobResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_error: Option<WorkerError>,
}

/// Error a worker (or the in-process manifest task) embeds in a job result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerError {
    pub id: u32,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl WorkerError {
    pub fn new(id: u32, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
            details: None,
        }
    }
}

/// Stable ids for [`WorkerError`], shared between workers and the service.
pub mod client_errors {
    pub const ERROR_NO_DYNAMIC_ARGS: u32 = 1;
    pub const ERROR_PARSING_DYNAMIC_ARGS: u32 = 2;
    pub const ERROR_READING_JOB_STATUS: u32 = 3;
    pub const ERROR_DEPSOLVE_DEPENDENCY: u32 = 4;
    pub const ERROR_MANIFEST_GENERATION: u32 = 5;
    pub const ERROR_DNF_DEPSOLVE: u32 = 10;
    pub const ERROR_DNF_MARKING: u32 = 11;
    pub const ERROR_BUILD: u32 = 20;
    pub const ERROR_UPLOAD: u32 = 21;
}
