//! Wire types of the compose API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compose::blueprint::Subscription;
use crate::compose::status::{ComposeStatusValue, ImageStatusValue};
use crate::worker::jobs::UploadStatusValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub distribution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_request: Option<ImageRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_requests: Option<Vec<ImageRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customizations: Option<Customizations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub koji: Option<KojiRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub architecture: String,
    pub image_type: ImageTypes,
    pub repositories: Vec<Repository>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostree: Option<OSTree>,
    /// Shape depends on `image_type`; decoded by the handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_options: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageTypes {
    Aws,
    AwsRhui,
    AwsHaRhui,
    AwsSapRhui,
    Azure,
    EdgeCommit,
    EdgeContainer,
    EdgeInstaller,
    Gcp,
    GuestImage,
    ImageInstaller,
    Vsphere,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OSTree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customizations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_repositories: Option<Vec<Repository>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KojiRequest {
    pub server: String,
    pub task_id: u64,
    pub name: String,
    pub version: String,
    pub release: String,
}

// Upload option shapes, keyed by image type.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsEc2UploadOptions {
    pub region: String,
    pub share_with_accounts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsS3UploadOptions {
    pub region: String,
}

/// Accounts in `share_with_accounts` take the documented prefixes
/// `user:`, `serviceAccount:`, `group:` or `domain:`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpUploadOptions {
    pub region: String,
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_accounts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureUploadOptions {
    pub tenant_id: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
}

// Response types. Every payload wraps an ObjectReference.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectReference {
    pub href: String,
    pub id: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeStatusResponse {
    #[serde(flatten)]
    pub reference: ObjectReference,
    pub status: ComposeStatusValue,
    pub image_status: ImageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_statuses: Option<Vec<ImageStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub koji_status: Option<KojiStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStatus {
    pub status: ImageStatusValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<UploadStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadStatus {
    pub status: UploadStatusValue,
    #[serde(rename = "type")]
    pub upload_type: UploadTypes,
    pub options: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadTypes {
    #[serde(rename = "aws")]
    Aws,
    #[serde(rename = "aws.s3")]
    AwsS3,
    #[serde(rename = "gcp")]
    Gcp,
    #[serde(rename = "azure")]
    Azure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KojiStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeMetadataResponse {
    #[serde(flatten)]
    pub reference: ObjectReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<PackageMetadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostree_commit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(rename = "type")]
    pub package_type: String,
    pub name: String,
    pub version: String,
    pub release: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epoch: Option<String>,
    pub arch: String,
    pub sigmd5: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeLogsResponse {
    #[serde(flatten)]
    pub reference: ObjectReference,
    pub image_builds: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub koji: Option<KojiLogs>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KojiLogs {
    pub init: Value,
    pub import: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeManifestsResponse {
    #[serde(flatten)]
    pub reference: ObjectReference,
    pub manifests: Vec<Value>,
}
