//! Projection of raw job status into the user-visible compose and image
//! states.

use serde::{Deserialize, Serialize};

use crate::queue::JobStatus;
use crate::worker::jobs::{
    KojiFinalizeJobResult, KojiInitJobResult, OSBuildJobResult, OSBuildKojiJobResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatusValue {
    Pending,
    Building,
    Uploading,
    Registering,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeStatusValue {
    Pending,
    Success,
    Failure,
}

pub fn image_status_from_build(status: &JobStatus, result: &OSBuildJobResult) -> ImageStatusValue {
    if status.canceled {
        return ImageStatusValue::Failure;
    }
    if status.started_at.is_none() {
        return ImageStatusValue::Pending;
    }
    if status.finished_at.is_none() {
        // Uploading and registering are reserved for worker-reported
        // sub-states.
        return ImageStatusValue::Building;
    }
    if result.success {
        ImageStatusValue::Success
    } else {
        ImageStatusValue::Failure
    }
}

pub fn image_status_from_koji_build(
    status: &JobStatus,
    init: &KojiInitJobResult,
    build: &OSBuildKojiJobResult,
) -> ImageStatusValue {
    if status.canceled {
        return ImageStatusValue::Failure;
    }
    if init.job_error.is_some() {
        return ImageStatusValue::Failure;
    }
    if status.started_at.is_none() {
        return ImageStatusValue::Pending;
    }
    if status.finished_at.is_none() {
        return ImageStatusValue::Building;
    }
    if build.job_error.is_some() {
        return ImageStatusValue::Failure;
    }
    ImageStatusValue::Success
}

pub fn compose_status_from_build(
    status: &JobStatus,
    result: &OSBuildJobResult,
) -> ComposeStatusValue {
    if status.canceled {
        return ComposeStatusValue::Failure;
    }
    if status.finished_at.is_none() {
        return ComposeStatusValue::Pending;
    }
    if result.success {
        ComposeStatusValue::Success
    } else {
        ComposeStatusValue::Failure
    }
}

pub fn compose_status_from_koji(
    status: &JobStatus,
    init: &KojiInitJobResult,
    builds: &[OSBuildKojiJobResult],
    finalize: &KojiFinalizeJobResult,
) -> ComposeStatusValue {
    if status.canceled {
        return ComposeStatusValue::Failure;
    }
    if status.finished_at.is_none() {
        return ComposeStatusValue::Pending;
    }
    if init.job_error.is_some() {
        return ComposeStatusValue::Failure;
    }
    if builds.iter().any(|build| build.job_error.is_some()) {
        return ComposeStatusValue::Failure;
    }
    if finalize.job_error.is_some() {
        return ComposeStatusValue::Failure;
    }
    ComposeStatusValue::Success
}
