//! The service error catalog.
//!
//! Every error the compose API can return has a stable numeric id. The
//! catalog itself is served at `/errors` so clients can enumerate the codes
//! they may encounter; `/errors/{id}` returns a single entry. Internal
//! causes are logged, never returned to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const ERROR_HREF: &str = "/api/image-builder-composer/v2/errors";
pub const ERROR_CODE_PREFIX: &str = "IMAGE-BUILDER-COMPOSER-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ServiceErrorCode {
    UnsupportedDistribution = 1,
    UnsupportedArchitecture = 2,
    UnsupportedImageType = 3,
    InvalidRepository = 4,
    InvalidNumberOfImageBuilds = 5,
    InvalidOSTreeRef = 6,
    NoBaseURLInPayloadRepository = 7,
    UnsupportedMediaType = 8,
    BodyDecodingError = 9,
    InvalidComposeId = 10,
    InvalidErrorId = 11,
    InvalidPageParam = 12,
    InvalidSizeParam = 13,
    JSONMarshallingError = 14,
    JSONUnMarshallingError = 15,
    EnqueueingJob = 16,
    FailedToInitializeBlueprint = 17,
    FailedToGenerateManifestSeed = 18,
    MalformedOSBuildJobResult = 19,
    SeveralUploadTargets = 20,
    UnknownUploadTarget = 21,
    UnexpectedNumberOfImageBuilds = 22,
    InvalidJobType = 23,
    FailedToLoadOpenAPISpec = 24,
    ComposeNotFound = 25,
    ServiceErrorNotFound = 26,
    ErrorNotFound = 27,
}

const ALL_CODES: &[ServiceErrorCode] = &[
    ServiceErrorCode::UnsupportedDistribution,
    ServiceErrorCode::UnsupportedArchitecture,
    ServiceErrorCode::UnsupportedImageType,
    ServiceErrorCode::InvalidRepository,
    ServiceErrorCode::InvalidNumberOfImageBuilds,
    ServiceErrorCode::InvalidOSTreeRef,
    ServiceErrorCode::NoBaseURLInPayloadRepository,
    ServiceErrorCode::UnsupportedMediaType,
    ServiceErrorCode::BodyDecodingError,
    ServiceErrorCode::InvalidComposeId,
    ServiceErrorCode::InvalidErrorId,
    ServiceErrorCode::InvalidPageParam,
    ServiceErrorCode::InvalidSizeParam,
    ServiceErrorCode::JSONMarshallingError,
    ServiceErrorCode::JSONUnMarshallingError,
    ServiceErrorCode::EnqueueingJob,
    ServiceErrorCode::FailedToInitializeBlueprint,
    ServiceErrorCode::FailedToGenerateManifestSeed,
    ServiceErrorCode::MalformedOSBuildJobResult,
    ServiceErrorCode::SeveralUploadTargets,
    ServiceErrorCode::UnknownUploadTarget,
    ServiceErrorCode::UnexpectedNumberOfImageBuilds,
    ServiceErrorCode::InvalidJobType,
    ServiceErrorCode::FailedToLoadOpenAPISpec,
    ServiceErrorCode::ComposeNotFound,
    ServiceErrorCode::ServiceErrorNotFound,
    ServiceErrorCode::ErrorNotFound,
];

impl ServiceErrorCode {
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        ALL_CODES.iter().copied().find(|code| code.id() == id)
    }

    pub fn all() -> &'static [ServiceErrorCode] {
        ALL_CODES
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::UnsupportedDistribution => "Unsupported distribution",
            Self::UnsupportedArchitecture => "Unsupported architecture",
            Self::UnsupportedImageType => "Unsupported image type",
            Self::InvalidRepository => "Must specify baseurl, mirrorlist or metalink",
            Self::InvalidNumberOfImageBuilds => "Compose must specify exactly one image request",
            Self::InvalidOSTreeRef => "Invalid OSTree ref",
            Self::NoBaseURLInPayloadRepository => "Payload repository has no baseurl",
            Self::UnsupportedMediaType => "Only 'application/json' content is supported",
            Self::BodyDecodingError => "Malformed request body",
            Self::InvalidComposeId => "Compose id is not a valid uuid",
            Self::InvalidErrorId => "Error id must be an integer",
            Self::InvalidPageParam => "Invalid format for page param",
            Self::InvalidSizeParam => "Invalid format for size param",
            Self::JSONMarshallingError => "Failed to marshal JSON",
            Self::JSONUnMarshallingError => "Failed to unmarshal JSON",
            Self::EnqueueingJob => "Failed to enqueue job",
            Self::FailedToInitializeBlueprint => "Failed to initialize blueprint",
            Self::FailedToGenerateManifestSeed => "Failed to generate manifest seed",
            Self::MalformedOSBuildJobResult => "Job result is malformed",
            Self::SeveralUploadTargets => "Compose has more than one upload target",
            Self::UnknownUploadTarget => "Unknown upload target",
            Self::UnexpectedNumberOfImageBuilds => "Compose has an unexpected number of image builds",
            Self::InvalidJobType => "Job type does not match the request",
            Self::FailedToLoadOpenAPISpec => "Failed to load the OpenAPI specification",
            Self::ComposeNotFound => "Compose not found",
            Self::ServiceErrorNotFound => "Service error not found",
            Self::ErrorNotFound => "Error not found",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::ComposeNotFound | Self::ErrorNotFound => StatusCode::NOT_FOUND,
            Self::EnqueueingJob
            | Self::FailedToInitializeBlueprint
            | Self::FailedToGenerateManifestSeed
            | Self::MalformedOSBuildJobResult
            | Self::SeveralUploadTargets
            | Self::UnknownUploadTarget
            | Self::UnexpectedNumberOfImageBuilds
            | Self::InvalidJobType
            | Self::FailedToLoadOpenAPISpec
            | Self::ServiceErrorNotFound => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Wire shape of one catalog entry, also used as the error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub href: String,
    pub id: String,
    pub kind: &'static str,
    pub code: String,
    pub reason: String,
}

pub fn api_error(code: ServiceErrorCode) -> ApiError {
    let id = code.id();
    ApiError {
        href: format!("{ERROR_HREF}/{id}"),
        id: id.to_string(),
        kind: "Error",
        code: format!("{ERROR_CODE_PREFIX}{id}"),
        reason: code.reason().to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorList {
    pub kind: &'static str,
    pub page: i64,
    pub size: i64,
    pub total: usize,
    pub items: Vec<ApiError>,
}

pub fn error_list(page: i64, size: i64) -> ErrorList {
    let all = ServiceErrorCode::all();
    let offset = (page.max(0) as usize).saturating_mul(size.max(0) as usize);
    let items = all
        .iter()
        .skip(offset)
        .take(size.max(0) as usize)
        .map(|code| api_error(*code))
        .collect();
    ErrorList {
        kind: "ErrorList",
        page,
        size,
        total: all.len(),
        items,
    }
}

/// An error response on its way out of a handler. The internal cause, if
/// any, only ever reaches the log.
#[derive(Debug)]
pub struct HttpError {
    code: ServiceErrorCode,
}

impl HttpError {
    pub fn new(code: ServiceErrorCode) -> Self {
        Self { code }
    }

    pub fn with_internal(code: ServiceErrorCode, cause: impl std::fmt::Display) -> Self {
        tracing::warn!(code = code.id(), %cause, "Request failed");
        Self { code }
    }

    pub fn code(&self) -> ServiceErrorCode {
        self.code
    }
}

impl From<ServiceErrorCode> for HttpError {
    fn from(code: ServiceErrorCode) -> Self {
        Self::new(code)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(api_error(self.code))).into_response()
    }
}
