pub mod assembler;
pub mod blueprint;
pub mod manifest;
pub mod status;

pub use assembler::{
    enqueue_compose, enqueue_koji_compose, ComposeError, ImageBuildRequest, ImageOptions,
    KojiParams, OstreeSpec,
};
pub use blueprint::Blueprint;
