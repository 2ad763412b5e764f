use std::path::PathBuf;

use recog_core::CoreError;
use recog_describe::DescribeError;
use recog_detect::DetectError;
use recog_pose::PoseError;

#[derive(thiserror::Error, Debug)]
pub enum RecogError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Describe(#[from] DescribeError),

    #[error(transparent)]
    Pose(#[from] PoseError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Refusing to persist: object not found in {0}")]
    NotFound(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(PathBuf),
}

pub type RecogResult<T> = Result<T, RecogError>;
