use recog_core::CoreError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid threshold: {name} = {value} (must be finite and >= 0)")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("Invalid pyramid configuration: {0}")]
    InvalidPyramid(String),

    #[error("Invalid window radius {0} (must be >= 1)")]
    InvalidWindow(usize),

    #[error("Invalid suppression: {0}")]
    InvalidSuppression(String),
}

pub type DetectResult<T> = Result<T, DetectError>;
