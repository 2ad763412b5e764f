#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("Invalid pose parameter: {name} = {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("Invalid {what} dimensions: {width}x{height} (must be > 0)")]
    InvalidDimensions {
        what: &'static str,
        width: usize,
        height: usize,
    },
}

pub type PoseResult<T> = Result<T, PoseError>;
