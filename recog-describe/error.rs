use recog_core::CoreError;
use recog_detect::DetectError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DescribeError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("Descriptor size mismatch: {left} vs {right}")]
    SizeMismatch { left: usize, right: usize },

    #[error("Invalid HOG geometry: block size {block_size} must be a positive multiple of histogram size {histo_size}")]
    InvalidGeometry { histo_size: usize, block_size: usize },

    #[error("Invalid bin count {0} (must be >= 1)")]
    InvalidBins(usize),

    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("Pyramid has no layer {layer} in octave {octave}")]
    MissingLayer { octave: usize, layer: usize },
}

pub type DescribeResult<T> = Result<T, DescribeError>;
