/// Precondition failures of the core image and convolution types.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid image dimensions: {height}x{width}x{channels} (must be > 0)")]
    ZeroSizeImage {
        height: usize,
        width: usize,
        channels: usize,
    },

    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData {
        expected_len: usize,
        actual_len: usize,
    },

    #[error("Pixel ({row}, {col}) out of range for {height}x{width} image")]
    OutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("Image shapes differ: {0:?} vs {1:?}")]
    ShapeMismatch((usize, usize, usize), (usize, usize, usize)),

    #[error("Expected a {expected}-channel image, got {actual} channels")]
    UnsupportedChannels { expected: usize, actual: usize },

    #[error("Invalid kernel: {0}")]
    InvalidKernel(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
