//! Keypoint detection: Gaussian scale space, corner and blob detectors, and
//! adaptive non-maximum suppression.
//!
//! ```no_run
//! use recog_core::Image;
//! use recog_detect::DetectorBuilder;
//!
//! # fn main() -> Result<(), recog_detect::DetectError> {
//! let image = Image::new(128, 128, 1)?;
//! let detector = DetectorBuilder::new().suppression(200, None).build()?;
//! let detection = detector.detect(&image)?;
//! println!("{} keypoints", detection.points.len());
//! # Ok(())
//! # }
//! ```

pub mod blobs;
pub mod builder;
pub mod config;
pub mod configured_detector;
pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod pyramid;
pub mod suppression;

pub use blobs::{blobs, shi_tomasi, ShiTomasiParams};
pub use builder::DetectorBuilder;
pub use config::DetectorConfig;
pub use configured_detector::ConfiguredDetector;
pub use corner_detection::{harris, harris_response, moravec, moravec_response, HarrisParams, MoravecParams};
pub use detector::{Detection, DetectorKind};
pub use error::{DetectError, DetectResult};
pub use pyramid::{max_octave_count, Layer, OctaveCount, Pyramid, PyramidConfig};
pub use suppression::{adaptive_non_maximum_suppression, default_radius, euclidean_distance, SuppressionConfig};
