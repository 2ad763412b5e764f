//! Pose estimation from feature matches: a generalized Hough transform over
//! 2D similarity transforms, least-squares refinement and inlier verification.

pub mod config;
pub mod error;
pub mod hough;
pub mod transform;
pub mod verify;

pub use config::PoseConfig;
pub use error::{PoseError, PoseResult};
pub use hough::{hough, rotation_difference};
pub use transform::{wrap_angle, Transform2d};
pub use verify::{count_inliers, estimate_pose, verify, Hypothesis};
