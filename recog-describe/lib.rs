//! Local descriptors built from histograms of oriented gradients, and
//! nearest-neighbour matching between descriptor sets.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod hog;
pub mod matching;
pub mod postprocess;

pub use config::{DescriptorConfig, DescriptorKind};
pub use descriptor::Descriptor;
pub use error::{DescribeError, DescribeResult};
pub use hog::{
    dominant_orientations, histogrid, hog, rhistogrid, rotated_hog, rsi_descriptors, si_descriptors,
    HogParams, OrientationParams,
};
pub use matching::{match_descriptors, Match, MatcherConfig};
pub use postprocess::{apply_all, PostProcess};
