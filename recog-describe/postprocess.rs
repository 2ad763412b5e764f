//! Ordered descriptor post-processing steps.

use crate::descriptor::Descriptor;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PostProcess {
    Normalize,
    /// Clip coefficients to an upper bound.
    Trim(f32),
}

impl PostProcess {
    pub fn apply(&self, descriptor: &Descriptor) -> Descriptor {
        match *self {
            PostProcess::Normalize => descriptor.normalize(),
            PostProcess::Trim(bound) => descriptor.trim(bound),
        }
    }

    /// `[Normalize, Trim(0.2), Normalize]`
    pub fn default_pipeline() -> Vec<PostProcess> {
        vec![PostProcess::Normalize, PostProcess::Trim(0.2), PostProcess::Normalize]
    }
}

/// Run `steps` left to right.
pub fn apply_all(steps: &[PostProcess], descriptor: Descriptor) -> Descriptor {
    steps.iter().fold(descriptor, |d, step| step.apply(&d))
}
