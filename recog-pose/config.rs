use crate::error::{PoseError, PoseResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hough accumulator quantization and verification thresholds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseConfig {
    /// Translation bin width as a fraction of the object's larger side.
    pub translation_bin_fraction: f32,
    /// Rotation bin width in degrees; must divide 360.
    pub rotation_bin_degrees: f32,
    /// Scale bin width in octaves (log2 units).
    pub scale_bin_octaves: f32,
    /// Votes the winning bin needs to produce a candidate.
    pub min_votes: usize,
    /// Pixel distance under which a match supports a transform.
    pub inlier_tolerance: f32,
    /// Hypotheses with an inlier ratio at or below this are rejected.
    pub acceptance_threshold: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            translation_bin_fraction: 0.25,
            rotation_bin_degrees: 30.0,
            scale_bin_octaves: 1.0,
            min_votes: 3,
            inlier_tolerance: 3.0,
            acceptance_threshold: 0.5,
        }
    }
}

impl PoseConfig {
    pub fn validate(&self) -> PoseResult<()> {
        let positive = [
            ("translation_bin_fraction", self.translation_bin_fraction),
            ("rotation_bin_degrees", self.rotation_bin_degrees),
            ("scale_bin_octaves", self.scale_bin_octaves),
            ("inlier_tolerance", self.inlier_tolerance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(PoseError::InvalidParameter { name, value });
            }
        }
        let bins = 360.0 / self.rotation_bin_degrees;
        if (bins - bins.round()).abs() > 1e-3 || bins.round() < 3.0 {
            return Err(PoseError::InvalidParameter {
                name: "rotation_bin_degrees",
                value: self.rotation_bin_degrees,
            });
        }
        if !(0.0..1.0).contains(&self.acceptance_threshold) {
            return Err(PoseError::InvalidParameter {
                name: "acceptance_threshold",
                value: self.acceptance_threshold,
            });
        }
        if self.min_votes == 0 {
            return Err(PoseError::InvalidParameter {
                name: "min_votes",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Number of rotation bins around the circle.
    pub fn rotation_bins(&self) -> i64 {
        (360.0 / self.rotation_bin_degrees).round() as i64
    }
}
