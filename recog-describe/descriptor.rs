use recog_core::Point;

use crate::error::{DescribeError, DescribeResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed-length feature vector anchored at the point it was computed at.
///
/// The coefficient count never changes after construction; every transform
/// returns a new descriptor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Descriptor {
    pub point: Point,
    coefficients: Vec<f32>,
}

impl Descriptor {
    pub fn new(point: Point, coefficients: Vec<f32>) -> Self {
        Self {
            point,
            coefficients,
        }
    }

    pub fn size(&self) -> usize {
        self.coefficients.len()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    pub fn into_coefficients(self) -> Vec<f32> {
        self.coefficients
    }

    fn with_coefficients(&self, coefficients: Vec<f32>) -> Self {
        Self {
            point: self.point,
            coefficients,
        }
    }

    /// Largest coefficient magnitude.
    fn max_abs(&self) -> f32 {
        self.coefficients.iter().fold(0.0f32, |m, c| m.max(c.abs()))
    }

    /// L2 norm of the coefficients.
    ///
    /// Coefficients are scaled by the largest magnitude before squaring so tiny
    /// vectors do not underflow to zero.
    pub fn norm(&self) -> f32 {
        let scale = self.max_abs();
        if !(scale > 0.0) {
            return 0.0;
        }
        scale * self.scaled_norm(scale)
    }

    fn scaled_norm(&self, scale: f32) -> f32 {
        self.coefficients
            .iter()
            .map(|c| {
                let v = c / scale;
                v * v
            })
            .sum::<f32>()
            .sqrt()
    }

    /// Unit-length copy; the zero vector stays zero.
    pub fn normalize(&self) -> Self {
        let scale = self.max_abs();
        if !(scale > 0.0) {
            return self.with_coefficients(vec![0.0; self.size()]);
        }
        let norm = self.scaled_norm(scale);
        self.with_coefficients(self.coefficients.iter().map(|c| c / scale / norm).collect())
    }

    /// Copy with every coefficient clipped to at most `bound`.
    pub fn trim(&self, bound: f32) -> Self {
        self.with_coefficients(self.coefficients.iter().map(|&c| c.min(bound)).collect())
    }

    /// Euclidean distance; both descriptors must have the same size.
    pub fn distance(&self, other: &Descriptor) -> DescribeResult<f32> {
        if self.size() != other.size() {
            return Err(DescribeError::SizeMismatch {
                left: self.size(),
                right: other.size(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(&other.coefficients)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt())
    }

    /// Up to `count` bin indices holding at least `threshold * max`, strongest first.
    ///
    /// Equal values keep ascending index order. Empty when no coefficient is positive.
    pub fn peaks(&self, threshold: f32, count: usize) -> Vec<usize> {
        let max = self.coefficients.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if !(max > 0.0) {
            return Vec::new();
        }
        let cutoff = threshold * max;
        let mut indices: Vec<usize> = (0..self.size())
            .filter(|&i| self.coefficients[i] >= cutoff)
            .collect();
        indices.sort_by(|&a, &b| self.coefficients[b].total_cmp(&self.coefficients[a]));
        indices.truncate(count);
        indices
    }
}
