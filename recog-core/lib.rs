//! Core value types shared by every stage of the recognition pipeline.

pub mod border;
pub mod convolution;
pub mod error;
pub mod gradient;
pub mod image;

pub use border::BorderPolicy;
pub use convolution::Kernel;
pub use error::{CoreError, CoreResult};
pub use gradient::Gradients;
pub use image::Image;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scale-space coordinates of a point detected on a pyramid layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scale {
    pub octave: usize,
    pub layer: usize,
    /// Blur of the layer relative to the input image (already includes the octave factor).
    pub sigma: f32,
}

impl Scale {
    /// Ratio between base-image pixels and pixels of this octave.
    pub fn factor(&self) -> f32 {
        (1usize << self.octave) as f32
    }
}

/// Interest point ≙ pixel position + detector response.
///
/// `row`/`col` are expressed in the pixel grid the point was found on: the
/// input image for single-image detectors, the octave resolution for points
/// carrying a [`Scale`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub row: usize,
    pub col: usize,
    pub score: f32,
    /// Dominant orientation in radians, 0 until a rotation-invariant descriptor assigns one.
    pub angle: f32,
    pub scale: Option<Scale>,
}

impl Point {
    pub fn new(row: usize, col: usize, score: f32) -> Self {
        Self {
            row,
            col,
            score,
            angle: 0.0,
            scale: None,
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Position as `(x, y)` in input-image pixels.
    pub fn position(&self) -> (f32, f32) {
        let factor = self.scale.map_or(1.0, |s| s.factor());
        (self.col as f32 * factor, self.row as f32 * factor)
    }

    /// Detection blur, 1.0 for points found without a pyramid.
    pub fn sigma(&self) -> f32 {
        self.scale.map_or(1.0, |s| s.sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_point_position() {
        let p = Point::new(3, 7, 1.5);
        assert_eq!(p.position(), (7.0, 3.0));
        assert_eq!(p.sigma(), 1.0);
        assert_eq!(p.angle, 0.0);
    }

    #[test]
    fn test_scaled_point_position() {
        let p = Point::new(3, 7, 1.5).with_scale(Scale {
            octave: 2,
            layer: 1,
            sigma: 8.0,
        });
        assert_eq!(p.position(), (28.0, 12.0));
        assert_eq!(p.sigma(), 8.0);
    }
}
