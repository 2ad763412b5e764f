use std::f32::consts::TAU;

use crate::border::BorderPolicy;
use crate::convolution::Kernel;
use crate::error::CoreResult;
use crate::image::Image;

/// Sobel derivative pair of a single-channel image.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub dx: Image,
    pub dy: Image,
}

impl Gradients {
    pub fn sobel(src: &Image, border: BorderPolicy) -> CoreResult<Self> {
        Ok(Self {
            dx: Kernel::sobel_x().apply(src, border)?,
            dy: Kernel::sobel_y().apply(src, border)?,
        })
    }

    pub fn height(&self) -> usize {
        self.dx.height()
    }

    pub fn width(&self) -> usize {
        self.dx.width()
    }

    /// `sqrt(dx² + dy²)` per pixel.
    pub fn magnitude(&self) -> CoreResult<Image> {
        self.dx.zip_with(&self.dy, |gx, gy| gx.hypot(gy))
    }

    /// Gradient direction in `[0, 2π)` per pixel.
    pub fn orientation(&self) -> CoreResult<Image> {
        self.dx.zip_with(&self.dy, angle)
    }

    /// `(magnitude, angle)` at a possibly out-of-range pixel.
    #[inline]
    pub fn polar_at(&self, row: isize, col: isize, border: BorderPolicy) -> (f32, f32) {
        let gx = self.dx.sample(row, col, border);
        let gy = self.dy.sample(row, col, border);
        (gx.hypot(gy), angle(gx, gy))
    }

    /// Bilinearly interpolated `(gx, gy)` at fractional `(y, x)`.
    pub fn vector_at(&self, y: f32, x: f32, border: BorderPolicy) -> (f32, f32) {
        (
            self.dx.sample_bilinear(y, x, border),
            self.dy.sample_bilinear(y, x, border),
        )
    }
}

/// Direction of `(gx, gy)` mapped to `[0, 2π)`.
#[inline]
pub fn angle(gx: f32, gy: f32) -> f32 {
    let a = gy.atan2(gx);
    let a = if a < 0.0 { a + TAU } else { a };
    // atan2 rounding can land exactly on 2π
    if a >= TAU {
        0.0
    } else {
        a
    }
}
