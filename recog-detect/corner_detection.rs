//! Single-image corner detectors (Moravec and Harris) and the structure
//! tensor helpers shared with the Shi-Tomasi blob refinement.

use log::debug;
use recog_core::{BorderPolicy, Gradients, Image, Kernel, Point};

use crate::error::{DetectError, DetectResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The 8 principal shift directions `(d_row, d_col)`.
const SHIFTS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoravecParams {
    /// Half side of the compared window (1 → 3x3).
    pub window_radius: usize,
    /// Minimum mean squared difference for a corner.
    pub threshold: f32,
    pub border: BorderPolicy,
}

impl Default for MoravecParams {
    fn default() -> Self {
        Self {
            window_radius: 1,
            threshold: 0.01,
            border: BorderPolicy::Replicate,
        }
    }
}

impl MoravecParams {
    pub fn validate(&self) -> DetectResult<()> {
        if self.window_radius == 0 {
            return Err(DetectError::InvalidWindow(self.window_radius));
        }
        check_threshold("moravec.threshold", self.threshold)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HarrisParams {
    /// Sensitivity in `det(M) - k * trace(M)^2`, typically 0.04–0.06.
    pub k: f32,
    /// Sigma of the Gaussian window smoothing the gradient products.
    pub window_sigma: f32,
    pub threshold: f32,
    pub border: BorderPolicy,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            k: 0.04,
            window_sigma: 1.0,
            threshold: 1e-4,
            border: BorderPolicy::Replicate,
        }
    }
}

impl HarrisParams {
    pub fn validate(&self) -> DetectResult<()> {
        check_threshold("harris.k", self.k)?;
        if !(self.window_sigma > 0.0) {
            return Err(DetectError::InvalidThreshold {
                name: "harris.window_sigma",
                value: self.window_sigma,
            });
        }
        check_threshold("harris.threshold", self.threshold)
    }
}

pub(crate) fn check_threshold(name: &'static str, value: f32) -> DetectResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DetectError::InvalidThreshold { name, value });
    }
    Ok(())
}

/// Per-pixel Moravec corner strength: the smallest windowed mean squared
/// difference over the 8 principal shifts.
pub fn moravec_response(image: &Image, params: &MoravecParams) -> DetectResult<Image> {
    params.validate()?;
    let window = Kernel::box_filter(2 * params.window_radius + 1)?;
    let mut response: Option<Image> = None;
    for &(dr, dc) in SHIFTS.iter() {
        let diff = Image::from_fn(image.height(), image.width(), |r, c| {
            let shifted = image.sample(r as isize + dr, c as isize + dc, params.border);
            let d = shifted - image.value(r, c);
            d * d
        })?;
        let ssd = window.apply(&diff, params.border)?;
        response = Some(match response {
            None => ssd,
            Some(acc) => acc.zip_with(&ssd, f32::min)?,
        });
    }
    // SHIFTS is non-empty, so the fold always produced an image
    response.ok_or_else(|| DetectError::InvalidWindow(params.window_radius))
}

/// Moravec corners: thresholded local maxima of [`moravec_response`].
pub fn moravec(image: &Image, params: &MoravecParams) -> DetectResult<Vec<Point>> {
    let response = moravec_response(image, params)?;
    let points = local_maxima(&response, params.threshold);
    debug!("moravec: {} corners above {}", points.len(), params.threshold);
    Ok(points)
}

/// Gaussian-windowed gradient products `(Sxx, Sxy, Syy)`.
pub fn structure_tensor(
    image: &Image,
    window_sigma: f32,
    border: BorderPolicy,
) -> DetectResult<(Image, Image, Image)> {
    let g = Gradients::sobel(image, border)?;
    let window = Kernel::gaussian(window_sigma)?;
    let xx = g.dx.zip_with(&g.dx, |a, b| a * b)?;
    let xy = g.dx.zip_with(&g.dy, |a, b| a * b)?;
    let yy = g.dy.zip_with(&g.dy, |a, b| a * b)?;
    Ok((
        window.apply(&xx, border)?,
        window.apply(&xy, border)?,
        window.apply(&yy, border)?,
    ))
}

/// Per-pixel Harris response `det(M) - k * trace(M)^2`.
pub fn harris_response(image: &Image, params: &HarrisParams) -> DetectResult<Image> {
    params.validate()?;
    let (sxx, sxy, syy) = structure_tensor(image, params.window_sigma, params.border)?;
    let det = sxx.zip_with(&syy, |a, c| a * c)?.zip_with(&sxy, |ac, b| ac - b * b)?;
    let trace = sxx.zip_with(&syy, |a, c| a + c)?;
    Ok(det.zip_with(&trace, |d, t| d - params.k * t * t)?)
}

/// Harris corners: thresholded local maxima of [`harris_response`].
pub fn harris(image: &Image, params: &HarrisParams) -> DetectResult<Vec<Point>> {
    let response = harris_response(image, params)?;
    let points = local_maxima(&response, params.threshold);
    debug!("harris: {} corners above {}", points.len(), params.threshold);
    Ok(points)
}

/// Smaller eigenvalue of the symmetric matrix `[[a, b], [b, c]]`.
#[inline]
pub fn min_eigenvalue(a: f32, b: f32, c: f32) -> f32 {
    let half_trace = 0.5 * (a + c);
    let half_diff = 0.5 * (a - c);
    half_trace - (half_diff * half_diff + b * b).sqrt()
}

/// Structure tensor `(Sxx, Sxy, Syy)` at one pixel, from central differences
/// over a `(2 * radius + 1)²` Gaussian-weighted window.
pub fn structure_tensor_at(
    image: &Image,
    row: usize,
    col: usize,
    radius: usize,
    border: BorderPolicy,
) -> (f32, f32, f32) {
    let sigma = (radius as f32 / 2.0).max(0.5);
    let denom = 2.0 * sigma * sigma;
    let r = radius as isize;
    let (mut sxx, mut sxy, mut syy) = (0.0f32, 0.0f32, 0.0f32);
    for dr in -r..=r {
        for dc in -r..=r {
            let (y, x) = (row as isize + dr, col as isize + dc);
            let gx = 0.5 * (image.sample(y, x + 1, border) - image.sample(y, x - 1, border));
            let gy = 0.5 * (image.sample(y + 1, x, border) - image.sample(y - 1, x, border));
            let w = (-((dr * dr + dc * dc) as f32) / denom).exp();
            sxx += w * gx * gx;
            sxy += w * gx * gy;
            syy += w * gy * gy;
        }
    }
    (sxx, sxy, syy)
}

/// Pixels above `threshold` that dominate their 3x3 neighbourhood.
///
/// Plateaus keep a single pixel: a candidate must be strictly greater than
/// neighbours preceding it in raster order and not smaller than the rest.
pub fn local_maxima(response: &Image, threshold: f32) -> Vec<Point> {
    let (h, w) = (response.height() as isize, response.width() as isize);
    let mut points = Vec::new();
    for r in 0..h {
        for c in 0..w {
            let v = response.value(r as usize, c as usize);
            if !(v > threshold) {
                continue;
            }
            let mut is_max = true;
            'neighbours: for dr in -1..=1isize {
                for dc in -1..=1isize {
                    let (nr, nc) = (r + dr, c + dc);
                    if (dr == 0 && dc == 0) || nr < 0 || nc < 0 || nr >= h || nc >= w {
                        continue;
                    }
                    let n = response.value(nr as usize, nc as usize);
                    let precedes = dr < 0 || (dr == 0 && dc < 0);
                    if n > v || (precedes && n == v) {
                        is_max = false;
                        break 'neighbours;
                    }
                }
            }
            if is_max {
                points.push(Point::new(r as usize, c as usize, v));
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn checkerboard_corner(size: usize, at: usize) -> Image {
        Image::from_fn(size, size, |r, c| if (r < at) == (c < at) { 1.0 } else { 0.0 }).unwrap()
    }

    fn strongest(points: &[Point]) -> Point {
        *points
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .expect("at least one point")
    }

    #[test]
    fn test_flat_image_has_no_corners() {
        let flat = Image::filled(64, 64, 1, 0.5).unwrap();
        let harris_params = HarrisParams {
            threshold: 1e-9,
            ..HarrisParams::default()
        };
        let moravec_params = MoravecParams {
            threshold: 1e-9,
            ..MoravecParams::default()
        };
        assert!(harris(&flat, &harris_params).unwrap().is_empty());
        assert!(moravec(&flat, &moravec_params).unwrap().is_empty());
    }

    #[test]
    fn test_harris_peak_at_checkerboard_corner() {
        let img = checkerboard_corner(64, 32);
        let points = harris(&img, &HarrisParams::default()).unwrap();
        assert!(!points.is_empty());
        let best = strongest(&points);
        let dist = ((best.row as f32 - 32.0).powi(2) + (best.col as f32 - 32.0).powi(2)).sqrt();
        assert!(dist <= 2.0, "harris peak at ({}, {})", best.row, best.col);
    }

    #[test]
    fn test_moravec_fires_near_checkerboard_corner() {
        let img = checkerboard_corner(64, 32);
        let points = moravec(&img, &MoravecParams::default()).unwrap();
        let best = strongest(&points);
        assert!((best.row as isize - 32).abs() <= 2 && (best.col as isize - 32).abs() <= 2);
    }

    #[test]
    fn test_harris_edge_is_negative() {
        let img = Image::from_fn(32, 32, |_, c| if c >= 16 { 1.0 } else { 0.0 }).unwrap();
        let response = harris_response(&img, &HarrisParams::default()).unwrap();
        assert!(response.get(16, 16).unwrap() <= 0.0);
        assert!(harris(&img, &HarrisParams::default()).unwrap().is_empty());
    }

    #[test]
    fn test_min_eigenvalue() {
        assert_abs_diff_eq!(min_eigenvalue(2.0, 0.0, 5.0), 2.0);
        assert_abs_diff_eq!(min_eigenvalue(1.0, 1.0, 1.0), 0.0);
        assert_abs_diff_eq!(min_eigenvalue(3.0, 1.0, 3.0), 2.0);
    }

    #[test]
    fn test_local_maxima_plateau_keeps_one() {
        let mut img = Image::new(5, 5, 1).unwrap();
        for (r, c) in [(2, 2), (2, 3), (3, 2), (3, 3)] {
            img.set(r, c, 1.0).unwrap();
        }
        let points = local_maxima(&img, 0.5);
        assert_eq!(points.len(), 1);
        assert_eq!((points[0].row, points[0].col), (2, 2));
    }

    #[test]
    fn test_invalid_params() {
        let img = Image::filled(8, 8, 1, 0.0).unwrap();
        let bad = MoravecParams {
            window_radius: 0,
            ..MoravecParams::default()
        };
        assert!(matches!(moravec(&img, &bad), Err(DetectError::InvalidWindow(0))));
        let bad = HarrisParams {
            threshold: f32::NAN,
            ..HarrisParams::default()
        };
        assert!(matches!(harris(&img, &bad), Err(DetectError::InvalidThreshold { .. })));
    }
}
