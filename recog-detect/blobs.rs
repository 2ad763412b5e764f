//! Scale-space blob detection on a DoG pyramid.

use log::debug;
use recog_core::{BorderPolicy, Point, Scale};

use crate::corner_detection::{check_threshold, min_eigenvalue, structure_tensor_at};
use crate::error::{DetectError, DetectResult};
use crate::pyramid::{Layer, Pyramid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShiTomasiParams {
    /// Half side of the structure-tensor window.
    pub window_radius: usize,
    /// Minimum smaller eigenvalue of the structure tensor.
    pub threshold: f32,
    /// Minimum `|DoG|` for a blob candidate.
    pub contrast_threshold: f32,
    pub border: BorderPolicy,
}

impl Default for ShiTomasiParams {
    fn default() -> Self {
        Self {
            window_radius: 2,
            threshold: 1e-6,
            contrast_threshold: 0.01,
            border: BorderPolicy::Replicate,
        }
    }
}

impl ShiTomasiParams {
    pub fn validate(&self) -> DetectResult<()> {
        if self.window_radius == 0 {
            return Err(DetectError::InvalidWindow(self.window_radius));
        }
        check_threshold("shi_tomasi.threshold", self.threshold)?;
        check_threshold("shi_tomasi.contrast_threshold", self.contrast_threshold)
    }
}

/// 3x3x3 extrema of the DoG with `|value| >= contrast_threshold`.
///
/// Only layers with a neighbour above and below are scanned, and only pixels
/// whose full 3x3 neighbourhood lies inside the layer. An extremum must be
/// strictly greater (or strictly smaller) than all 26 neighbours.
pub fn blobs(dog: &Pyramid, contrast_threshold: f32) -> DetectResult<Vec<Point>> {
    check_threshold("contrast_threshold", contrast_threshold)?;
    let mut points = Vec::new();
    for octave in 0..dog.octave_count() {
        let Some(layers) = dog.octave(octave) else {
            continue;
        };
        for (idx, window) in layers.windows(3).enumerate() {
            let current = &window[1];
            let (h, w) = (current.image.height(), current.image.width());
            if h < 3 || w < 3 {
                continue;
            }
            for r in 1..h - 1 {
                for c in 1..w - 1 {
                    let v = current.image.value(r, c);
                    if v.abs() < contrast_threshold || v == 0.0 {
                        continue;
                    }
                    if is_extremum(window, r, c, v) {
                        let scale = Scale {
                            octave,
                            layer: idx + 1,
                            sigma: current.sigma_global,
                        };
                        points.push(Point::new(r, c, v.abs()).with_scale(scale));
                    }
                }
            }
        }
    }
    debug!("blobs: {} DoG extrema", points.len());
    Ok(points)
}

fn is_extremum(window: &[Layer], row: usize, col: usize, v: f32) -> bool {
    let maximum = v > 0.0;
    for (li, layer) in window.iter().enumerate() {
        for r in row - 1..=row + 1 {
            for c in col - 1..=col + 1 {
                if li == 1 && r == row && c == col {
                    continue;
                }
                let n = layer.image.value(r, c);
                if (maximum && n >= v) || (!maximum && n <= v) {
                    return false;
                }
            }
        }
    }
    true
}

/// Keeps blob candidates whose structure tensor has a large enough smaller
/// eigenvalue and that remain extrema against the DoG layers above and below.
///
/// Surviving points are scored by that eigenvalue and keep their scale.
pub fn shi_tomasi(
    dog: &Pyramid,
    candidates: &[Point],
    params: &ShiTomasiParams,
) -> DetectResult<Vec<Point>> {
    params.validate()?;
    let mut points = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(scale) = candidate.scale else {
            continue;
        };
        if scale.layer == 0 {
            continue;
        }
        let (Some(below), Some(layer), Some(above)) = (
            dog.layer(scale.octave, scale.layer - 1),
            dog.layer(scale.octave, scale.layer),
            dog.layer(scale.octave, scale.layer + 1),
        ) else {
            continue;
        };
        let (r, c) = (candidate.row, candidate.col);
        let (Ok(v), Ok(v_below), Ok(v_above)) =
            (layer.image.get(r, c), below.image.get(r, c), above.image.get(r, c))
        else {
            continue;
        };
        let scale_extremum = (v > v_below && v > v_above) || (v < v_below && v < v_above);
        if !scale_extremum {
            continue;
        }
        let (sxx, sxy, syy) =
            structure_tensor_at(&layer.image, r, c, params.window_radius, params.border);
        let response = min_eigenvalue(sxx, sxy, syy);
        if response > params.threshold {
            let mut point = *candidate;
            point.score = response;
            points.push(point);
        }
    }
    debug!(
        "shi-tomasi: {} of {} blob candidates kept",
        points.len(),
        candidates.len()
    );
    Ok(points)
}
