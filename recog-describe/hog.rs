//! Histograms of oriented gradients around keypoints.
//!
//! A `block_size x block_size` patch centered on the point is split into a
//! `histo_size x histo_size` grid of cells. Every pixel votes its gradient
//! magnitude into the cell's orientation histogram, shared linearly between
//! the two nearest of `bins` buckets. Bucket `k` is centered on angle
//! `k * 2π / bins`. Cell histograms are concatenated row by row.

use std::collections::HashMap;
use std::f32::consts::TAU;

use log::debug;
use recog_core::gradient::angle;
use recog_core::{BorderPolicy, Gradients, Image, Point};
use recog_detect::Pyramid;

use crate::descriptor::Descriptor;
use crate::error::{DescribeError, DescribeResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HogParams {
    /// Cells per side of the grid.
    pub histo_size: usize,
    /// Patch side in pixels.
    pub block_size: usize,
    pub bins: usize,
    pub border: BorderPolicy,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            histo_size: 4,
            block_size: 16,
            bins: 8,
            border: BorderPolicy::Replicate,
        }
    }
}

impl HogParams {
    pub fn validate(&self) -> DescribeResult<()> {
        if self.histo_size == 0 || self.block_size == 0 || self.block_size % self.histo_size != 0 {
            return Err(DescribeError::InvalidGeometry {
                histo_size: self.histo_size,
                block_size: self.block_size,
            });
        }
        if self.bins == 0 {
            return Err(DescribeError::InvalidBins(self.bins));
        }
        Ok(())
    }

    /// `histo_size² * bins`
    pub fn descriptor_size(&self) -> usize {
        self.histo_size * self.histo_size * self.bins
    }
}

/// Dominant-orientation estimation for rotation-invariant descriptors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientationParams {
    pub bins: usize,
    /// Secondary orientations need at least this fraction of the strongest bin.
    pub peak_threshold: f32,
    pub max_peaks: usize,
    /// Half side of the square window voting for the orientation.
    pub radius: usize,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            bins: 36,
            peak_threshold: 0.8,
            max_peaks: 2,
            radius: 8,
        }
    }
}

impl OrientationParams {
    pub fn validate(&self) -> DescribeResult<()> {
        if self.bins < 3 {
            return Err(DescribeError::InvalidBins(self.bins));
        }
        if !(0.0..=1.0).contains(&self.peak_threshold) {
            return Err(DescribeError::InvalidParameter {
                name: "orientation.peak_threshold",
                value: self.peak_threshold,
            });
        }
        if self.max_peaks == 0 || self.radius == 0 {
            return Err(DescribeError::InvalidParameter {
                name: "orientation.max_peaks/radius",
                value: 0.0,
            });
        }
        Ok(())
    }
}

#[inline]
fn vote(histogram: &mut [f32], angle: f32, magnitude: f32) {
    let bins = histogram.len();
    let pos = angle / TAU * bins as f32;
    let lower = pos.floor();
    let frac = pos - lower;
    let i0 = (lower as usize) % bins;
    let i1 = (i0 + 1) % bins;
    histogram[i0] += magnitude * (1.0 - frac);
    histogram[i1] += magnitude * frac;
}

/// Shared cell-grid accumulation; `sample(dy, dx)` yields `(magnitude, angle)`
/// at an offset from the patch centre.
fn accumulate<F>(params: &HogParams, sample: F) -> Vec<f32>
where
    F: Fn(isize, isize) -> (f32, f32),
{
    let cell = params.block_size / params.histo_size;
    let half = (params.block_size / 2) as isize;
    let mut coefficients = vec![0.0f32; params.descriptor_size()];
    for i in 0..params.block_size {
        for j in 0..params.block_size {
            let (magnitude, theta) = sample(i as isize - half, j as isize - half);
            if magnitude == 0.0 {
                continue;
            }
            let start = ((i / cell) * params.histo_size + j / cell) * params.bins;
            vote(&mut coefficients[start..start + params.bins], theta, magnitude);
        }
    }
    coefficients
}

/// HOG descriptor of `point` on the pixel grid of `gradients`.
pub fn hog(point: &Point, gradients: &Gradients, params: &HogParams) -> DescribeResult<Descriptor> {
    params.validate()?;
    let (row, col) = (point.row as isize, point.col as isize);
    let coefficients = accumulate(params, |dy, dx| {
        gradients.polar_at(row + dy, col + dx, params.border)
    });
    Ok(Descriptor::new(*point, coefficients))
}

/// HOG descriptor with the patch rotated by `point.angle`, so that the
/// orientation of the point maps to bucket 0.
pub fn rotated_hog(
    point: &Point,
    gradients: &Gradients,
    params: &HogParams,
) -> DescribeResult<Descriptor> {
    params.validate()?;
    let (sin, cos) = point.angle.sin_cos();
    let (cy, cx) = (point.row as f32, point.col as f32);
    let coefficients = accumulate(params, |dy, dx| {
        let (dy, dx) = (dy as f32, dx as f32);
        let x = cx + cos * dx - sin * dy;
        let y = cy + sin * dx + cos * dy;
        let (gx, gy) = gradients.vector_at(y, x, params.border);
        let theta = (angle(gx, gy) - point.angle).rem_euclid(TAU);
        (gx.hypot(gy), theta)
    });
    Ok(Descriptor::new(*point, coefficients))
}

/// Dominant gradient orientations around `point`, strongest first, in `[0, 2π)`.
///
/// Only circular local maxima of the orientation histogram qualify; a flat
/// run keeps its first bucket. Peak positions are refined by a parabola
/// through the neighbouring buckets.
pub fn dominant_orientations(
    point: &Point,
    gradients: &Gradients,
    params: &OrientationParams,
    border: BorderPolicy,
) -> DescribeResult<Vec<f32>> {
    params.validate()?;
    let bins = params.bins;
    let r = params.radius as isize;
    let sigma = params.radius as f32 / 2.0;
    let mut histogram = vec![0.0f32; bins];
    for dy in -r..=r {
        for dx in -r..=r {
            let (magnitude, theta) =
                gradients.polar_at(point.row as isize + dy, point.col as isize + dx, border);
            let weight = (-((dy * dy + dx * dx) as f32) / (2.0 * sigma * sigma)).exp();
            vote(&mut histogram, theta, magnitude * weight);
        }
    }

    let histogram = Descriptor::new(*point, histogram);
    let values = histogram.coefficients();
    let mut orientations = Vec::with_capacity(params.max_peaks);
    for k in histogram.peaks(params.peak_threshold, bins) {
        let left = values[(k + bins - 1) % bins];
        let right = values[(k + 1) % bins];
        let centre = values[k];
        if centre <= left || centre < right {
            continue;
        }
        let denom = left - 2.0 * centre + right;
        let offset = if denom.abs() > f32::EPSILON {
            0.5 * (left - right) / denom
        } else {
            0.0
        };
        let theta = ((k as f32 + offset) * TAU / bins as f32).rem_euclid(TAU);
        orientations.push(if theta >= TAU { 0.0 } else { theta });
        if orientations.len() == params.max_peaks {
            break;
        }
    }
    Ok(orientations)
}

/// Plain HOG descriptors of `points` found on `image`.
pub fn histogrid(points: &[Point], image: &Image, params: &HogParams) -> DescribeResult<Vec<Descriptor>> {
    params.validate()?;
    let gradients = Gradients::sobel(image, params.border)?;
    let descriptors = points
        .iter()
        .map(|p| hog(p, &gradients, params))
        .collect::<DescribeResult<Vec<_>>>()?;
    debug!("histogrid: {} descriptors", descriptors.len());
    Ok(descriptors)
}

/// Rotation-invariant descriptors: one per dominant orientation of each point.
///
/// The orientation is stored in the descriptor's `point.angle`. Points without
/// any gradient around them yield no descriptor.
pub fn rhistogrid(
    points: &[Point],
    image: &Image,
    params: &HogParams,
    orientation: &OrientationParams,
) -> DescribeResult<Vec<Descriptor>> {
    params.validate()?;
    let gradients = Gradients::sobel(image, params.border)?;
    let mut descriptors = Vec::with_capacity(points.len());
    for point in points {
        oriented(point, &gradients, params, orientation, &mut descriptors)?;
    }
    debug!(
        "rhistogrid: {} descriptors from {} points",
        descriptors.len(),
        points.len()
    );
    Ok(descriptors)
}

fn oriented(
    point: &Point,
    gradients: &Gradients,
    params: &HogParams,
    orientation: &OrientationParams,
    out: &mut Vec<Descriptor>,
) -> DescribeResult<()> {
    for theta in dominant_orientations(point, gradients, orientation, params.border)? {
        out.push(rotated_hog(&point.with_angle(theta), gradients, params)?);
    }
    Ok(())
}

/// Sobel gradients of pyramid layers, computed on first use.
struct LayerGradients<'a> {
    pyramid: &'a Pyramid,
    border: BorderPolicy,
    cache: HashMap<(usize, usize), Gradients>,
}

impl<'a> LayerGradients<'a> {
    fn new(pyramid: &'a Pyramid, border: BorderPolicy) -> Self {
        Self {
            pyramid,
            border,
            cache: HashMap::new(),
        }
    }

    /// Gradients of the layer a point was detected on; octave 0, layer 0 for
    /// points without scale.
    fn for_point(&mut self, point: &Point) -> DescribeResult<&Gradients> {
        let (octave, layer) = point.scale.map_or((0, 0), |s| (s.octave, s.layer));
        let missing = DescribeError::MissingLayer { octave, layer };
        if !self.cache.contains_key(&(octave, layer)) {
            let source = self.pyramid.layer(octave, layer).ok_or(missing.clone())?;
            let gradients = Gradients::sobel(&source.image, self.border)?;
            self.cache.insert((octave, layer), gradients);
        }
        self.cache.get(&(octave, layer)).ok_or(missing)
    }
}

/// Scale-invariant descriptors: HOG evaluated on the Gaussian layer each point
/// was detected at, so the patch covers a scale-normalized area.
pub fn si_descriptors(
    points: &[Point],
    pyramid: &Pyramid,
    params: &HogParams,
) -> DescribeResult<Vec<Descriptor>> {
    params.validate()?;
    let mut layers = LayerGradients::new(pyramid, params.border);
    let mut descriptors = Vec::with_capacity(points.len());
    for point in points {
        descriptors.push(hog(point, layers.for_point(point)?, params)?);
    }
    debug!(
        "si_descriptors: {} descriptors over {} layers",
        descriptors.len(),
        layers.cache.len()
    );
    Ok(descriptors)
}

/// Scale- and rotation-invariant descriptors on the Gaussian pyramid.
pub fn rsi_descriptors(
    points: &[Point],
    pyramid: &Pyramid,
    params: &HogParams,
    orientation: &OrientationParams,
) -> DescribeResult<Vec<Descriptor>> {
    params.validate()?;
    let mut layers = LayerGradients::new(pyramid, params.border);
    let mut descriptors = Vec::with_capacity(points.len());
    for point in points {
        oriented(point, layers.for_point(point)?, params, orientation, &mut descriptors)?;
    }
    debug!("rsi_descriptors: {} descriptors", descriptors.len());
    Ok(descriptors)
}
