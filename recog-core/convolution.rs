//! Kernel application under a border policy.
//!
//! Kernels are applied centered and un-flipped (correlation), so `sobel_x`
//! responds positively to intensity increasing towards larger columns.
//! A separable kernel runs a horizontal then a vertical 1D pass, costing
//! `O(k_row + k_col)` per pixel instead of `O(k_row * k_col)`.

use log::trace;

use crate::border::BorderPolicy;
use crate::error::{CoreError, CoreResult};
use crate::image::Image;

#[derive(Debug, Clone, PartialEq)]
pub enum Kernel {
    /// Dense `height x width` weights, row-major.
    Full {
        height: usize,
        width: usize,
        weights: Vec<f32>,
    },
    /// Outer product `col * row^T` applied as two 1D passes.
    Separable { row: Vec<f32>, col: Vec<f32> },
}

fn check_taps(taps: &[f32], what: &str) -> CoreResult<()> {
    if taps.is_empty() || taps.len() % 2 == 0 {
        return Err(CoreError::InvalidKernel(format!(
            "{} length must be odd and non-zero (got {})",
            what,
            taps.len()
        )));
    }
    Ok(())
}

/// Normalized 1D Gaussian with radius `ceil(3 * sigma)`.
pub fn gaussian_kernel_1d(sigma: f32) -> CoreResult<Vec<f32>> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(CoreError::InvalidKernel(format!(
            "gaussian sigma must be positive (got {})",
            sigma
        )));
    }
    let radius = (3.0 * sigma).ceil() as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|x| (-((x * x) as f32) / denom).exp())
        .collect();
    let norm: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= norm);
    Ok(kernel)
}

impl Kernel {
    pub fn full(height: usize, width: usize, weights: Vec<f32>) -> CoreResult<Self> {
        if height % 2 == 0 || width % 2 == 0 || weights.len() != height * width {
            return Err(CoreError::InvalidKernel(format!(
                "full kernel must be odd-sized with {}x{} weights (got {})",
                height,
                width,
                weights.len()
            )));
        }
        Ok(Kernel::Full {
            height,
            width,
            weights,
        })
    }

    pub fn separable(row: Vec<f32>, col: Vec<f32>) -> CoreResult<Self> {
        check_taps(&row, "row kernel")?;
        check_taps(&col, "column kernel")?;
        Ok(Kernel::Separable { row, col })
    }

    pub fn gaussian(sigma: f32) -> CoreResult<Self> {
        let taps = gaussian_kernel_1d(sigma)?;
        Ok(Kernel::Separable {
            row: taps.clone(),
            col: taps,
        })
    }

    /// Horizontal derivative: `[-1 0 1]` smoothed vertically by `[1 2 1]`.
    pub fn sobel_x() -> Self {
        Kernel::Separable {
            row: vec![-1.0, 0.0, 1.0],
            col: vec![1.0, 2.0, 1.0],
        }
    }

    /// Vertical derivative: `[-1 0 1]^T` smoothed horizontally by `[1 2 1]`.
    pub fn sobel_y() -> Self {
        Kernel::Separable {
            row: vec![1.0, 2.0, 1.0],
            col: vec![-1.0, 0.0, 1.0],
        }
    }

    /// Mean filter of odd `size`.
    pub fn box_filter(size: usize) -> CoreResult<Self> {
        let taps = vec![1.0 / size as f32; size];
        Kernel::separable(taps.clone(), taps)
    }

    /// Dense equivalent of this kernel.
    pub fn to_full(&self) -> Kernel {
        match self {
            Kernel::Full { .. } => self.clone(),
            Kernel::Separable { row, col } => Kernel::Full {
                height: col.len(),
                width: row.len(),
                weights: col
                    .iter()
                    .flat_map(|&c| row.iter().map(move |&r| c * r))
                    .collect(),
            },
        }
    }

    /// Convolve a single-channel image.
    pub fn apply(&self, src: &Image, border: BorderPolicy) -> CoreResult<Image> {
        if src.channels() != 1 {
            return Err(CoreError::UnsupportedChannels {
                expected: 1,
                actual: src.channels(),
            });
        }
        match self {
            Kernel::Full {
                height,
                width,
                weights,
            } => {
                trace!("full {}x{} convolution on {}x{}", height, width, src.height(), src.width());
                convolve_full(src, *height, *width, weights, border)
            }
            Kernel::Separable { row, col } => {
                trace!(
                    "separable {}+{} convolution on {}x{}",
                    row.len(),
                    col.len(),
                    src.height(),
                    src.width()
                );
                let horizontal = convolve_rows(src, row, border)?;
                convolve_cols(&horizontal, col, border)
            }
        }
    }
}

fn convolve_full(
    src: &Image,
    k_height: usize,
    k_width: usize,
    weights: &[f32],
    border: BorderPolicy,
) -> CoreResult<Image> {
    let (h, w) = (src.height(), src.width());
    let (hr, hc) = ((k_height / 2) as isize, (k_width / 2) as isize);
    let mut out = Vec::with_capacity(h * w);
    for r in 0..h as isize {
        for c in 0..w as isize {
            let mut acc = 0.0f32;
            for (ki, kernel_row) in weights.chunks_exact(k_width).enumerate() {
                let sr = r + ki as isize - hr;
                for (kj, &kv) in kernel_row.iter().enumerate() {
                    acc += kv * src.sample(sr, c + kj as isize - hc, border);
                }
            }
            out.push(acc);
        }
    }
    Image::from_vec(h, w, 1, out)
}

/// Horizontal 1D pass.
pub fn convolve_rows(src: &Image, kernel: &[f32], border: BorderPolicy) -> CoreResult<Image> {
    check_taps(kernel, "row kernel")?;
    let (h, w) = (src.height(), src.width());
    let half = kernel.len() / 2;
    let mut out = Vec::with_capacity(h * w);
    for r in 0..h {
        let line = src.row(r);
        for c in 0..w {
            let acc = if c >= half && c + half < w {
                // interior: the window never leaves the row
                line[c - half..=c + half]
                    .iter()
                    .zip(kernel)
                    .map(|(&v, &k)| v * k)
                    .sum()
            } else {
                kernel
                    .iter()
                    .enumerate()
                    .map(|(ki, &k)| {
                        k * src.sample(r as isize, c as isize + ki as isize - half as isize, border)
                    })
                    .sum()
            };
            out.push(acc);
        }
    }
    Image::from_vec(h, w, 1, out)
}

/// Vertical 1D pass.
pub fn convolve_cols(src: &Image, kernel: &[f32], border: BorderPolicy) -> CoreResult<Image> {
    check_taps(kernel, "column kernel")?;
    let (h, w) = (src.height(), src.width());
    let half = kernel.len() / 2;
    let mut out = Vec::with_capacity(h * w);
    for r in 0..h {
        let interior = r >= half && r + half < h;
        for c in 0..w {
            let acc: f32 = kernel
                .iter()
                .enumerate()
                .map(|(ki, &k)| {
                    let v = if interior {
                        src.value(r + ki - half, c)
                    } else {
                        src.sample(r as isize + ki as isize - half as isize, c as isize, border)
                    };
                    k * v
                })
                .sum();
            out.push(acc);
        }
    }
    Image::from_vec(h, w, 1, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn textured(height: usize, width: usize) -> Image {
        Image::from_fn(height, width, |r, c| ((r * 7 + c * 13) % 11) as f32 / 10.0).unwrap()
    }

    #[test]
    fn test_gaussian_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel_1d(1.5).unwrap();
        assert_eq!(k.len(), 11);
        assert_abs_diff_eq!(k.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        for i in 0..k.len() / 2 {
            assert_abs_diff_eq!(k[i], k[k.len() - 1 - i], epsilon = 1e-7);
        }
    }

    #[test]
    fn test_invalid_kernels() {
        assert!(gaussian_kernel_1d(0.0).is_err());
        assert!(Kernel::separable(vec![1.0, 1.0], vec![1.0]).is_err());
        assert!(Kernel::full(3, 3, vec![0.0; 8]).is_err());
        assert!(Kernel::box_filter(4).is_err());
    }

    #[test]
    fn test_separable_matches_full() {
        let img = textured(9, 12);
        for kernel in [Kernel::sobel_x(), Kernel::sobel_y(), Kernel::gaussian(1.0).unwrap()] {
            for border in [BorderPolicy::Replicate, BorderPolicy::Reflect, BorderPolicy::Wrap] {
                let fast = kernel.apply(&img, border).unwrap();
                let slow = kernel.to_full().apply(&img, border).unwrap();
                for (a, b) in fast.as_slice().iter().zip(slow.as_slice()) {
                    assert_abs_diff_eq!(*a, *b, epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_smoothing_preserves_constant_image() {
        let img = Image::filled(6, 6, 1, 0.7).unwrap();
        let out = Kernel::gaussian(2.0).unwrap().apply(&img, BorderPolicy::Replicate).unwrap();
        for &v in out.as_slice() {
            assert_abs_diff_eq!(v, 0.7, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sobel_sign() {
        let img = Image::from_fn(5, 5, |_, c| c as f32).unwrap();
        let dx = Kernel::sobel_x().apply(&img, BorderPolicy::Replicate).unwrap();
        let dy = Kernel::sobel_y().apply(&img, BorderPolicy::Replicate).unwrap();
        assert_abs_diff_eq!(dx.get(2, 2).unwrap(), 8.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dy.get(2, 2).unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_multichannel_rejected() {
        let img = Image::new(4, 4, 3).unwrap();
        assert!(matches!(
            Kernel::sobel_x().apply(&img, BorderPolicy::Replicate),
            Err(CoreError::UnsupportedChannels { expected: 1, actual: 3 })
        ));
    }

    proptest! {
        #[test]
        fn prop_separable_equals_dense(
            (h, w, data) in (1usize..10, 1usize..10).prop_flat_map(|(h, w)| {
                (Just(h), Just(w), prop::collection::vec(0.0f32..1.0, h * w))
            }),
            sigma in 0.5f32..2.0,
            border_index in 0usize..4,
        ) {
            let border = [
                BorderPolicy::Replicate,
                BorderPolicy::Reflect,
                BorderPolicy::Reflect101,
                BorderPolicy::Wrap,
            ][border_index];
            let img = Image::from_vec(h, w, 1, data).unwrap();
            let kernel = Kernel::gaussian(sigma).unwrap();
            let fast = kernel.apply(&img, border).unwrap();
            let slow = kernel.to_full().apply(&img, border).unwrap();
            for (a, b) in fast.as_slice().iter().zip(slow.as_slice()) {
                prop_assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
            }
        }
    }
}
