use crate::border::BorderPolicy;
use crate::error::{CoreError, CoreResult};

/// Row-major floating-point image with interleaved channels.
///
/// `Clone` performs a deep copy: derived images never share storage with
/// their source.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    height: usize,
    width: usize,
    channels: usize,
    step: usize,
    data: Vec<f32>,
}

impl Image {
    /// Zero-filled image.
    pub fn new(height: usize, width: usize, channels: usize) -> CoreResult<Self> {
        Self::filled(height, width, channels, 0.0)
    }

    pub fn filled(height: usize, width: usize, channels: usize, value: f32) -> CoreResult<Self> {
        Self::check_dims(height, width, channels)?;
        Ok(Self {
            height,
            width,
            channels,
            step: width * channels,
            data: vec![value; height * width * channels],
        })
    }

    /// Wrap an existing buffer; `data.len()` must equal `height * width * channels`.
    pub fn from_vec(height: usize, width: usize, channels: usize, data: Vec<f32>) -> CoreResult<Self> {
        Self::check_dims(height, width, channels)?;
        let expected_len = height * width * channels;
        if data.len() != expected_len {
            return Err(CoreError::InvalidImageData {
                expected_len,
                actual_len: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            channels,
            step: width * channels,
            data,
        })
    }

    /// Single-channel image whose samples are `f(row, col)`.
    pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> CoreResult<Self>
    where
        F: FnMut(usize, usize) -> f32,
    {
        Self::check_dims(height, width, 1)?;
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self::from_vec(height, width, 1, data)
    }

    fn check_dims(height: usize, width: usize, channels: usize) -> CoreResult<()> {
        if height == 0 || width == 0 || channels == 0 {
            return Err(CoreError::ZeroSizeImage {
                height,
                width,
                channels,
            });
        }
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per row.
    pub fn step(&self) -> usize {
        self.step
    }

    /// `(height, width, channels)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Samples of `row`; panics if `row >= height`.
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.step;
        &self.data[start..start + self.step]
    }

    fn check_bounds(&self, row: usize, col: usize) -> CoreResult<()> {
        if row >= self.height || col >= self.width {
            return Err(CoreError::OutOfBounds {
                row,
                col,
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }

    /// First channel at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> CoreResult<f32> {
        self.check_bounds(row, col)?;
        Ok(self.data[row * self.step + col * self.channels])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) -> CoreResult<()> {
        self.check_bounds(row, col)?;
        self.data[row * self.step + col * self.channels] = value;
        Ok(())
    }

    /// First channel at `(row, col)`; panics when out of range.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.step + col * self.channels]
    }

    /// First channel at a possibly out-of-range position, resolved through `border`.
    #[inline]
    pub fn sample(&self, row: isize, col: isize, border: BorderPolicy) -> f32 {
        match (
            border.resolve(row, self.height),
            border.resolve(col, self.width),
        ) {
            (Some(r), Some(c)) => self.value(r, c),
            _ => border.fill_value(),
        }
    }

    /// Bilinear sample of the first channel at fractional `(y, x)`.
    pub fn sample_bilinear(&self, y: f32, x: f32, border: BorderPolicy) -> f32 {
        let y0 = y.floor();
        let x0 = x.floor();
        let fy = y - y0;
        let fx = x - x0;
        let (r, c) = (y0 as isize, x0 as isize);

        let p00 = self.sample(r, c, border);
        let p01 = self.sample(r, c + 1, border);
        let p10 = self.sample(r + 1, c, border);
        let p11 = self.sample(r + 1, c + 1, border);

        let top = p00 * (1.0 - fx) + p01 * fx;
        let bottom = p10 * (1.0 - fx) + p11 * fx;
        top * (1.0 - fy) + bottom * fy
    }

    /// Apply `f` to every sample.
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Image {
        self.with_data(self.data.iter().map(|&v| f(v)).collect())
    }

    /// Combine two same-shaped images sample by sample.
    pub fn zip_with<F: Fn(f32, f32) -> f32>(&self, other: &Image, f: F) -> CoreResult<Image> {
        if self.shape() != other.shape() {
            return Err(CoreError::ShapeMismatch(self.shape(), other.shape()));
        }
        Ok(self.with_data(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        ))
    }

    fn with_data(&self, data: Vec<f32>) -> Image {
        debug_assert_eq!(data.len(), self.data.len());
        Image {
            height: self.height,
            width: self.width,
            channels: self.channels,
            step: self.step,
            data,
        }
    }

    /// Keep every second row and column (nearest sampling).
    pub fn downsample_half(&self) -> CoreResult<Image> {
        let height = (self.height / 2).max(1);
        let width = (self.width / 2).max(1);
        let mut data = Vec::with_capacity(height * width * self.channels);
        for row in 0..height {
            let src = self.row(row * 2);
            for col in 0..width {
                let start = col * 2 * self.channels;
                data.extend_from_slice(&src[start..start + self.channels]);
            }
        }
        Image::from_vec(height, width, self.channels, data)
    }

    /// Luma conversion of a 3-channel (RGB) image; single-channel input is copied.
    pub fn to_grayscale(&self) -> CoreResult<Image> {
        match self.channels {
            1 => Ok(self.clone()),
            3 => {
                let data = self
                    .data
                    .chunks_exact(3)
                    .map(|px| 0.299 * px[0] + 0.587 * px[1] + 0.114 * px[2])
                    .collect();
                Image::from_vec(self.height, self.width, 1, data)
            }
            actual => Err(CoreError::UnsupportedChannels {
                expected: 3,
                actual,
            }),
        }
    }

    /// Min-max stretch to `[0, 1]`; a constant image maps to zeros.
    pub fn normalized(&self) -> Image {
        let (min, max) = self
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        if range <= f32::EPSILON {
            return self.map(|_| 0.0);
        }
        self.map(|v| (v - min) / range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(height: usize, width: usize) -> Image {
        Image::from_fn(height, width, |r, c| (r * width + c) as f32).unwrap()
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(Image::new(0, 4, 1), Err(CoreError::ZeroSizeImage { .. })));
        assert!(matches!(Image::new(4, 0, 1), Err(CoreError::ZeroSizeImage { .. })));
        assert!(matches!(Image::new(4, 4, 0), Err(CoreError::ZeroSizeImage { .. })));
    }

    #[test]
    fn test_data_length_checked() {
        let result = Image::from_vec(2, 2, 1, vec![0.0; 3]);
        assert!(matches!(
            result,
            Err(CoreError::InvalidImageData { expected_len: 4, actual_len: 3 })
        ));
    }

    #[test]
    fn test_step_and_access() {
        let img = ramp(3, 4);
        assert_eq!(img.step(), 4);
        assert_eq!(img.get(2, 3).unwrap(), 11.0);
        assert_eq!(img.row(1), &[4.0, 5.0, 6.0, 7.0]);
        assert!(matches!(img.get(3, 0), Err(CoreError::OutOfBounds { .. })));
        assert!(matches!(img.get(0, 4), Err(CoreError::OutOfBounds { .. })));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = ramp(2, 2);
        let mut copy = original.clone();
        copy.set(0, 0, 42.0).unwrap();
        assert_eq!(original.get(0, 0).unwrap(), 0.0);
        assert_eq!(copy.get(0, 0).unwrap(), 42.0);
    }

    #[test]
    fn test_sample_with_border() {
        let img = ramp(3, 3);
        assert_eq!(img.sample(-1, -1, BorderPolicy::Replicate), 0.0);
        assert_eq!(img.sample(1, 5, BorderPolicy::Replicate), 5.0);
        assert_eq!(img.sample(-1, 0, BorderPolicy::Constant(7.0)), 7.0);
    }

    #[test]
    fn test_bilinear_midpoint() {
        let img = ramp(2, 2);
        let v = img.sample_bilinear(0.5, 0.5, BorderPolicy::Replicate);
        assert!((v - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_downsample_half() {
        let img = ramp(5, 4);
        let half = img.downsample_half().unwrap();
        assert_eq!(half.shape(), (2, 2, 1));
        assert_eq!(half.as_slice(), &[0.0, 2.0, 8.0, 10.0]);
    }

    #[test]
    fn test_zip_with_shape_mismatch() {
        let a = ramp(2, 2);
        let b = ramp(2, 3);
        assert!(matches!(a.zip_with(&b, |x, y| x - y), Err(CoreError::ShapeMismatch(..))));
        let d = a.zip_with(&a, |x, y| x - y).unwrap();
        assert!(d.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_grayscale_and_normalize() {
        let rgb = Image::from_vec(1, 2, 3, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let gray = rgb.to_grayscale().unwrap();
        assert_eq!(gray.channels(), 1);
        assert!((gray.as_slice()[0] - 1.0).abs() < 1e-6);

        let stretched = ramp(2, 2).normalized();
        assert_eq!(stretched.as_slice(), &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);

        let flat = Image::filled(2, 2, 1, 0.4).unwrap().normalized();
        assert!(flat.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_grayscale_rejects_two_channels() {
        let img = Image::new(2, 2, 2).unwrap();
        assert!(matches!(
            img.to_grayscale(),
            Err(CoreError::UnsupportedChannels { actual: 2, .. })
        ));
    }
}
