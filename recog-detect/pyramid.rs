use log::{debug, trace, warn};
use recog_core::{BorderPolicy, Image, Kernel};

use crate::error::{DetectError, DetectResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How many octaves to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OctaveCount {
    /// As many as the image supports.
    #[default]
    Auto,
    /// Requested count, clamped to what the image supports.
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PyramidConfig {
    pub octaves: OctaveCount,
    /// Blur doubles every `scales_per_octave` layers; each octave stores
    /// `scales_per_octave + 3` layers so the DoG has extrema candidates at
    /// every scale of the octave.
    pub scales_per_octave: usize,
    /// Blur of layer 0 of every octave, in that octave's pixels.
    pub sigma_base: f32,
    /// Blur already present in the input image.
    pub sigma_input: f32,
    /// Smallest allowed side of the coarsest octave.
    pub min_size: usize,
    pub border: BorderPolicy,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            octaves: OctaveCount::Auto,
            scales_per_octave: 3,
            sigma_base: 1.6,
            sigma_input: 0.5,
            min_size: 4,
            border: BorderPolicy::Replicate,
        }
    }
}

impl PyramidConfig {
    pub fn validate(&self) -> DetectResult<()> {
        if self.scales_per_octave == 0 {
            return Err(DetectError::InvalidPyramid(
                "scales_per_octave must be >= 1".to_string(),
            ));
        }
        if !(self.sigma_base > 0.0) || !(self.sigma_input >= 0.0) {
            return Err(DetectError::InvalidPyramid(format!(
                "sigmas must be positive (base {}, input {})",
                self.sigma_base, self.sigma_input
            )));
        }
        if self.min_size == 0 {
            return Err(DetectError::InvalidPyramid("min_size must be >= 1".to_string()));
        }
        if self.octaves == OctaveCount::Fixed(0) {
            return Err(DetectError::InvalidPyramid("octave count must be >= 1".to_string()));
        }
        Ok(())
    }

    pub fn layers_per_octave(&self) -> usize {
        self.scales_per_octave + 3
    }
}

/// Largest octave count keeping the coarsest octave's smaller side `>= min_size`.
///
/// Octave 0 always exists, even for images already below the floor.
pub fn max_octave_count(height: usize, width: usize, min_size: usize) -> usize {
    let mut count = 1;
    let (mut h, mut w) = (height / 2, width / 2);
    while h.min(w) >= min_size.max(1) {
        count += 1;
        h /= 2;
        w /= 2;
    }
    count
}

/// One blur level of one octave.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub image: Image,
    /// Blur in the octave's own pixels.
    pub sigma_local: f32,
    /// Blur in input-image pixels.
    pub sigma_global: f32,
    pub octave: usize,
    pub layer: usize,
}

/// Gaussian scale space: octaves of equally sized, increasingly blurred layers.
///
/// The same type holds the DoG derived from it, whose layers carry the blur of
/// the lower layer of each difference.
#[derive(Debug, Clone, PartialEq)]
pub struct Pyramid {
    octaves: Vec<Vec<Layer>>,
    scales_per_octave: usize,
}

impl Pyramid {
    pub fn build(image: &Image, config: &PyramidConfig) -> DetectResult<Self> {
        config.validate()?;
        let supported = max_octave_count(image.height(), image.width(), config.min_size);
        let count = match config.octaves {
            OctaveCount::Auto => supported,
            OctaveCount::Fixed(n) if n > supported => {
                warn!(
                    "requested {} octaves but a {}x{} image supports {}, clamping",
                    n,
                    image.height(),
                    image.width(),
                    supported
                );
                supported
            }
            OctaveCount::Fixed(n) => n,
        };

        let s = config.scales_per_octave;
        let k = 2f32.powf(1.0 / s as f32);
        let pre_blur = (config.sigma_base.powi(2) - config.sigma_input.powi(2)).max(0.0).sqrt();
        let mut base = if pre_blur > 1e-3 {
            Kernel::gaussian(pre_blur)?.apply(image, config.border)?
        } else {
            image.clone()
        };

        let mut octaves = Vec::with_capacity(count);
        for octave in 0..count {
            let mut layers = Vec::with_capacity(config.layers_per_octave());
            for layer in 0..config.layers_per_octave() {
                let sigma_local = config.sigma_base * k.powi(layer as i32);
                let layer_image = if layer == 0 {
                    base.clone()
                } else {
                    let extra = (sigma_local.powi(2) - config.sigma_base.powi(2)).sqrt();
                    Kernel::gaussian(extra)?.apply(&base, config.border)?
                };
                layers.push(Layer {
                    image: layer_image,
                    sigma_local,
                    sigma_global: sigma_local * (1usize << octave) as f32,
                    octave,
                    layer,
                });
            }
            trace!(
                "octave {}: {}x{}, {} layers",
                octave,
                base.height(),
                base.width(),
                layers.len()
            );
            base = layers[s].image.downsample_half()?;
            octaves.push(layers);
        }
        debug!("built pyramid with {} octaves", octaves.len());

        Ok(Self {
            octaves,
            scales_per_octave: s,
        })
    }

    /// Adjacent-layer differences `L[i + 1] - L[i]`, one fewer layer per octave.
    pub fn dog(&self) -> DetectResult<Pyramid> {
        let mut octaves = Vec::with_capacity(self.octaves.len());
        for layers in &self.octaves {
            let mut diffs = Vec::with_capacity(layers.len().saturating_sub(1));
            for (i, pair) in layers.windows(2).enumerate() {
                diffs.push(Layer {
                    image: pair[1].image.zip_with(&pair[0].image, |a, b| a - b)?,
                    sigma_local: pair[0].sigma_local,
                    sigma_global: pair[0].sigma_global,
                    octave: pair[0].octave,
                    layer: i,
                });
            }
            octaves.push(diffs);
        }
        Ok(Pyramid {
            octaves,
            scales_per_octave: self.scales_per_octave,
        })
    }

    pub fn octave_count(&self) -> usize {
        self.octaves.len()
    }

    pub fn scales_per_octave(&self) -> usize {
        self.scales_per_octave
    }

    pub fn octave(&self, octave: usize) -> Option<&[Layer]> {
        self.octaves.get(octave).map(|layers| layers.as_slice())
    }

    pub fn layer(&self, octave: usize, layer: usize) -> Option<&Layer> {
        self.octaves.get(octave).and_then(|layers| layers.get(layer))
    }

    /// All layers, octave by octave.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.octaves.iter().flatten()
    }

    /// Layer whose global blur is closest to `sigma` on a log scale.
    pub fn nearest_layer(&self, sigma: f32) -> Option<&Layer> {
        let target = sigma.max(f32::MIN_POSITIVE).ln();
        self.layers().min_by(|a, b| {
            let da = (a.sigma_global.ln() - target).abs();
            let db = (b.sigma_global.ln() - target).abs();
            da.total_cmp(&db)
        })
    }
}
