//! Object recognition from local features.
//!
//! A [`Recognizer`] describes an object image once, then looks for it in
//! scenes: detect, describe, ratio-test match, Hough pose and verification.
//!
//! ```no_run
//! use recog_cli::{io, Recognizer, RecognizerConfig};
//!
//! let recognizer = Recognizer::new(RecognizerConfig::default())?;
//! let object = io::load("object.png")?;
//! let scene = io::load("scene.png")?;
//! let hypothesis = recognizer.recognize(&object, &scene)?;
//! if hypothesis.is_found() {
//!     println!("found with p = {:.2}", hypothesis.probability);
//! }
//! # Ok::<(), recog_cli::RecogError>(())
//! ```

pub mod config;
pub mod error;
pub mod io;

use log::{debug, info};
use rayon::prelude::*;
use recog_core::{Image, Point};
use recog_describe::{Descriptor, Match};
use recog_detect::ConfiguredDetector;
use recog_pose::{estimate_pose, Hypothesis};

pub use config::RecognizerConfig;
pub use error::{RecogError, RecogResult};
pub use io::HypothesisRecord;
pub use recog_core;
pub use recog_describe;
pub use recog_detect;
pub use recog_pose;

/// Size the global rayon pool. Fails if the pool was already built.
pub fn init_thread_pool(n_threads: usize) -> RecogResult<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()?;
    Ok(())
}

/// Points and descriptors of one image.
#[derive(Debug, Clone)]
pub struct Features {
    pub points: Vec<Point>,
    pub descriptors: Vec<Descriptor>,
    /// `(height, width)` of the described image.
    pub dims: (usize, usize),
}

/// Everything produced while looking for an object in one scene.
#[derive(Debug, Clone)]
pub struct Recognition {
    pub features: Features,
    pub matches: Vec<Match>,
    pub hypothesis: Hypothesis,
}

/// The full pipeline under one [`RecognizerConfig`].
#[derive(Debug, Clone)]
pub struct Recognizer {
    config: RecognizerConfig,
    detector: ConfiguredDetector,
}

impl Recognizer {
    pub fn new(config: RecognizerConfig) -> RecogResult<Self> {
        config.validate()?;
        let detector = ConfiguredDetector::new(config.detector.clone())?;
        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Detect and describe `image`.
    pub fn describe(&self, image: &Image) -> RecogResult<Features> {
        let detection = self.detector.detect(image)?;
        let descriptors = self
            .config
            .descriptor
            .extract(image, &detection.points, detection.pyramid.as_ref())?;
        Ok(Features {
            points: detection.points,
            descriptors,
            dims: (image.height(), image.width()),
        })
    }

    /// Ratio-test matches from `object` (query) into `scene` (train).
    pub fn match_features(&self, object: &Features, scene: &Features) -> RecogResult<Vec<Match>> {
        Ok(self
            .config
            .matcher
            .match_descriptors(&object.descriptors, &scene.descriptors)?)
    }

    /// Look for already described `object` features in `scene`.
    pub fn recognize_scene(&self, object: &Features, scene: &Image) -> RecogResult<Recognition> {
        let features = self.describe(scene)?;
        let matches = self.match_features(object, &features)?;
        let hypothesis = estimate_pose(features.dims, object.dims, &matches, &self.config.pose)?;
        debug!(
            "{} object / {} scene descriptors, {} matches, p = {:.3}",
            object.descriptors.len(),
            features.descriptors.len(),
            matches.len(),
            hypothesis.probability
        );
        Ok(Recognition {
            features,
            matches,
            hypothesis,
        })
    }

    pub fn recognize(&self, object: &Image, scene: &Image) -> RecogResult<Hypothesis> {
        let object = self.describe(object)?;
        Ok(self.recognize_scene(&object, scene)?.hypothesis)
    }

    /// Describe `object` once and search every scene in parallel.
    ///
    /// The result keeps the order of `scenes`.
    pub fn recognize_batch(&self, object: &Image, scenes: &[Image]) -> RecogResult<Vec<Hypothesis>> {
        let object = self.describe(object)?;
        let hypotheses = scenes
            .par_iter()
            .map(|scene| self.recognize_scene(&object, scene).map(|r| r.hypothesis))
            .collect::<RecogResult<Vec<_>>>()?;
        info!(
            "object found in {} of {} scenes",
            hypotheses.iter().filter(|h| h.is_found()).count(),
            scenes.len()
        );
        Ok(hypotheses)
    }
}
