use log::debug;
use recog_core::Image;

use crate::config::DetectorConfig;
use crate::detector::Detection;
use crate::error::DetectResult;

/// A validated [`DetectorConfig`] ready to run on images.
#[derive(Debug, Clone)]
pub struct ConfiguredDetector {
    config: DetectorConfig,
}

impl ConfiguredDetector {
    pub fn new(config: DetectorConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the configured strategy, then ANMS when configured.
    ///
    /// # Arguments
    /// * `image` - single-channel image with samples in `[0, 1]`.
    pub fn detect(&self, image: &Image) -> DetectResult<Detection> {
        let mut detection = self.config.kind.detect(image, &self.config.pyramid)?;
        if let Some(suppression) = &self.config.suppression {
            detection.points = suppression.apply(image, &detection.points)?;
        }
        debug!(
            "{}: {} points after suppression",
            self.config.kind.name(),
            detection.points.len()
        );
        Ok(detection)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn config_summary(&self) -> String {
        self.config.summary()
    }
}
