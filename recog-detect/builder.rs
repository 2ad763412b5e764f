use recog_core::BorderPolicy;

use crate::blobs::ShiTomasiParams;
use crate::config::DetectorConfig;
use crate::configured_detector::ConfiguredDetector;
use crate::corner_detection::{HarrisParams, MoravecParams};
use crate::detector::DetectorKind;
use crate::error::DetectResult;
use crate::pyramid::OctaveCount;
use crate::suppression::SuppressionConfig;

/// Builder for creating a `ConfiguredDetector`
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    config: DetectorConfig,
}

impl DetectorBuilder {
    /// Harris corners, automatic octave count, no suppression
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn moravec(mut self, params: MoravecParams) -> Self {
        self.config.kind = DetectorKind::Moravec(params);
        self
    }

    pub fn harris(mut self, params: HarrisParams) -> Self {
        self.config.kind = DetectorKind::Harris(params);
        self
    }

    pub fn shi_tomasi(mut self, params: ShiTomasiParams) -> Self {
        self.config.kind = DetectorKind::ShiTomasi(params);
        self
    }

    /// Request an explicit octave count (clamped to the image at build time)
    pub fn octaves(mut self, count: usize) -> Self {
        self.config.pyramid.octaves = OctaveCount::Fixed(count);
        self
    }

    pub fn auto_octaves(mut self) -> Self {
        self.config.pyramid.octaves = OctaveCount::Auto;
        self
    }

    pub fn scales_per_octave(mut self, scales: usize) -> Self {
        self.config.pyramid.scales_per_octave = scales;
        self
    }

    pub fn sigma_base(mut self, sigma: f32) -> Self {
        self.config.pyramid.sigma_base = sigma;
        self
    }

    /// Keep at most `target` points with adaptive non-maximum suppression
    pub fn suppression(mut self, target: usize, initial_radius: Option<f32>) -> Self {
        self.config.suppression = Some(SuppressionConfig {
            target,
            initial_radius,
        });
        self
    }

    pub fn no_suppression(mut self) -> Self {
        self.config.suppression = None;
        self
    }

    pub fn border(mut self, border: BorderPolicy) -> Self {
        self.config = self.config.with_border(border);
        self
    }

    pub fn metadata(mut self, name: &str, description: &str) -> Self {
        self.config = self.config.with_metadata(name, description);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Validate and build the detector
    pub fn build(self) -> DetectResult<ConfiguredDetector> {
        ConfiguredDetector::new(self.config)
    }
}
