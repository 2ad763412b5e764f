use recog_core::BorderPolicy;

use crate::blobs::ShiTomasiParams;
use crate::builder::DetectorBuilder;
use crate::corner_detection::{HarrisParams, MoravecParams};
use crate::detector::DetectorKind;
use crate::error::DetectResult;
use crate::pyramid::PyramidConfig;
use crate::suppression::SuppressionConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete detector configuration: strategy, scale space and suppression.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    pub pyramid: PyramidConfig,
    /// ANMS applied after detection; `None` keeps every point.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub suppression: Option<SuppressionConfig>,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub version: Option<String>,
}

impl DetectorConfig {
    pub fn new(kind: DetectorKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Moravec corners thinned to 300 points
    pub fn moravec_preset() -> Self {
        Self {
            kind: DetectorKind::Moravec(MoravecParams::default()),
            pyramid: PyramidConfig::default(),
            suppression: Some(SuppressionConfig::default()),
            name: Some("Moravec".to_string()),
            description: Some("Direction-discrete corner strength with ANMS".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Harris corners thinned to 300 points
    pub fn harris_preset() -> Self {
        Self {
            kind: DetectorKind::Harris(HarrisParams::default()),
            pyramid: PyramidConfig::default(),
            suppression: Some(SuppressionConfig::default()),
            name: Some("Harris".to_string()),
            description: Some("Structure-tensor corners with ANMS".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Scale-space blobs for scale-invariant descriptors
    pub fn blob_preset() -> Self {
        Self {
            kind: DetectorKind::ShiTomasi(ShiTomasiParams::default()),
            pyramid: PyramidConfig::default(),
            suppression: Some(SuppressionConfig {
                target: 500,
                initial_radius: None,
            }),
            name: Some("Blob".to_string()),
            description: Some("DoG extrema refined by the Shi-Tomasi eigenvalue".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Sets the border policy of the detector and of the pyramid.
    pub fn with_border(mut self, border: BorderPolicy) -> Self {
        match &mut self.kind {
            DetectorKind::Moravec(p) => p.border = border,
            DetectorKind::Harris(p) => p.border = border,
            DetectorKind::ShiTomasi(p) => p.border = border,
        }
        self.pyramid.border = border;
        self
    }

    pub fn to_builder(self) -> DetectorBuilder {
        DetectorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let suppression = match &self.suppression {
            Some(s) => format!("anms(target={})", s.target),
            None => "none".to_string(),
        };
        format!(
            "DetectorConfig: {}{}, pyramid=[octaves:{:?}, scales:{}, sigma:{}], suppression={}",
            self.kind.name(),
            self.name
                .as_deref()
                .map(|n| format!(" ({})", n))
                .unwrap_or_default(),
            self.pyramid.octaves,
            self.pyramid.scales_per_octave,
            self.pyramid.sigma_base,
            suppression
        )
    }

    pub fn validate(&self) -> DetectResult<()> {
        self.kind.validate()?;
        self.pyramid.validate()?;
        if let Some(suppression) = &self.suppression {
            suppression.validate()?;
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::OctaveCount;

    #[test]
    fn test_presets_validate() {
        for config in [
            DetectorConfig::moravec_preset(),
            DetectorConfig::harris_preset(),
            DetectorConfig::blob_preset(),
            DetectorConfig::default(),
        ] {
            assert!(config.validate().is_ok(), "{}", config.summary());
        }
        assert!(DetectorConfig::blob_preset().kind.uses_pyramid());
    }

    #[test]
    fn test_summary_and_metadata() {
        let config = DetectorConfig::harris_preset().with_metadata("Custom", "test config");
        assert_eq!(config.name.as_deref(), Some("Custom"));
        let summary = config.summary();
        assert!(summary.contains("harris"));
        assert!(summary.contains("Custom"));
        assert!(summary.contains("anms(target=300)"));
    }

    #[test]
    fn test_with_border_reaches_every_stage() {
        let config = DetectorConfig::blob_preset().with_border(BorderPolicy::Reflect);
        assert_eq!(config.pyramid.border, BorderPolicy::Reflect);
        match config.kind {
            DetectorKind::ShiTomasi(p) => assert_eq!(p.border, BorderPolicy::Reflect),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_invalid_nested_config() {
        let mut config = DetectorConfig::harris_preset();
        config.pyramid.scales_per_octave = 0;
        assert!(config.validate().is_err());
        let mut config = DetectorConfig::harris_preset();
        config.pyramid.octaves = OctaveCount::Fixed(0);
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_and_toml_round_trip() {
        let config = DetectorConfig::blob_preset();
        let json = config.to_json().unwrap();
        assert_eq!(DetectorConfig::from_json(&json).unwrap(), config);
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: DetectorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
