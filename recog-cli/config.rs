use std::path::Path;

use recog_describe::{DescriptorConfig, DescriptorKind, MatcherConfig};
use recog_detect::DetectorConfig;
use recog_pose::PoseConfig;
use serde::{Deserialize, Serialize};

use crate::error::{RecogError, RecogResult};

/// Every setting of the recognition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    pub detector: DetectorConfig,
    pub descriptor: DescriptorConfig,
    pub matcher: MatcherConfig,
    pub pose: PoseConfig,
    /// Worker threads for batch recognition; the CPU count when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::harris_preset(),
            descriptor: DescriptorConfig::default(),
            matcher: MatcherConfig {
                ratio_threshold: 0.75,
            },
            pose: PoseConfig::default(),
            threads: None,
        }
    }
}

impl RecognizerConfig {
    /// Blob detection with scale- and rotation-invariant descriptors
    pub fn invariant_preset() -> Self {
        Self {
            detector: DetectorConfig::blob_preset(),
            descriptor: DescriptorConfig {
                kind: DescriptorKind::ScaleRotationInvariant(Default::default()),
                ..DescriptorConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> RecogResult<()> {
        self.detector.validate()?;
        self.descriptor.validate()?;
        self.matcher.validate()?;
        self.pose.validate()?;
        Ok(())
    }

    pub fn to_json(&self) -> RecogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> RecogResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> RecogResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(text: &str) -> RecogResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` or `.toml` file.
    pub fn load<P: AsRef<Path>>(path: P) -> RecogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match extension(path).as_deref() {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            _ => Err(RecogError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Save as JSON or TOML depending on the extension of `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RecogResult<()> {
        let path = path.as_ref();
        let content = match extension(path).as_deref() {
            Some("json") => self.to_json()?,
            Some("toml") => self.to_toml()?,
            _ => return Err(RecogError::UnsupportedFormat(path.to_path_buf())),
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
