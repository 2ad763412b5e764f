use log::debug;
use recog_core::{Image, Point};

use crate::blobs::{blobs, shi_tomasi, ShiTomasiParams};
use crate::corner_detection::{harris, moravec, HarrisParams, MoravecParams};
use crate::error::DetectResult;
use crate::pyramid::{Pyramid, PyramidConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Detector family and its parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DetectorKind {
    Moravec(MoravecParams),
    Harris(HarrisParams),
    /// DoG blob extrema refined by the Shi-Tomasi eigenvalue test.
    ShiTomasi(ShiTomasiParams),
}

impl Default for DetectorKind {
    fn default() -> Self {
        DetectorKind::Harris(HarrisParams::default())
    }
}

/// Points found in an image, plus the Gaussian pyramid when one was built.
#[derive(Debug, Clone)]
pub struct Detection {
    pub points: Vec<Point>,
    pub pyramid: Option<Pyramid>,
}

impl DetectorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::Moravec(_) => "moravec",
            DetectorKind::Harris(_) => "harris",
            DetectorKind::ShiTomasi(_) => "shi-tomasi",
        }
    }

    /// Whether detection runs on a scale space rather than the input image.
    pub fn uses_pyramid(&self) -> bool {
        matches!(self, DetectorKind::ShiTomasi(_))
    }

    pub fn validate(&self) -> DetectResult<()> {
        match self {
            DetectorKind::Moravec(p) => p.validate(),
            DetectorKind::Harris(p) => p.validate(),
            DetectorKind::ShiTomasi(p) => p.validate(),
        }
    }

    pub fn detect(&self, image: &Image, pyramid: &PyramidConfig) -> DetectResult<Detection> {
        let detection = match self {
            DetectorKind::Moravec(params) => Detection {
                points: moravec(image, params)?,
                pyramid: None,
            },
            DetectorKind::Harris(params) => Detection {
                points: harris(image, params)?,
                pyramid: None,
            },
            DetectorKind::ShiTomasi(params) => {
                let gaussian = Pyramid::build(image, pyramid)?;
                let dog = gaussian.dog()?;
                let candidates = blobs(&dog, params.contrast_threshold)?;
                Detection {
                    points: shi_tomasi(&dog, &candidates, params)?,
                    pyramid: Some(gaussian),
                }
            }
        };
        debug!("{}: {} points", self.name(), detection.points.len());
        Ok(detection)
    }
}
