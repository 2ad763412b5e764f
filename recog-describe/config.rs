use std::borrow::Cow;

use log::debug;
use recog_core::{Image, Point};
use recog_detect::{Pyramid, PyramidConfig};

use crate::descriptor::Descriptor;
use crate::error::DescribeResult;
use crate::hog::{histogrid, rhistogrid, rsi_descriptors, si_descriptors, HogParams, OrientationParams};
use crate::postprocess::{apply_all, PostProcess};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Descriptor family.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DescriptorKind {
    /// HOG on the input image.
    #[default]
    Plain,
    /// HOG on the Gaussian layer of each point.
    ScaleInvariant,
    /// HOG rotated to each dominant orientation, on the input image.
    RotationInvariant(OrientationParams),
    /// Both of the above.
    ScaleRotationInvariant(OrientationParams),
}

impl DescriptorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::Plain => "plain",
            DescriptorKind::ScaleInvariant => "scale-invariant",
            DescriptorKind::RotationInvariant(_) => "rotation-invariant",
            DescriptorKind::ScaleRotationInvariant(_) => "scale-rotation-invariant",
        }
    }

    pub fn uses_pyramid(&self) -> bool {
        matches!(
            self,
            DescriptorKind::ScaleInvariant | DescriptorKind::ScaleRotationInvariant(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DescriptorConfig {
    pub kind: DescriptorKind,
    pub hog: HogParams,
    /// Applied to every descriptor in order.
    pub post_process: Vec<PostProcess>,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            kind: DescriptorKind::Plain,
            hog: HogParams::default(),
            post_process: PostProcess::default_pipeline(),
        }
    }
}

impl DescriptorConfig {
    pub fn validate(&self) -> DescribeResult<()> {
        self.hog.validate()?;
        match &self.kind {
            DescriptorKind::RotationInvariant(o) | DescriptorKind::ScaleRotationInvariant(o) => {
                o.validate()
            }
            _ => Ok(()),
        }
    }

    /// Describe `points` found on `image`.
    ///
    /// Scale-aware kinds use `pyramid` when given, otherwise they build one with
    /// default settings.
    pub fn extract(
        &self,
        image: &Image,
        points: &[Point],
        pyramid: Option<&Pyramid>,
    ) -> DescribeResult<Vec<Descriptor>> {
        self.validate()?;
        let pyramid = match (self.kind.uses_pyramid(), pyramid) {
            (false, _) => None,
            (true, Some(p)) => Some(Cow::Borrowed(p)),
            (true, None) => {
                let config = PyramidConfig {
                    border: self.hog.border,
                    ..PyramidConfig::default()
                };
                Some(Cow::Owned(Pyramid::build(image, &config)?))
            }
        };

        let raw = match (&self.kind, pyramid.as_deref()) {
            (DescriptorKind::ScaleInvariant, Some(p)) => si_descriptors(points, p, &self.hog)?,
            (DescriptorKind::ScaleRotationInvariant(o), Some(p)) => {
                rsi_descriptors(points, p, &self.hog, o)?
            }
            (DescriptorKind::RotationInvariant(o), _) => rhistogrid(points, image, &self.hog, o)?,
            _ => histogrid(points, image, &self.hog)?,
        };
        let descriptors: Vec<Descriptor> = raw
            .into_iter()
            .map(|d| apply_all(&self.post_process, d))
            .collect();
        debug!(
            "{} descriptors: {} from {} points",
            self.kind.name(),
            descriptors.len(),
            points.len()
        );
        Ok(descriptors)
    }
}
