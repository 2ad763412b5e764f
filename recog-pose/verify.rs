use log::debug;
use recog_describe::Match;

use crate::config::PoseConfig;
use crate::error::PoseResult;
use crate::hough::hough;
use crate::transform::Transform2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of pose estimation.
///
/// A probability of 0 (and no transform) means the object was not found.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hypothesis {
    pub transform: Option<Transform2d>,
    /// Fraction of all matches that agree with the transform.
    pub probability: f32,
    pub inliers: usize,
}

impl Hypothesis {
    pub fn not_found() -> Self {
        Self {
            transform: None,
            probability: 0.0,
            inliers: 0,
        }
    }

    pub fn is_found(&self) -> bool {
        self.transform.is_some() && self.probability > 0.0
    }
}

/// Matches whose object anchor lands within `inlier_tolerance` of the scene
/// anchor under `transform`.
pub fn count_inliers(transform: &Transform2d, matches: &[Match], tolerance: f32) -> usize {
    matches
        .iter()
        .filter(|m| {
            let (x, y) = transform.apply(m.query_point.position());
            let (sx, sy) = m.train_point.position();
            (x - sx).hypot(y - sy) <= tolerance
        })
        .count()
}

/// Score `transform` against every match; hypotheses whose inlier ratio does
/// not exceed `acceptance_threshold` are not found.
pub fn verify(transform: &Transform2d, matches: &[Match], config: &PoseConfig) -> PoseResult<Hypothesis> {
    config.validate()?;
    if matches.is_empty() {
        return Ok(Hypothesis::not_found());
    }
    let inliers = count_inliers(transform, matches, config.inlier_tolerance);
    let probability = inliers as f32 / matches.len() as f32;
    debug!(
        "verify: {} of {} matches within {} px (p = {:.3})",
        inliers,
        matches.len(),
        config.inlier_tolerance,
        probability
    );
    if probability <= config.acceptance_threshold {
        return Ok(Hypothesis::not_found());
    }
    Ok(Hypothesis {
        transform: Some(*transform),
        probability,
        inliers,
    })
}

/// Hough voting followed by verification.
///
/// Dimensions are `(height, width)`.
pub fn estimate_pose(
    scene_dims: (usize, usize),
    object_dims: (usize, usize),
    matches: &[Match],
    config: &PoseConfig,
) -> PoseResult<Hypothesis> {
    match hough(scene_dims, object_dims, matches, config)? {
        Some(transform) => verify(&transform, matches, config),
        None => Ok(Hypothesis::not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recog_core::Point;

    fn shifted(r: usize, c: usize, dr: usize, dc: usize) -> Match {
        Match {
            query: 0,
            train: 0,
            distance: 0.0,
            query_point: Point::new(r, c, 1.0),
            train_point: Point::new(r + dr, c + dc, 1.0),
        }
    }

    #[test]
    fn test_verify_counts_inliers() {
        let t = Transform2d::new(1.0, 0.0, 10.0, 0.0);
        let matches = vec![shifted(1, 1, 0, 10), shifted(5, 5, 0, 11), shifted(9, 9, 0, 30)];
        let h = verify(&t, &matches, &PoseConfig::default()).unwrap();
        assert!(h.is_found());
        assert_eq!(h.inliers, 2);
        assert!((h.probability - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_verify_at_threshold_is_not_found() {
        let t = Transform2d::new(1.0, 0.0, 10.0, 0.0);
        let matches = vec![shifted(1, 1, 0, 10), shifted(9, 9, 0, 30)];
        let h = verify(&t, &matches, &PoseConfig::default()).unwrap();
        assert_eq!(h, Hypothesis::not_found());
        assert!(!h.is_found());
    }

    #[test]
    fn test_verify_empty() {
        let h = verify(&Transform2d::identity(), &[], &PoseConfig::default()).unwrap();
        assert_eq!(h.probability, 0.0);
        assert!(h.transform.is_none());
    }

    #[test]
    fn test_estimate_pose_translation() {
        let matches: Vec<Match> = [(5, 5), (20, 8), (12, 30), (40, 41), (33, 17)]
            .iter()
            .map(|&(r, c)| shifted(r, c, 30, 20))
            .collect();
        let h = estimate_pose((128, 128), (64, 64), &matches, &PoseConfig::default()).unwrap();
        assert!(h.is_found());
        assert_eq!(h.probability, 1.0);
        let t = h.transform.unwrap();
        assert!((t.tx - 20.0).abs() < 1e-3 && (t.ty - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_estimate_pose_without_matches() {
        let h = estimate_pose((128, 128), (64, 64), &[], &PoseConfig::default()).unwrap();
        assert_eq!(h, Hypothesis::not_found());
    }
}
