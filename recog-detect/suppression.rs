//! Adaptive non-maximum suppression (ANMS).

use log::debug;
use recog_core::{Image, Point};

use crate::error::{DetectError, DetectResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuppressionConfig {
    /// Number of points to keep.
    pub target: usize,
    /// Radius cap; `None` uses [`default_radius`] of the analysed image.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub initial_radius: Option<f32>,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            target: 300,
            initial_radius: None,
        }
    }
}

impl SuppressionConfig {
    pub fn validate(&self) -> DetectResult<()> {
        if self.target == 0 {
            return Err(DetectError::InvalidSuppression(
                "target count must be at least 1".to_string(),
            ));
        }
        if let Some(radius) = self.initial_radius {
            if !(radius > 0.0) || !radius.is_finite() {
                return Err(DetectError::InvalidSuppression(format!(
                    "initial radius must be positive (got {})",
                    radius
                )));
            }
        }
        Ok(())
    }

    /// Run ANMS on points detected in `image`.
    pub fn apply(&self, image: &Image, points: &[Point]) -> DetectResult<Vec<Point>> {
        self.validate()?;
        let radius = self.initial_radius.unwrap_or_else(|| default_radius(image));
        Ok(adaptive_non_maximum_suppression(
            points,
            self.target,
            radius,
            euclidean_distance,
        ))
    }
}

/// Euclidean distance between point positions in input-image pixels.
pub fn euclidean_distance(a: &Point, b: &Point) -> f32 {
    let (ax, ay) = a.position();
    let (bx, by) = b.position();
    (ax - bx).hypot(ay - by)
}

/// Half the diagonal of the square on the image's smaller side.
pub fn default_radius(image: &Image) -> f32 {
    let min_dim = image.height().min(image.width()) as f32;
    min_dim.hypot(min_dim) / 2.0
}

/// Keep the `target` points with the largest suppression radius.
///
/// A point's radius is the distance to the closest point that dominates it
/// (strictly higher score, or equal score and earlier in `points`), capped at
/// `initial_radius`. Points with equal radius keep their input order.
pub fn adaptive_non_maximum_suppression<F>(
    points: &[Point],
    target: usize,
    initial_radius: f32,
    distance_fn: F,
) -> Vec<Point>
where
    F: Fn(&Point, &Point) -> f32,
{
    if points.is_empty() || target == 0 {
        return Vec::new();
    }

    let mut radii: Vec<(usize, f32)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let radius = points
                .iter()
                .enumerate()
                .filter(|&(j, q)| q.score > p.score || (q.score == p.score && j < i))
                .map(|(_, q)| distance_fn(p, q))
                .fold(initial_radius, f32::min);
            (i, radius)
        })
        .collect();

    radii.sort_by(|a, b| b.1.total_cmp(&a.1));
    let kept: Vec<Point> = radii
        .into_iter()
        .take(target)
        .map(|(i, _)| points[i])
        .collect();
    debug!("anms: kept {} of {} points", kept.len(), points.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        assert!(adaptive_non_maximum_suppression(&[], 10, 5.0, euclidean_distance).is_empty());
    }

    #[test]
    fn test_spread_beats_cluster() {
        // A strong cluster in one corner and a weaker isolated point.
        let points = vec![
            Point::new(10, 10, 10.0),
            Point::new(10, 11, 9.0),
            Point::new(11, 10, 8.0),
            Point::new(80, 80, 1.0),
        ];
        let kept = adaptive_non_maximum_suppression(&points, 2, 100.0, euclidean_distance);
        assert_eq!(kept.len(), 2);
        assert_eq!((kept[0].row, kept[0].col), (10, 10));
        assert_eq!((kept[1].row, kept[1].col), (80, 80));
    }

    #[test]
    fn test_equal_scores_first_seen_dominates() {
        let points = vec![Point::new(0, 0, 1.0), Point::new(0, 3, 1.0)];
        let kept = adaptive_non_maximum_suppression(&points, 1, 50.0, euclidean_distance);
        assert_eq!((kept[0].row, kept[0].col), (0, 0));
    }

    #[test]
    fn test_default_radius() {
        let img = Image::new(30, 40, 1).unwrap();
        assert!((default_radius(&img) - 30.0 * std::f32::consts::SQRT_2 / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_config_validation() {
        let img = Image::new(8, 8, 1).unwrap();
        let bad = SuppressionConfig {
            target: 0,
            initial_radius: None,
        };
        assert!(bad.apply(&img, &[]).is_err());
        let bad = SuppressionConfig {
            target: 3,
            initial_radius: Some(-1.0),
        };
        assert!(matches!(bad.validate(), Err(DetectError::InvalidSuppression(_))));
    }

    fn chebyshev_distance(a: &Point, b: &Point) -> f32 {
        let (ax, ay) = a.position();
        let (bx, by) = b.position();
        (ax - bx).abs().max((ay - by).abs())
    }

    /// Suppression radius of every point, recomputed independently.
    fn radii(points: &[Point], cap: f32) -> Vec<f32> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut radius = cap;
                for (j, q) in points.iter().enumerate() {
                    if q.score > p.score || (q.score == p.score && j < i) {
                        radius = radius.min(euclidean_distance(p, q));
                    }
                }
                radius
            })
            .collect()
    }

    #[test]
    fn test_distance_function_is_pluggable() {
        // B is diagonal from A: far in Euclidean terms, near in Chebyshev terms.
        let points = vec![
            Point::new(10, 10, 10.0),
            Point::new(15, 15, 5.0),
            Point::new(10, 4, 4.0),
        ];
        let euclid = adaptive_non_maximum_suppression(&points, 2, 100.0, euclidean_distance);
        assert_eq!((euclid[1].row, euclid[1].col), (15, 15));
        let chebyshev = adaptive_non_maximum_suppression(&points, 2, 100.0, chebyshev_distance);
        assert_eq!((chebyshev[0].row, chebyshev[0].col), (10, 10));
        assert_eq!((chebyshev[1].row, chebyshev[1].col), (10, 4));
    }

    proptest! {
        #[test]
        fn prop_kept_radii_dominate_dropped(
            cells in prop::collection::btree_set((0usize..48, 0usize..48), 1..40),
            scores in prop::collection::vec(0u8..4, 40),
            target in 1usize..20,
            cap in 1.0f32..60.0,
        ) {
            // distinct cells, few score levels so ties are common
            let points: Vec<Point> = cells
                .iter()
                .zip(&scores)
                .map(|(&(r, c), &s)| Point::new(r, c, s as f32))
                .collect();
            let radius = radii(&points, cap);
            let kept = adaptive_non_maximum_suppression(&points, target, cap, euclidean_distance);
            let kept_index: Vec<usize> = kept
                .iter()
                .map(|k| points.iter().position(|p| p.row == k.row && p.col == k.col).unwrap())
                .collect();
            let min_kept = kept_index.iter().map(|&i| radius[i]).fold(f32::INFINITY, f32::min);
            let max_dropped = (0..points.len())
                .filter(|i| !kept_index.contains(i))
                .map(|i| radius[i])
                .fold(f32::NEG_INFINITY, f32::max);
            prop_assert!(min_kept >= max_dropped, "kept {} < dropped {}", min_kept, max_dropped);
        }

        #[test]
        fn prop_anms_bounded_subset(
            raw in prop::collection::vec((0usize..64, 0usize..64, 0.0f32..10.0), 0..40),
            target in 1usize..20,
        ) {
            let points: Vec<Point> = raw.iter().map(|&(r, c, s)| Point::new(r, c, s)).collect();
            let kept = adaptive_non_maximum_suppression(&points, target, 32.0, euclidean_distance);
            prop_assert!(kept.len() <= target);
            prop_assert_eq!(kept.len(), target.min(points.len()));
            for p in &kept {
                prop_assert!(points.contains(p));
            }
        }

        #[test]
        fn prop_strongest_point_survives(
            raw in prop::collection::vec((0usize..64, 0usize..64, 0.0f32..10.0), 1..40),
        ) {
            let points: Vec<Point> = raw.iter().map(|&(r, c, s)| Point::new(r, c, s)).collect();
            let best = points
                .iter()
                .copied()
                .reduce(|a, b| if b.score > a.score { b } else { a })
                .unwrap();
            // with one slot per point the uncapped strongest point has the largest radius
            let kept = adaptive_non_maximum_suppression(&points, points.len(), f32::INFINITY, euclidean_distance);
            prop_assert_eq!(kept[0], best);
        }
    }
}
