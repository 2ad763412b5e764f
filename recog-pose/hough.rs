//! Generalized Hough voting over similarity transforms.
//!
//! Each match implies a transform from its anchor points, orientations and
//! scales. The transform is binned by where it sends the object centre
//! (x and y), its rotation and its log2 scale. A match votes once in its own
//! bin and once in the nearer neighbouring bin along each of the four axes,
//! so a transform near a bin edge still meets its peers. Rotation bins wrap
//! around the circle.

use std::collections::HashMap;
use std::f32::consts::TAU;

use log::{debug, trace};
use recog_describe::Match;

use crate::config::PoseConfig;
use crate::error::{PoseError, PoseResult};
use crate::transform::Transform2d;

type BinKey = [i64; 4];

#[derive(Debug)]
struct Bin {
    votes: usize,
    contributors: Vec<usize>,
}

/// Accumulator bins in registration order.
#[derive(Debug, Default)]
struct Accumulator {
    index: HashMap<BinKey, usize>,
    bins: Vec<Bin>,
}

impl Accumulator {
    fn vote(&mut self, key: BinKey, contributor: usize) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.bins.push(Bin {
                    votes: 0,
                    contributors: Vec::new(),
                });
                self.index.insert(key, self.bins.len() - 1);
                self.bins.len() - 1
            }
        };
        let bin = &mut self.bins[slot];
        bin.votes += 1;
        bin.contributors.push(contributor);
    }

    /// Most voted bin, earliest registered on ties.
    fn winner(&self) -> Option<&Bin> {
        self.bins
            .iter()
            .fold(None, |best: Option<&Bin>, bin| match best {
                Some(b) if b.votes >= bin.votes => Some(b),
                _ => Some(bin),
            })
    }
}

pub(crate) fn check_dims(what: &'static str, (height, width): (usize, usize)) -> PoseResult<()> {
    if height == 0 || width == 0 {
        return Err(PoseError::InvalidDimensions { what, width, height });
    }
    Ok(())
}

/// Primary bin and the nearer neighbour of a continuous coordinate.
fn quantize(value: f32) -> (i64, i64) {
    let cell = value.floor();
    let neighbour = if value - cell < 0.5 { cell - 1.0 } else { cell + 1.0 };
    (cell as i64, neighbour as i64)
}

/// Best-supported similarity transform for `matches`, refined over the
/// matches that voted for it.
///
/// Dimensions are `(height, width)`. Returns `None` when no bin reaches
/// `config.min_votes`, which includes an empty match list.
pub fn hough(
    scene_dims: (usize, usize),
    object_dims: (usize, usize),
    matches: &[Match],
    config: &PoseConfig,
) -> PoseResult<Option<Transform2d>> {
    config.validate()?;
    check_dims("scene", scene_dims)?;
    check_dims("object", object_dims)?;

    let (object_h, object_w) = (object_dims.0 as f32, object_dims.1 as f32);
    let (scene_h, scene_w) = (scene_dims.0 as f32, scene_dims.1 as f32);
    let centre = (object_w / 2.0, object_h / 2.0);
    let translation_bin = config.translation_bin_fraction * object_w.max(object_h);
    let rotation_bin = config.rotation_bin_degrees.to_radians();
    let rotation_bins = config.rotation_bins();

    let mut accumulator = Accumulator::default();
    let mut discarded = 0usize;
    for (i, m) in matches.iter().enumerate() {
        let transform = Transform2d::from_match(m);
        let (cx, cy) = transform.apply(centre);
        if cx < -object_w || cx > scene_w + object_w || cy < -object_h || cy > scene_h + object_h {
            discarded += 1;
            continue;
        }
        let coords = [
            cx / translation_bin,
            cy / translation_bin,
            transform.rotation / rotation_bin,
            transform.scale.log2() / config.scale_bin_octaves,
        ];
        let mut primary = [0i64; 4];
        let mut neighbours = [0i64; 4];
        for axis in 0..4 {
            let (cell, neighbour) = quantize(coords[axis]);
            primary[axis] = cell;
            neighbours[axis] = neighbour;
        }
        primary[2] = primary[2].rem_euclid(rotation_bins);
        neighbours[2] = neighbours[2].rem_euclid(rotation_bins);

        accumulator.vote(primary, i);
        for axis in 0..4 {
            let mut key = primary;
            key[axis] = neighbours[axis];
            accumulator.vote(key, i);
        }
    }
    debug!(
        "hough: {} matches, {} discarded, {} bins",
        matches.len(),
        discarded,
        accumulator.bins.len()
    );

    let Some(bin) = accumulator.winner() else {
        return Ok(None);
    };
    if bin.votes < config.min_votes {
        debug!("hough: best bin has {} votes, need {}", bin.votes, config.min_votes);
        return Ok(None);
    }

    let contributors: Vec<&Match> = bin.contributors.iter().map(|&i| &matches[i]).collect();
    let transform = refine(&contributors, config).with_votes(bin.votes);
    trace!("hough: winner {:?}", transform);
    Ok(Some(transform))
}

/// Least-squares fit over the contributors, refitted once without the
/// matches it leaves further than the inlier tolerance.
fn refine(contributors: &[&Match], config: &PoseConfig) -> Transform2d {
    let pairs: Vec<_> = contributors
        .iter()
        .map(|m| (m.query_point.position(), m.train_point.position()))
        .collect();
    // a winning bin always has at least one contributor
    let fallback = contributors
        .first()
        .map(|m| Transform2d::from_match(m))
        .unwrap_or_default();
    let Some(first) = Transform2d::fit(&pairs) else {
        return fallback;
    };
    let kept: Vec<_> = pairs
        .iter()
        .copied()
        .filter(|&(o, s)| {
            let (x, y) = first.apply(o);
            (x - s.0).hypot(y - s.1) <= config.inlier_tolerance
        })
        .collect();
    if kept.len() == pairs.len() {
        return first;
    }
    Transform2d::fit(&kept).unwrap_or(first)
}

/// Angular distance between two rotations in radians.
pub fn rotation_difference(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use recog_core::Point;

    fn translated(points: &[(usize, usize)], dr: usize, dc: usize) -> Vec<Match> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(r, c))| Match {
                query: i,
                train: i,
                distance: 0.0,
                query_point: Point::new(r, c, 1.0),
                train_point: Point::new(r + dr, c + dc, 1.0),
            })
            .collect()
    }

    const OBJECT_POINTS: [(usize, usize); 6] = [(5, 5), (20, 8), (12, 30), (40, 41), (33, 17), (50, 52)];

    #[test]
    fn test_empty_matches_give_no_candidate() {
        let result = hough((100, 100), (64, 64), &[], &PoseConfig::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_pure_translation() {
        let matches = translated(&OBJECT_POINTS, 30, 20);
        let t = hough((128, 128), (64, 64), &matches, &PoseConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(t.votes, OBJECT_POINTS.len());
        assert_abs_diff_eq!(t.tx, 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(t.ty, 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(t.scale, 1.0, epsilon = 1e-4);
        assert!(rotation_difference(t.rotation, 0.0) < 1e-4);
    }

    #[test]
    fn test_outliers_do_not_win() {
        let mut matches = translated(&OBJECT_POINTS, 30, 20);
        // two stray correspondences pointing elsewhere
        matches.push(Match {
            query: 6,
            train: 6,
            distance: 0.1,
            query_point: Point::new(10, 10, 1.0),
            train_point: Point::new(100, 5, 1.0),
        });
        matches.push(Match {
            query: 7,
            train: 7,
            distance: 0.1,
            query_point: Point::new(3, 60, 1.0),
            train_point: Point::new(90, 90, 1.0),
        });
        let t = hough((128, 128), (64, 64), &matches, &PoseConfig::default())
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(t.tx, 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(t.ty, 30.0, epsilon = 1e-3);
    }

    #[test]
    fn test_too_few_votes() {
        let matches = translated(&OBJECT_POINTS[..2], 30, 20);
        assert!(hough((128, 128), (64, 64), &matches, &PoseConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_far_away_centre_discarded() {
        let matches = translated(&OBJECT_POINTS, 400, 400);
        assert!(hough((128, 128), (64, 64), &matches, &PoseConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_tie_goes_to_first_registered_bin() {
        // two groups of three, each consistent with its own translation
        let mut matches = translated(&OBJECT_POINTS[..3], 0, 0);
        matches.extend(translated(&OBJECT_POINTS[3..], 60, 60));
        let t = hough((128, 128), (64, 64), &matches, &PoseConfig::default())
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(t.tx, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(t.ty, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_quantize_neighbour() {
        assert_eq!(quantize(2.2), (2, 1));
        assert_eq!(quantize(2.7), (2, 3));
        assert_eq!(quantize(-0.2), (-1, 0));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            hough((0, 10), (64, 64), &[], &PoseConfig::default()),
            Err(PoseError::InvalidDimensions { what: "scene", .. })
        ));
    }
}
