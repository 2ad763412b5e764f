//! Brute-force nearest-neighbour matching with the distance-ratio test.

use log::debug;
use recog_core::Point;

use crate::descriptor::Descriptor;
use crate::error::{DescribeError, DescribeResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accepted correspondence between `set1[query]` and `set2[train]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: f32,
    pub query_point: Point,
    pub train_point: Point,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatcherConfig {
    /// Accept when `nearest / second_nearest` is below this value.
    pub ratio_threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.7,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> DescribeResult<()> {
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return Err(DescribeError::InvalidParameter {
                name: "ratio_threshold",
                value: self.ratio_threshold,
            });
        }
        Ok(())
    }

    pub fn match_descriptors(&self, set1: &[Descriptor], set2: &[Descriptor]) -> DescribeResult<Vec<Match>> {
        self.validate()?;
        match_descriptors(set1, set2, self.ratio_threshold)
    }
}

/// For each descriptor of `set1`, its nearest neighbour in `set2` when that
/// neighbour is clearly closer than the second nearest.
///
/// Ties on the nearest distance keep the first candidate, which then fails
/// the ratio test. A query needs at least two candidates to be matched.
pub fn match_descriptors(
    set1: &[Descriptor],
    set2: &[Descriptor],
    ratio_threshold: f32,
) -> DescribeResult<Vec<Match>> {
    let mut matches = Vec::new();
    if set2.len() < 2 {
        debug!("matching: fewer than two candidates, nothing accepted");
        return Ok(matches);
    }
    for (query, d1) in set1.iter().enumerate() {
        let mut best = (usize::MAX, f32::INFINITY);
        let mut second = f32::INFINITY;
        for (train, d2) in set2.iter().enumerate() {
            let distance = d1.distance(d2)?;
            if distance < best.1 {
                second = best.1;
                best = (train, distance);
            } else if distance < second {
                second = distance;
            }
        }
        if second > 0.0 && best.1 / second < ratio_threshold {
            matches.push(Match {
                query,
                train: best.0,
                distance: best.1,
                query_point: d1.point,
                train_point: set2[best.0].point,
            });
        }
    }
    debug!(
        "matching: {} of {} descriptors accepted (ratio {})",
        matches.len(),
        set1.len(),
        ratio_threshold
    );
    Ok(matches)
}
