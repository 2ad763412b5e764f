#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strategy for sampling outside `[0, len)`.
///
/// Each policy maps an out-of-range coordinate back into the image, except
/// [`BorderPolicy::Constant`] which substitutes a fixed value instead.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BorderPolicy {
    /// `aaaaaa|abcdefgh|hhhhhhh`
    #[default]
    Replicate,
    /// `fedcba|abcdefgh|hgfedcb`
    Reflect,
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    /// `cdefgh|abcdefgh|abcdefg`
    Wrap,
    /// `iiiiii|abcdefgh|iiiiiii`
    Constant(f32),
}

impl BorderPolicy {
    /// Resolve `coord` against an axis of length `len`.
    ///
    /// Returns `None` only for [`BorderPolicy::Constant`] when `coord` is out
    /// of range; callers then use [`BorderPolicy::fill_value`].
    #[inline]
    pub fn resolve(&self, coord: isize, len: usize) -> Option<usize> {
        debug_assert!(len > 0);
        let n = len as isize;
        if (0..n).contains(&coord) {
            return Some(coord as usize);
        }
        let resolved = match self {
            BorderPolicy::Replicate => coord.clamp(0, n - 1),
            BorderPolicy::Reflect => {
                let m = coord.rem_euclid(2 * n);
                if m < n {
                    m
                } else {
                    2 * n - 1 - m
                }
            }
            BorderPolicy::Reflect101 => {
                if n == 1 {
                    0
                } else {
                    let period = 2 * n - 2;
                    let m = coord.rem_euclid(period);
                    if m < n {
                        m
                    } else {
                        period - m
                    }
                }
            }
            BorderPolicy::Wrap => coord.rem_euclid(n),
            BorderPolicy::Constant(_) => return None,
        };
        Some(resolved as usize)
    }

    /// Value used for unresolved samples.
    #[inline]
    pub fn fill_value(&self) -> f32 {
        match self {
            BorderPolicy::Constant(v) => *v,
            _ => 0.0,
        }
    }
}
