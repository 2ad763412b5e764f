use std::f32::consts::TAU;

use recog_describe::Match;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 2D similarity `p' = scale * R(rotation) * p + (tx, ty)` in input-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform2d {
    pub scale: f32,
    /// Radians in `[0, 2π)`.
    pub rotation: f32,
    pub tx: f32,
    pub ty: f32,
    /// Support of the Hough bin this transform came from.
    pub votes: usize,
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2d {
    pub fn new(scale: f32, rotation: f32, tx: f32, ty: f32) -> Self {
        Self {
            scale,
            rotation: wrap_angle(rotation),
            tx,
            ty,
            votes: 0,
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    pub fn with_votes(mut self, votes: usize) -> Self {
        self.votes = votes;
        self
    }

    /// Map an `(x, y)` position.
    pub fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let (a, b) = self.linear();
        (a * x - b * y + self.tx, b * x + a * y + self.ty)
    }

    /// `(scale * cos, scale * sin)`
    fn linear(&self) -> (f32, f32) {
        let (sin, cos) = self.rotation.sin_cos();
        (self.scale * cos, self.scale * sin)
    }

    /// Transform taking the query (object) anchor of `m` onto its train
    /// (scene) anchor, from the point orientations and detection scales.
    pub fn from_match(m: &Match) -> Self {
        let scale = m.train_point.sigma() / m.query_point.sigma();
        let rotation = m.train_point.angle - m.query_point.angle;
        let partial = Self::new(scale, rotation, 0.0, 0.0);
        let (ox, oy) = partial.apply(m.query_point.position());
        let (sx, sy) = m.train_point.position();
        Self::new(scale, rotation, sx - ox, sy - oy)
    }

    /// Least-squares similarity mapping `pairs[i].0` onto `pairs[i].1`.
    ///
    /// `None` when the source points do not span any distance.
    pub fn fit(pairs: &[((f32, f32), (f32, f32))]) -> Option<Self> {
        if pairs.len() < 2 {
            return None;
        }
        let n = pairs.len() as f32;
        let (mut mox, mut moy, mut msx, mut msy) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        for &((ox, oy), (sx, sy)) in pairs {
            mox += ox;
            moy += oy;
            msx += sx;
            msy += sy;
        }
        let (mox, moy, msx, msy) = (mox / n, moy / n, msx / n, msy / n);

        let (mut dot, mut cross, mut norm) = (0.0f32, 0.0f32, 0.0f32);
        for &((ox, oy), (sx, sy)) in pairs {
            let (x, y) = (ox - mox, oy - moy);
            let (u, v) = (sx - msx, sy - msy);
            dot += x * u + y * v;
            cross += x * v - y * u;
            norm += x * x + y * y;
        }
        if norm <= f32::EPSILON {
            return None;
        }
        let (a, b) = (dot / norm, cross / norm);
        let scale = a.hypot(b);
        if !(scale > 0.0) {
            return None;
        }
        let tx = msx - (a * mox - b * moy);
        let ty = msy - (b * mox + a * moy);
        Some(Self::new(scale, b.atan2(a), tx, ty))
    }
}

/// Map an angle to `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let a = angle.rem_euclid(TAU);
    if a >= TAU {
        0.0
    } else {
        a
    }
}
