//! Axis aligned bounds tracking

use crate::point::Point3d;
use serde::{Deserialize, Serialize};

/// Running axis aligned bounding box
///
/// Starts out inverted (`+inf`/`-inf`) so the first update always takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3d {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Bounds3d {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    /// Bounds of all points yielded by `points`
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3d>,
    {
        let mut bounds = Self::new();
        for p in points {
            bounds.update(p.x, p.y, p.z);
        }
        bounds
    }

    /// Update bounds with a new point
    ///
    /// A NaN coordinate sticks in both bounds of its axis so that callers
    /// checking for finite bounds see it.
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        for (axis, value) in [x, y, z].into_iter().enumerate() {
            if value.is_nan() || value < self.min[axis] {
                self.min[axis] = value;
            }
            if value.is_nan() || value > self.max[axis] {
                self.max[axis] = value;
            }
        }
    }

    /// True until the first update
    pub fn is_empty(&self) -> bool {
        self.min.iter().zip(&self.max).any(|(lo, hi)| lo > hi)
    }

    pub fn dimensions(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

impl Default for Bounds3d {
    fn default() -> Self {
        Self::new()
    }
}
