//! Global-to-local coordinate rebasing record

use serde::{Deserialize, Serialize};

/// Offsets that move large (projected, georeferenced) coordinates close to
/// the origin
///
/// The record is immutable once computed. `z_offset` is always zero and
/// `scale` always one; both are kept so the sidecar file is self describing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransform {
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
    pub scale: f64,
    pub needs_transform: bool,
}

impl CoordinateTransform {
    /// A transform that leaves coordinates untouched
    pub fn identity() -> Self {
        Self {
            x_offset: 0.0,
            y_offset: 0.0,
            z_offset: 0.0,
            scale: 1.0,
            needs_transform: false,
        }
    }

    /// Build a transform from planar offsets
    ///
    /// `-0.0` is normalised to `0.0` so the record never prints as `-0`.
    pub fn from_offsets(x_offset: f64, y_offset: f64) -> Self {
        let x_offset = x_offset + 0.0;
        let y_offset = y_offset + 0.0;
        Self {
            x_offset,
            y_offset,
            z_offset: 0.0,
            scale: 1.0,
            needs_transform: x_offset != 0.0 || y_offset != 0.0,
        }
    }

    pub fn offsets(&self) -> [f64; 3] {
        [self.x_offset, self.y_offset, self.z_offset]
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_offsets_need_no_transform() {
        let t = CoordinateTransform::from_offsets(-0.0, 0.0);
        assert!(!t.needs_transform);
        assert!(t.x_offset.is_sign_positive());
        assert_eq!(t, CoordinateTransform::identity());
    }

    #[test]
    fn test_any_planar_offset_needs_transform() {
        let t = CoordinateTransform::from_offsets(0.0, -2000.0);
        assert!(t.needs_transform);
        assert_eq!(t.offsets(), [0.0, -2000.0, 0.0]);
        assert_eq!(t.scale, 1.0);
    }
}
