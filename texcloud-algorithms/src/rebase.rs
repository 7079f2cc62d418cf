//! Global-to-local coordinate rebasing
//!
//! Georeferenced meshes carry coordinates in the millions. The planar axes
//! are shifted by the bounding box minimum rounded to the nearest thousand so
//! stored values stay small; Z is never shifted.

use texcloud_core::{Bounded, Bounds3d, CoordinateTransform, Error, Point3d, Result, TexturedMesh};
use tracing::{debug, info};

/// Offsets are multiples of this many units
pub const REBASE_STEP: f64 = 1000.0;

/// Value substituted for a negative coordinate before any positive one was seen
pub const NEGATIVE_FALLBACK: f64 = 0.0;

/// Compute the rebasing transform for a set of vertex positions
///
/// Fails on an empty vertex set or when the bounds are not finite.
pub fn compute_transform(positions: &[Point3d]) -> Result<CoordinateTransform> {
    if positions.is_empty() {
        return Err(Error::Transform("cannot compute bounds of an empty vertex set".to_string()));
    }
    ensure_finite(positions)?;
    transform_from_bounds(&Bounds3d::from_points(positions.iter()))
}

/// Compute the rebasing transform for a mesh
pub fn compute_mesh_transform(mesh: &TexturedMesh) -> Result<CoordinateTransform> {
    let bounds = mesh
        .bounds()
        .ok_or_else(|| Error::Transform("mesh has no vertices".to_string()))?;
    ensure_finite(&mesh.positions)?;
    transform_from_bounds(&bounds)
}

fn ensure_finite(positions: &[Point3d]) -> Result<()> {
    match positions.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
        Some(index) => Err(Error::Transform(format!(
            "vertex {} has a non-finite coordinate {:?}",
            index,
            positions[index].coords.as_slice()
        ))),
        None => Ok(()),
    }
}

fn transform_from_bounds(bounds: &Bounds3d) -> Result<CoordinateTransform> {
    if bounds.is_empty() || bounds.min.iter().chain(&bounds.max).any(|v| !v.is_finite()) {
        return Err(Error::Transform(format!(
            "vertex bounds are not finite: min {:?}, max {:?}",
            bounds.min, bounds.max
        )));
    }

    let offset = |min: f64| -(min / REBASE_STEP).round() * REBASE_STEP;
    let transform = CoordinateTransform::from_offsets(offset(bounds.min[0]), offset(bounds.min[1]));
    if !transform.needs_transform {
        info!("Coordinate transform not needed");
        return Ok(transform);
    }

    info!(
        x_offset = transform.x_offset,
        y_offset = transform.y_offset,
        z_offset = transform.z_offset,
        "Coordinate transform needed"
    );
    info!(
        "Input bounds: X {:.6} to {:.6}, Y {:.6} to {:.6}, Z {:.6} to {:.6}",
        bounds.min[0], bounds.max[0], bounds.min[1], bounds.max[1], bounds.min[2], bounds.max[2]
    );
    info!(
        "Expected bounds after transform: X {:.6} to {:.6}, Y {:.6} to {:.6}, Z unchanged",
        bounds.min[0] + transform.x_offset,
        bounds.max[0] + transform.x_offset,
        bounds.min[1] + transform.y_offset,
        bounds.max[1] + transform.y_offset
    );
    Ok(transform)
}

/// Applies a [`CoordinateTransform`] over one conversion run
///
/// Keeps the smallest positive shifted X and Y seen so far; a coordinate that
/// is still negative after shifting is replaced by that running minimum, or by
/// [`NEGATIVE_FALLBACK`] while no positive value has been seen. Build a new
/// `Rebaser` per run.
#[derive(Debug, Clone)]
pub struct Rebaser {
    transform: CoordinateTransform,
    min_positive: [Option<f64>; 2],
    substitutions: u64,
}

impl Rebaser {
    pub fn new(transform: CoordinateTransform) -> Self {
        Self {
            transform,
            min_positive: [None; 2],
            substitutions: 0,
        }
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    /// Number of negative coordinates replaced so far
    pub fn substitutions(&self) -> u64 {
        self.substitutions
    }

    /// Shift `x` and `y` in place
    pub fn apply(&mut self, x: &mut f64, y: &mut f64) {
        if !self.transform.needs_transform {
            return;
        }
        *x = self.shift_axis(0, *x + self.transform.x_offset);
        *y = self.shift_axis(1, *y + self.transform.y_offset);
    }

    /// Shift a point; Z is left untouched
    pub fn apply_point(&mut self, point: Point3d) -> Point3d {
        let (mut x, mut y) = (point.x, point.y);
        self.apply(&mut x, &mut y);
        Point3d::new(x, y, point.z)
    }

    fn shift_axis(&mut self, axis: usize, shifted: f64) -> f64 {
        let running = &mut self.min_positive[axis];
        if shifted > 0.0 {
            *running = Some(running.map_or(shifted, |m| m.min(shifted)));
        }
        if shifted < 0.0 {
            let replacement = running.unwrap_or(NEGATIVE_FALLBACK);
            debug!(axis, shifted, replacement, "Replacing negative rebased coordinate");
            self.substitutions += 1;
            return replacement;
        }
        shifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_offsets_round_to_thousands() {
        let positions = [
            Point3d::new(1_000_000.2, 2_000_000.7, 10.0),
            Point3d::new(1_000_000.4, 2_000_000.9, 12.0),
        ];
        let t = compute_transform(&positions).unwrap();
        assert!(t.needs_transform);
        assert_eq!(t.x_offset, -1_000_000.0);
        assert_eq!(t.y_offset, -2_000_000.0);
        assert_eq!(t.z_offset, 0.0);

        let t = compute_transform(&[Point3d::new(123_600.0, -4_400.0, 0.0)]).unwrap();
        assert_eq!(t.x_offset, -124_000.0);
        assert_eq!(t.y_offset, 4_000.0);
    }

    #[test]
    fn test_small_coordinates_need_no_transform() {
        let positions = [Point3d::new(12.5, 480.0, -3.0), Point3d::new(900.0, 1500.0, 7.0)];
        let t = compute_transform(&positions).unwrap();
        assert!(!t.needs_transform);

        let mut rebaser = Rebaser::new(t);
        for p in positions {
            assert_eq!(rebaser.apply_point(p), p);
        }
        assert_eq!(rebaser.substitutions(), 0);
    }

    #[test]
    fn test_slightly_negative_minimum_rounds_to_zero() {
        let t = compute_transform(&[Point3d::new(-400.0, -1.0, 0.0)]).unwrap();
        assert!(!t.needs_transform);
        assert!(t.x_offset.is_sign_positive());
    }

    #[test]
    fn test_empty_input_is_a_transform_error() {
        let err = compute_transform(&[]).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
        let err = compute_mesh_transform(&TexturedMesh::new()).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
    }

    #[test]
    fn test_non_finite_bounds_are_rejected() {
        let err = compute_transform(&[Point3d::new(f64::INFINITY, 0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));
    }

    #[test]
    fn test_nan_vertex_is_rejected() {
        let positions = [Point3d::new(f64::NAN, 5.0, 0.0), Point3d::new(2.0e6, 5.0, 0.0)];
        let err = compute_transform(&positions).unwrap_err();
        assert!(matches!(err, Error::Transform(_)));

        let mut mesh = TexturedMesh::new();
        mesh.add_vertex(Point3d::new(1.0e6, 2.0e6, 0.0));
        mesh.add_vertex(Point3d::new(1.0e6, f64::NAN, 0.0));
        assert!(compute_mesh_transform(&mesh).is_err());
    }

    #[test]
    fn test_apply_shifts_planar_axes_only() {
        let mut rebaser = Rebaser::new(CoordinateTransform::from_offsets(-1_000_000.0, -2_000_000.0));
        let p = rebaser.apply_point(Point3d::new(1_000_000.2, 2_000_000.7, 10.0));
        assert_abs_diff_eq!(p.x, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.7, epsilon = 1e-9);
        assert_eq!(p.z, 10.0);
    }

    #[test]
    fn test_negative_replaced_by_running_minimum() {
        let mut rebaser = Rebaser::new(CoordinateTransform::from_offsets(-1000.0, -1000.0));

        let (mut x, mut y) = (1005.0, 1003.0);
        rebaser.apply(&mut x, &mut y);
        assert_eq!((x, y), (5.0, 3.0));

        let (mut x, mut y) = (1002.0, 1009.0);
        rebaser.apply(&mut x, &mut y);
        assert_eq!((x, y), (2.0, 9.0));

        // x still negative after shifting: smallest positive x so far is 2
        let (mut x, mut y) = (990.0, 1004.0);
        rebaser.apply(&mut x, &mut y);
        assert_eq!((x, y), (2.0, 4.0));

        // y negative: smallest positive y is 3
        let (mut x, mut y) = (1001.0, 100.0);
        rebaser.apply(&mut x, &mut y);
        assert_eq!((x, y), (1.0, 3.0));
        assert_eq!(rebaser.substitutions(), 2);
    }

    #[test]
    fn test_negative_before_any_positive_uses_fallback() {
        let mut rebaser = Rebaser::new(CoordinateTransform::from_offsets(-1000.0, 0.0));
        let p = rebaser.apply_point(Point3d::new(500.0, 7.0, 1.0));
        assert_eq!(p, Point3d::new(NEGATIVE_FALLBACK, 7.0, 1.0));
    }

    #[test]
    fn test_fresh_rebaser_has_no_history() {
        let t = CoordinateTransform::from_offsets(-1000.0, -1000.0);
        let mut first = Rebaser::new(t);
        first.apply_point(Point3d::new(1001.0, 1001.0, 0.0));

        let mut second = Rebaser::new(t);
        let p = second.apply_point(Point3d::new(900.0, 900.0, 0.0));
        assert_eq!((p.x, p.y), (NEGATIVE_FALLBACK, NEGATIVE_FALLBACK));
    }
}
