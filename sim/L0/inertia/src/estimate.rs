//! Closed-form inertia of primitive shapes.
//!
//! Moments are about the shape's centroid, in the shape's own frame:
//! - Box: I_x = (1/12) m (y² + z²), etc.
//! - Cylinder (axis along local Z): I_x = I_y = (1/12) m (3r² + L²), I_z = (1/2) m r²
//! - Sphere: I = (2/5) m r²

use std::f64::consts::PI;

use nalgebra::Vector3;
use sim_urdf::UrdfGeometry;

/// Principal moments of a uniform-density primitive and its implied density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaEstimate {
    /// Principal moments about the shape's x, y and z axes.
    pub moments: Vector3<f64>,
    /// `mass / volume`, or `NaN` when the volume is not positive.
    pub density: f64,
}

/// Estimate principal inertia for a primitive geometry of the given mass.
///
/// Returns `None` for meshes and unknown shapes, for a mass that is not
/// strictly positive and finite, and for a cylinder or sphere with a zero
/// radius or length.
#[must_use]
pub fn estimate_principal_inertia(geometry: &UrdfGeometry, mass: f64) -> Option<InertiaEstimate> {
    if !mass.is_finite() || mass <= 0.0 {
        return None;
    }

    let (moments, volume) = match *geometry {
        UrdfGeometry::Box { size } => {
            let (x, y, z) = (size.x, size.y, size.z);
            let c = mass / 12.0;
            (
                Vector3::new(c * (y * y + z * z), c * (x * x + z * z), c * (x * x + y * y)),
                x * y * z,
            )
        }
        UrdfGeometry::Cylinder { radius, length } => {
            if radius == 0.0 || length == 0.0 {
                return None;
            }
            let r2 = radius.powi(2);
            let ix = mass * (3.0 * r2 + length.powi(2)) / 12.0;
            let iz = 0.5 * mass * r2;
            (Vector3::new(ix, ix, iz), PI * r2 * length)
        }
        UrdfGeometry::Sphere { radius } => {
            if radius == 0.0 {
                return None;
            }
            let i = 0.4 * mass * radius.powi(2);
            (Vector3::new(i, i, i), (4.0 / 3.0) * PI * radius.powi(3))
        }
        UrdfGeometry::Mesh { .. } | UrdfGeometry::Unknown => return None,
    };

    let density = if volume > 0.0 { mass / volume } else { f64::NAN };
    Some(InertiaEstimate { moments, density })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_cube() {
        let est = estimate_principal_inertia(&UrdfGeometry::box_shape(1.0, 1.0, 1.0), 10.0)
            .expect("box is estimable");
        for i in 0..3 {
            assert_relative_eq!(est.moments[i], 10.0 / 6.0, epsilon = 1e-12);
        }
        assert_relative_eq!(est.density, 10.0);
    }

    #[test]
    fn test_box_moments_per_axis() {
        let est = estimate_principal_inertia(&UrdfGeometry::box_shape(2.0, 1.0, 1.0), 5.0).unwrap();
        assert_relative_eq!(est.moments.x, 5.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(est.moments.y, 25.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(est.moments.z, 25.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(est.density, 2.5);
    }

    #[test]
    fn test_cylinder() {
        let est = estimate_principal_inertia(&UrdfGeometry::cylinder(0.1, 1.0), 2.0).unwrap();
        let ix = 2.0 * (3.0 * 0.01 + 1.0) / 12.0;
        assert_relative_eq!(est.moments.x, ix, epsilon = 1e-12);
        assert_relative_eq!(est.moments.y, ix, epsilon = 1e-12);
        assert_relative_eq!(est.moments.z, 0.01, epsilon = 1e-12);
        assert_relative_eq!(est.density, 2.0 / (PI * 0.01), epsilon = 1e-9);
    }

    #[test]
    fn test_sphere() {
        let est = estimate_principal_inertia(&UrdfGeometry::sphere(0.5), 4.0).unwrap();
        assert_relative_eq!(est.moments.x, 0.4, epsilon = 1e-12);
        assert_relative_eq!(est.moments.z, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_box_has_nan_density() {
        let est = estimate_principal_inertia(&UrdfGeometry::box_shape(1.0, 1.0, 0.0), 1.0).unwrap();
        assert_relative_eq!(est.moments.z, 2.0 / 12.0, epsilon = 1e-12);
        assert!(est.density.is_nan());
    }

    #[test]
    fn test_zero_dimensions_are_not_estimable() {
        assert!(estimate_principal_inertia(&UrdfGeometry::cylinder(0.0, 1.0), 1.0).is_none());
        assert!(estimate_principal_inertia(&UrdfGeometry::cylinder(0.1, 0.0), 1.0).is_none());
        assert!(estimate_principal_inertia(&UrdfGeometry::sphere(0.0), 1.0).is_none());
    }

    #[test]
    fn test_unsupported_inputs() {
        assert!(estimate_principal_inertia(&UrdfGeometry::mesh("part.stl"), 1.0).is_none());
        assert!(estimate_principal_inertia(&UrdfGeometry::Unknown, 1.0).is_none());
        let cube = UrdfGeometry::box_shape(1.0, 1.0, 1.0);
        assert!(estimate_principal_inertia(&cube, 0.0).is_none());
        assert!(estimate_principal_inertia(&cube, -1.0).is_none());
        assert!(estimate_principal_inertia(&cube, f64::NAN).is_none());
        assert!(estimate_principal_inertia(&cube, f64::INFINITY).is_none());
    }
}
