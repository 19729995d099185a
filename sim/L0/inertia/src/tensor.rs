//! Inertia tensor assembly, rotation and eigenvalues.

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use sim_urdf::{UrdfInertia, UrdfOrigin};

/// Iteration cap for the symmetric eigen solver.
const EIGEN_MAX_ITERATIONS: usize = 1000;

/// Assemble the symmetric 3x3 tensor from its six URDF entries.
///
/// No validation: non-finite entries are carried through.
#[must_use]
pub fn inertia_matrix(inertia: &UrdfInertia) -> Matrix3<f64> {
    let UrdfInertia {
        ixx,
        ixy,
        ixz,
        iyy,
        iyz,
        izz,
    } = *inertia;
    Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz)
}

/// Rotation matrix `Rz(yaw) * Ry(pitch) * Rx(roll)` for URDF angles.
#[must_use]
pub fn rpy_rotation(rpy: &Vector3<f64>) -> Matrix3<f64> {
    UrdfOrigin::new(Vector3::zeros(), *rpy).rotation_matrix()
}

/// Express principal moments given in a rotated frame in the parent frame:
/// `R * diag(moments) * R^T`.
#[must_use]
pub fn rotate_principal(moments: &Vector3<f64>, rotation: &Matrix3<f64>) -> Matrix3<f64> {
    rotation * Matrix3::from_diagonal(moments) * rotation.transpose()
}

/// Symmetrize and flush entries smaller than `tolerance` in magnitude to 0.
#[must_use]
pub fn sanitize(matrix: &Matrix3<f64>, tolerance: f64) -> Matrix3<f64> {
    let sym = (matrix + matrix.transpose()) * 0.5;
    sym.map(|v| if v.abs() < tolerance { 0.0 } else { v })
}

/// Eigenvalues of a symmetric tensor, ascending.
///
/// A tensor with a non-finite entry, or one the solver cannot converge on,
/// yields `[NaN; 3]` so that every check built on the eigenvalues fails.
#[must_use]
pub fn sorted_eigenvalues(matrix: &Matrix3<f64>) -> [f64; 3] {
    if !matrix.iter().all(|v| v.is_finite()) {
        return [f64::NAN; 3];
    }

    match SymmetricEigen::try_new(*matrix, f64::EPSILON, EIGEN_MAX_ITERATIONS) {
        Some(eigen) => {
            let mut values = [
                eigen.eigenvalues[0],
                eigen.eigenvalues[1],
                eigen.eigenvalues[2],
            ];
            values.sort_by(f64::total_cmp);
            values
        }
        None => [f64::NAN; 3],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_matrix_is_symmetric() {
        let m = inertia_matrix(&UrdfInertia::new(1.0, 0.1, 0.2, 2.0, 0.3, 3.0));
        assert_eq!(m, m.transpose());
        assert_relative_eq!(m[(2, 1)], 0.3);
        assert_relative_eq!(m[(0, 2)], 0.2);
    }

    #[test]
    fn test_eigenvalues_sorted() {
        let m = inertia_matrix(&UrdfInertia::diagonal(3.0, 1.0, 2.0));
        assert_eq!(sorted_eigenvalues(&m), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_eigenvalues_of_coupled_tensor() {
        // [[2, 1], [1, 2]] block has eigenvalues 1 and 3
        let m = inertia_matrix(&UrdfInertia::new(2.0, 1.0, 0.0, 2.0, 0.0, 5.0));
        let ev = sorted_eigenvalues(&m);
        assert_relative_eq!(ev[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(ev[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(ev[2], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_tensor_gives_nan() {
        let m = inertia_matrix(&UrdfInertia::new(1.0, f64::NAN, 0.0, 1.0, 0.0, 1.0));
        assert!(sorted_eigenvalues(&m).iter().all(|v| v.is_nan()));

        let m = inertia_matrix(&UrdfInertia::diagonal(f64::INFINITY, 1.0, 1.0));
        assert!(sorted_eigenvalues(&m).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_roll_moves_z_moment_to_y() {
        let r = rpy_rotation(&Vector3::new(FRAC_PI_2, 0.0, 0.0));
        let i = sanitize(&rotate_principal(&Vector3::new(1.0, 1.0, 0.25), &r), 1e-12);
        assert_relative_eq!(i[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(i[(1, 1)], 0.25, epsilon = 1e-12);
        assert_relative_eq!(i[(2, 2)], 1.0, epsilon = 1e-12);
        assert_eq!(i[(1, 2)], 0.0);
    }

    #[test]
    fn test_rotation_preserves_eigenvalues() {
        let r = rpy_rotation(&Vector3::new(0.3, -0.4, 1.2));
        let i = rotate_principal(&Vector3::new(0.5, 2.0, 1.0), &r);
        let ev = sorted_eigenvalues(&i);
        assert_relative_eq!(ev[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(ev[1], 1.0, epsilon = 1e-9);
        assert_relative_eq!(ev[2], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sanitize() {
        let m = Matrix3::new(1.0, 2.0, 1e-13, 0.0, 1.0, 0.0, -1e-14, 0.0, 1.0);
        let s = sanitize(&m, 1e-12);
        assert_eq!(s, s.transpose());
        assert_relative_eq!(s[(0, 1)], 1.0);
        assert_eq!(s[(0, 2)], 0.0);
    }
}
