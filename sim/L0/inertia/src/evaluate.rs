//! The plausibility check battery.

use sim_urdf::UrdfLink;
use tracing::debug;

use crate::check::{CheckDetails, CheckKind, InertiaCheck, Severity};
use crate::estimate::estimate_principal_inertia;
use crate::params::CheckParams;
use crate::tensor::{inertia_matrix, sorted_eigenvalues};

/// Run every check on `link` with default thresholds.
///
/// See [`evaluate_with`].
#[must_use]
pub fn evaluate(link: &UrdfLink) -> Vec<InertiaCheck> {
    evaluate_with(link, &CheckParams::default())
}

/// Run every check on `link`.
///
/// Order: `inertial_present` (and nothing else when it fails),
/// `mass_finite` (only on failure), `mass_positive`, `zero_mass_inertia`
/// (only on failure), `positive_definite`, `triangle_inequality`,
/// `eigenvalue_ratio`, and `geometry_consistency` when a primitive
/// collision shape allows an estimate.
///
/// The eigen-based checks run whatever the mass is. Nothing here returns an
/// error; bad values show up as failed checks.
#[must_use]
pub fn evaluate_with(link: &UrdfLink, params: &CheckParams) -> Vec<InertiaCheck> {
    let Some(inertial) = link.inertial.as_ref() else {
        debug!(link = %link.name, "no inertial block");
        return vec![InertiaCheck::fail(
            CheckKind::InertialPresent,
            Severity::Warning,
            "Link has no <inertial> definition.",
            CheckDetails::Empty,
        )];
    };

    let mass = inertial.mass;
    let matrix = inertia_matrix(&inertial.inertia);
    let mut checks = Vec::with_capacity(7);

    if !mass.is_finite() {
        checks.push(InertiaCheck::fail(
            CheckKind::MassFinite,
            Severity::Error,
            "Link mass is missing or non-finite.",
            CheckDetails::Mass { mass },
        ));
    }

    checks.push(InertiaCheck::outcome(
        CheckKind::MassPositive,
        mass.is_finite() && mass > 0.0,
        Severity::Error,
        ("Mass is positive.", "Link mass must be positive."),
        CheckDetails::Mass { mass },
    ));

    if mass == 0.0 && matrix.iter().any(|v| v.abs() > params.zero_mass_tolerance) {
        checks.push(InertiaCheck::fail(
            CheckKind::ZeroMassInertia,
            Severity::Error,
            "Zero-mass link has non-zero inertia tensor.",
            CheckDetails::Empty,
        ));
    }

    let eigenvalues = sorted_eigenvalues(&matrix);
    let tol = params.eigen_tolerance;

    checks.push(InertiaCheck::outcome(
        CheckKind::PositiveDefinite,
        eigenvalues.iter().all(|&v| v > tol),
        Severity::Error,
        (
            "Inertia tensor is positive definite.",
            "Inertia tensor is not positive definite.",
        ),
        CheckDetails::Eigenvalues { eigenvalues },
    ));

    checks.push(InertiaCheck::outcome(
        CheckKind::TriangleInequality,
        satisfies_triangle_inequality(eigenvalues, tol),
        Severity::Error,
        (
            "Triangle inequalities satisfied.",
            "Triangle inequality violated for principal moments.",
        ),
        CheckDetails::Eigenvalues { eigenvalues },
    ));

    let max = eigenvalues[2];
    let min = eigenvalues[0].max(tol);
    let ratio = max / min;
    checks.push(InertiaCheck::outcome(
        CheckKind::EigenvalueRatio,
        ratio <= params.max_eigenvalue_ratio,
        Severity::Warning,
        (
            "Eigenvalue ratio within bounds.",
            "Eigenvalue ratio exceeds recommended threshold.",
        ),
        CheckDetails::Ratio { max, min, ratio },
    ));

    if let Some(check) = geometry_consistency(link, mass, eigenvalues, params) {
        checks.push(check);
    }

    debug!(
        link = %link.name,
        checks = checks.len(),
        failed = checks.iter().filter(|c| !c.passed).count(),
        "evaluated inertia"
    );
    checks
}

/// `eigenvalues` must be sorted ascending. Any value below `tol` (or NaN)
/// fails outright.
fn satisfies_triangle_inequality(eigenvalues: [f64; 3], tol: f64) -> bool {
    if !eigenvalues.iter().all(|&v| v >= tol) {
        return false;
    }
    let [a, b, c] = eigenvalues;
    a <= b + c + tol && b <= a + c + tol && c <= a + b + tol
}

/// Compare the declared moments with the first collision shape that allows
/// an estimate. `None` when the mass is not positive, no collision is
/// estimable, or no moment pair is large enough to compare.
fn geometry_consistency(
    link: &UrdfLink,
    mass: f64,
    actual: [f64; 3],
    params: &CheckParams,
) -> Option<InertiaCheck> {
    if mass.is_nan() || mass <= 0.0 {
        return None;
    }

    let estimate = link
        .collisions
        .iter()
        .find_map(|c| estimate_principal_inertia(&c.geometry, mass))?;

    let mut expected = [estimate.moments.x, estimate.moments.y, estimate.moments.z];
    expected.sort_by(f64::total_cmp);

    let tol = params.eigen_tolerance;
    let ratios: Vec<f64> = actual
        .iter()
        .zip(&expected)
        .filter(|(a, e)| **a >= tol && **e >= tol)
        .map(|(a, e)| a / e)
        .collect();

    if ratios.is_empty() {
        return None;
    }

    let min_ratio = ratios.iter().copied().fold(f64::INFINITY, f64::min);
    let max_ratio = ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let passed = params.geometry_ratio_min <= min_ratio && max_ratio <= params.geometry_ratio_max;

    Some(InertiaCheck::outcome(
        CheckKind::GeometryConsistency,
        passed,
        Severity::Warning,
        (
            "Inertia aligns with collision geometry estimate.",
            "Inertia deviates from collision geometry estimate.",
        ),
        CheckDetails::Geometry {
            expected_eigenvalues: expected,
            actual_eigenvalues: actual,
            ratio_range: [min_ratio, max_ratio],
            density_estimate: estimate.density,
        },
    ))
}
