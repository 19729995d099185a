//! Thresholds for the plausibility checks.

/// Thresholds used by [`crate::evaluate_with`].
///
/// # Example
///
/// ```
/// use sim_inertia::CheckParams;
///
/// let params = CheckParams::default();
/// assert!((params.max_eigenvalue_ratio - 1000.0).abs() < 1e-10);
///
/// // Accept a tighter band around the geometric estimate.
/// let strict = CheckParams::default().geometry_ratio_range(0.5, 2.0);
/// assert!((strict.geometry_ratio_min - 0.5).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckParams {
    /// Eigenvalues at or below this are treated as zero.
    pub eigen_tolerance: f64,

    /// Tensor entries above this in magnitude count as nonzero when the
    /// mass is zero.
    pub zero_mass_tolerance: f64,

    /// Largest accepted ratio of the largest to the smallest eigenvalue.
    pub max_eigenvalue_ratio: f64,

    /// Smallest accepted ratio of an actual to an estimated moment.
    pub geometry_ratio_min: f64,

    /// Largest accepted ratio of an actual to an estimated moment.
    pub geometry_ratio_max: f64,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            eigen_tolerance: 1e-9,
            zero_mass_tolerance: 1e-12,
            max_eigenvalue_ratio: 1000.0,
            geometry_ratio_min: 0.2,
            geometry_ratio_max: 5.0,
        }
    }
}

impl CheckParams {
    /// Set the eigenvalue tolerance.
    #[must_use]
    pub const fn eigen_tolerance(mut self, tolerance: f64) -> Self {
        self.eigen_tolerance = tolerance;
        self
    }

    /// Set the zero-mass tensor tolerance.
    #[must_use]
    pub const fn zero_mass_tolerance(mut self, tolerance: f64) -> Self {
        self.zero_mass_tolerance = tolerance;
        self
    }

    /// Set the maximum eigenvalue ratio.
    #[must_use]
    pub const fn max_eigenvalue_ratio(mut self, ratio: f64) -> Self {
        self.max_eigenvalue_ratio = ratio;
        self
    }

    /// Set the accepted band for actual / estimated moments.
    #[must_use]
    pub const fn geometry_ratio_range(mut self, min: f64, max: f64) -> Self {
        self.geometry_ratio_min = min;
        self.geometry_ratio_max = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = CheckParams::default();
        assert!((params.eigen_tolerance - 1e-9).abs() < f64::EPSILON);
        assert!((params.zero_mass_tolerance - 1e-12).abs() < f64::EPSILON);
        assert!((params.geometry_ratio_min - 0.2).abs() < f64::EPSILON);
        assert!((params.geometry_ratio_max - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_pattern() {
        let params = CheckParams::default()
            .eigen_tolerance(1e-6)
            .zero_mass_tolerance(1e-9)
            .max_eigenvalue_ratio(100.0)
            .geometry_ratio_range(0.5, 2.0);

        assert!((params.eigen_tolerance - 1e-6).abs() < f64::EPSILON);
        assert!((params.zero_mass_tolerance - 1e-9).abs() < f64::EPSILON);
        assert!((params.max_eigenvalue_ratio - 100.0).abs() < f64::EPSILON);
        assert!((params.geometry_ratio_max - 2.0).abs() < f64::EPSILON);
    }
}
