//! Check result types.
//!
//! An [`InertiaCheck`] is built once by the engine and never mutated
//! afterwards; consumers that need extra data derive it into their own
//! types instead of writing into the check.

use std::fmt;

use sim_urdf::format_significant;

#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, Serializer};

/// The fixed set of plausibility checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CheckKind {
    /// The link declares an `<inertial>` block.
    InertialPresent,
    /// The mass is a finite number.
    MassFinite,
    /// The mass is strictly positive.
    MassPositive,
    /// A massless link carries no inertia.
    ZeroMassInertia,
    /// Every principal moment is positive.
    PositiveDefinite,
    /// Each principal moment is at most the sum of the other two.
    TriangleInequality,
    /// Largest over smallest principal moment is bounded.
    EigenvalueRatio,
    /// Principal moments agree with a primitive collision shape.
    GeometryConsistency,
}

impl CheckKind {
    /// Identifier used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InertialPresent => "inertial_present",
            Self::MassFinite => "mass_finite",
            Self::MassPositive => "mass_positive",
            Self::ZeroMassInertia => "zero_mass_inertia",
            Self::PositiveDefinite => "positive_definite",
            Self::TriangleInequality => "triangle_inequality",
            Self::EigenvalueRatio => "eigenvalue_ratio",
            Self::GeometryConsistency => "geometry_consistency",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious a check outcome is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Informational; used for passing checks.
    Info,
    /// Suspicious but usable.
    Warning,
    /// Physically invalid.
    Error,
}

impl Severity {
    /// Lowercase name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric evidence behind a check decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckDetails {
    /// No details.
    Empty,
    /// The link mass.
    Mass {
        /// Mass in kg, possibly non-finite.
        mass: f64,
    },
    /// Principal moments, ascending.
    Eigenvalues {
        /// Sorted eigenvalues of the tensor.
        eigenvalues: [f64; 3],
    },
    /// Spread of the principal moments.
    Ratio {
        /// Largest eigenvalue.
        max: f64,
        /// Smallest eigenvalue, clamped to the tolerance.
        min: f64,
        /// `max / min`.
        ratio: f64,
    },
    /// Comparison with a primitive collision shape.
    Geometry {
        /// Moments of the shape, ascending.
        expected_eigenvalues: [f64; 3],
        /// Moments of the declared tensor, ascending.
        actual_eigenvalues: [f64; 3],
        /// Smallest and largest actual/expected ratio.
        ratio_range: [f64; 2],
        /// Implied density of the shape, `NaN` for zero volume.
        density_estimate: f64,
    },
}

/// One value in [`CheckDetails::entries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailValue<'a> {
    /// A single number.
    Number(f64),
    /// A sequence of numbers.
    Numbers(&'a [f64]),
}

impl fmt::Display for DetailValue<'_> {
    /// Numbers are shown with 3 significant digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => f.write_str(&format_significant(*v, 3)),
            Self::Numbers(values) => {
                let parts: Vec<String> = values.iter().map(|v| format_significant(*v, 3)).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl CheckDetails {
    /// Named values in a stable order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, DetailValue<'_>)> {
        match self {
            Self::Empty => Vec::new(),
            Self::Mass { mass } => vec![("mass", DetailValue::Number(*mass))],
            Self::Eigenvalues { eigenvalues } => {
                vec![("eigenvalues", DetailValue::Numbers(eigenvalues))]
            }
            Self::Ratio { max, min, ratio } => vec![
                ("max", DetailValue::Number(*max)),
                ("min", DetailValue::Number(*min)),
                ("ratio", DetailValue::Number(*ratio)),
            ],
            Self::Geometry {
                expected_eigenvalues,
                actual_eigenvalues,
                ratio_range,
                density_estimate,
            } => vec![
                (
                    "expected_eigenvalues",
                    DetailValue::Numbers(expected_eigenvalues),
                ),
                ("actual_eigenvalues", DetailValue::Numbers(actual_eigenvalues)),
                ("ratio_range", DetailValue::Numbers(ratio_range)),
                ("density_estimate", DetailValue::Number(*density_estimate)),
            ],
        }
    }

    /// Whether there is nothing to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[cfg(feature = "serde")]
impl Serialize for CheckDetails {
    /// Serialized as a string-keyed map; non-finite numbers become `null`
    /// in formats without a representation for them.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            match value {
                DetailValue::Number(v) => map.serialize_entry(key, &v)?,
                DetailValue::Numbers(values) => map.serialize_entry(key, values)?,
            }
        }
        map.end()
    }
}

/// Outcome of one plausibility check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InertiaCheck {
    /// Which check this is.
    #[cfg_attr(feature = "serde", serde(rename = "check"))]
    pub kind: CheckKind,
    /// Whether the check passed.
    pub passed: bool,
    /// Severity; [`Severity::Info`] for passing checks.
    pub severity: Severity,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Evidence for the decision.
    pub details: CheckDetails,
}

impl InertiaCheck {
    /// A passing check.
    #[must_use]
    pub const fn pass(kind: CheckKind, message: &'static str, details: CheckDetails) -> Self {
        Self {
            kind,
            passed: true,
            severity: Severity::Info,
            message,
            details,
        }
    }

    /// A failing check.
    #[must_use]
    pub const fn fail(
        kind: CheckKind,
        severity: Severity,
        message: &'static str,
        details: CheckDetails,
    ) -> Self {
        Self {
            kind,
            passed: false,
            severity,
            message,
            details,
        }
    }

    /// Pick [`Self::pass`] or [`Self::fail`] from `passed`.
    #[must_use]
    pub const fn outcome(
        kind: CheckKind,
        passed: bool,
        failure_severity: Severity,
        messages: (&'static str, &'static str),
        details: CheckDetails,
    ) -> Self {
        if passed {
            Self::pass(kind, messages.0, details)
        } else {
            Self::fail(kind, failure_severity, messages.1, details)
        }
    }

    /// Expected principal moments, when this is a geometry cross-check.
    #[must_use]
    pub fn expected_eigenvalues(&self) -> Option<[f64; 3]> {
        match self.details {
            CheckDetails::Geometry {
                expected_eigenvalues,
                ..
            } => Some(expected_eigenvalues),
            _ => None,
        }
    }
}

/// Most severe failure among `checks`, `None` if all passed.
#[must_use]
pub fn worst_failure(checks: &[InertiaCheck]) -> Option<Severity> {
    checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| c.severity)
        .max()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(CheckKind::InertialPresent.as_str(), "inertial_present");
        assert_eq!(CheckKind::GeometryConsistency.to_string(), "geometry_consistency");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_outcome() {
        let messages = ("fine", "broken");
        let ok = InertiaCheck::outcome(
            CheckKind::PositiveDefinite,
            true,
            Severity::Error,
            messages,
            CheckDetails::Empty,
        );
        assert!(ok.passed);
        assert_eq!(ok.severity, Severity::Info);
        assert_eq!(ok.message, "fine");

        let bad = InertiaCheck::outcome(
            CheckKind::PositiveDefinite,
            false,
            Severity::Error,
            messages,
            CheckDetails::Empty,
        );
        assert!(!bad.passed);
        assert_eq!(bad.severity, Severity::Error);
        assert_eq!(bad.message, "broken");
    }

    #[test]
    fn test_worst_failure() {
        let pass = InertiaCheck::pass(CheckKind::MassPositive, "ok", CheckDetails::Empty);
        let warn = InertiaCheck::fail(
            CheckKind::EigenvalueRatio,
            Severity::Warning,
            "w",
            CheckDetails::Empty,
        );
        let err = InertiaCheck::fail(
            CheckKind::PositiveDefinite,
            Severity::Error,
            "e",
            CheckDetails::Empty,
        );
        assert_eq!(worst_failure(&[pass.clone()]), None);
        assert_eq!(worst_failure(&[pass.clone(), warn.clone()]), Some(Severity::Warning));
        assert_eq!(worst_failure(&[warn, err, pass]), Some(Severity::Error));
    }

    #[test]
    fn test_detail_entries_and_display() {
        let details = CheckDetails::Ratio {
            max: 1000.0,
            min: 1.0,
            ratio: 1000.0,
        };
        let shown: Vec<String> = details
            .entries()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        assert_eq!(shown, ["max=1e+03", "min=1", "ratio=1e+03"]);

        let eig = CheckDetails::Eigenvalues {
            eigenvalues: [0.5, 1.0, 1.6667],
        };
        assert_eq!(eig.entries()[0].1.to_string(), "[0.5, 1, 1.67]");
        assert!(CheckDetails::Empty.entries().is_empty());
    }

    #[test]
    fn test_expected_eigenvalues_accessor() {
        let check = InertiaCheck::pass(
            CheckKind::GeometryConsistency,
            "ok",
            CheckDetails::Geometry {
                expected_eigenvalues: [1.0, 2.0, 3.0],
                actual_eigenvalues: [1.0, 2.0, 3.0],
                ratio_range: [1.0, 1.0],
                density_estimate: 1000.0,
            },
        );
        assert_eq!(check.expected_eigenvalues(), Some([1.0, 2.0, 3.0]));
        let other = InertiaCheck::pass(CheckKind::MassPositive, "ok", CheckDetails::Mass { mass: 1.0 });
        assert_eq!(other.expected_eigenvalues(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_check() {
        let check = InertiaCheck::fail(
            CheckKind::MassFinite,
            Severity::Error,
            "Link mass is missing or non-finite.",
            CheckDetails::Mass { mass: f64::NAN },
        );
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["check"], "mass_finite");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["passed"], false);
        assert!(json["details"]["mass"].is_null());

        let json = serde_json::to_value(CheckDetails::Empty).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
