//! Model-wide check report.

use std::collections::HashMap;

use sim_urdf::UrdfLink;

use crate::check::{InertiaCheck, Severity};
use crate::evaluate::evaluate_with;
use crate::params::CheckParams;

#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Check results keyed by link name, iterated in model order.
///
/// A repeated link name replaces the earlier results but keeps the
/// position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InertiaSummary {
    entries: Vec<(String, Vec<InertiaCheck>)>,
    index: HashMap<String, usize>,
}

/// Tally of check outcomes across a summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounts {
    /// Checks that passed.
    pub passed: usize,
    /// Failed checks of warning severity.
    pub warnings: usize,
    /// Failed checks of any other severity.
    pub failures: usize,
}

impl CheckCounts {
    /// Total number of checks.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.warnings + self.failures
    }
}

impl InertiaSummary {
    /// Record the checks of one link.
    pub fn insert(&mut self, link: impl Into<String>, checks: Vec<InertiaCheck>) {
        let link = link.into();
        match self.index.get(&link) {
            Some(&i) => self.entries[i].1 = checks,
            None => {
                self.index.insert(link.clone(), self.entries.len());
                self.entries.push((link, checks));
            }
        }
    }

    /// Checks of `link`, if it was summarized.
    #[must_use]
    pub fn get(&self, link: &str) -> Option<&[InertiaCheck]> {
        self.index.get(link).map(|&i| self.entries[i].1.as_slice())
    }

    /// `(link, checks)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[InertiaCheck])> {
        self.entries
            .iter()
            .map(|(name, checks)| (name.as_str(), checks.as_slice()))
    }

    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no link was summarized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count passed checks, failed warnings and other failures.
    #[must_use]
    pub fn counts(&self) -> CheckCounts {
        let mut counts = CheckCounts::default();
        for check in self.entries.iter().flat_map(|(_, checks)| checks) {
            if check.passed {
                counts.passed += 1;
            } else if check.severity == Severity::Warning {
                counts.warnings += 1;
            } else {
                counts.failures += 1;
            }
        }
        counts
    }
}

#[cfg(feature = "serde")]
impl Serialize for InertiaSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (link, checks) in &self.entries {
            map.serialize_entry(link, checks)?;
        }
        map.end()
    }
}

/// Evaluate every link with default thresholds.
#[must_use]
pub fn summarize<'a>(links: impl IntoIterator<Item = &'a UrdfLink>) -> InertiaSummary {
    summarize_with(links, &CheckParams::default())
}

/// Evaluate every link.
#[must_use]
pub fn summarize_with<'a>(
    links: impl IntoIterator<Item = &'a UrdfLink>,
    params: &CheckParams,
) -> InertiaSummary {
    let mut summary = InertiaSummary::default();
    for link in links {
        summary.insert(link.name.clone(), evaluate_with(link, params));
    }
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::check::CheckKind;
    use sim_urdf::{UrdfInertia, UrdfInertial};

    fn links() -> Vec<UrdfLink> {
        vec![
            UrdfLink::new("world"),
            UrdfLink::new("arm")
                .with_inertial(UrdfInertial::new(1.0, UrdfInertia::diagonal(1.0, 1.0, 1.0))),
            UrdfLink::new("wrist")
                .with_inertial(UrdfInertial::new(-1.0, UrdfInertia::diagonal(1.0, 1.0, 3.0))),
        ]
    }

    #[test]
    fn test_summary_preserves_order() {
        let summary = summarize(&links());
        assert_eq!(summary.len(), 3);
        let names: Vec<&str> = summary.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["world", "arm", "wrist"]);
        assert_eq!(summary.get("world").unwrap().len(), 1);
        assert!(summary.get("ghost").is_none());
    }

    #[test]
    fn test_counts() {
        let counts = summarize(&links()).counts();
        // world: 1 warning; arm: 4 passed; wrist: mass and triangle fail,
        // positive_definite and ratio pass
        assert_eq!(
            counts,
            CheckCounts {
                passed: 6,
                warnings: 1,
                failures: 2,
            }
        );
        assert_eq!(counts.total(), 9);
    }

    #[test]
    fn test_duplicate_names_overwrite_in_place() {
        let mut links = links();
        links.push(UrdfLink::new("arm"));
        let summary = summarize(&links);
        assert_eq!(summary.len(), 3);
        let names: Vec<&str> = summary.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["world", "arm", "wrist"]);
        assert_eq!(summary.get("arm").unwrap()[0].kind, CheckKind::InertialPresent);
    }

    #[test]
    fn test_empty() {
        let summary = summarize(std::iter::empty());
        assert!(summary.is_empty());
        assert_eq!(summary.counts().total(), 0);
    }
}
