//! Replace implausible inertias with estimates from primitive geometry.
//!
//! Links are selected from the check report, their tensors are recomputed
//! from the first collision (or visual) shape and written into a copy of
//! the URDF. The mass is read from the document itself and never changed.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use sim_inertia::{fix_inertias, RewriteOptions};
//!
//! let options = RewriteOptions::default().include_warnings(true);
//! let report = fix_inertias(Path::new("robots/arm/arm.urdf"), None, &options)?;
//! println!("updated {} link(s), wrote {}", report.updated.len(), report.output.display());
//! # Ok::<(), sim_inertia::InertiaError>(())
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use sim_urdf::{
    InertialEdit, UrdfDocument, UrdfError, UrdfGeometry, UrdfInertia, UrdfLink, UrdfOrigin,
    UrdfRobot,
};
use tracing::{debug, info, warn};

use crate::check::{CheckKind, Severity};
use crate::error::{InertiaError, InertiaResult};
use crate::estimate::estimate_principal_inertia;
use crate::params::CheckParams;
use crate::summary::{summarize_with, InertiaSummary};
use crate::tensor::{rotate_principal, rpy_rotation, sanitize};

/// Entries below this magnitude are written as exact zeros.
pub const SANITIZE_TOLERANCE: f64 = 1e-12;

/// Where a replacement geometry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometrySource {
    /// `<collision>` entries.
    #[default]
    Collision,
    /// `<visual>` entries.
    Visual,
}

impl GeometrySource {
    /// Element name of the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::Visual => "visual",
        }
    }
}

impl fmt::Display for GeometrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which links to rewrite and where to take geometry from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewriteOptions {
    /// Also rewrite links whose only failures are warnings.
    pub include_warnings: bool,
    /// Count `triangle_inequality` failures.
    pub include_triangle: bool,
    /// Preferred geometry when a link has both kinds.
    pub prefer: GeometrySource,
    /// Thresholds used to select links.
    pub params: CheckParams,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            include_warnings: false,
            include_triangle: true,
            prefer: GeometrySource::Collision,
            params: CheckParams::default(),
        }
    }
}

impl RewriteOptions {
    /// Set whether warning-level failures select a link.
    #[must_use]
    pub const fn include_warnings(mut self, include: bool) -> Self {
        self.include_warnings = include;
        self
    }

    /// Set whether triangle-inequality failures select a link.
    #[must_use]
    pub const fn include_triangle(mut self, include: bool) -> Self {
        self.include_triangle = include;
        self
    }

    /// Set the preferred geometry source.
    #[must_use]
    pub const fn prefer(mut self, source: GeometrySource) -> Self {
        self.prefer = source;
        self
    }

    /// Set the check thresholds.
    #[must_use]
    pub const fn params(mut self, params: CheckParams) -> Self {
        self.params = params;
        self
    }
}

/// Why a selected link was left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No top-level `<link>` with this name in the document.
    LinkNotFound,
    /// The document mass is missing, unparsable, non-finite or not positive.
    InvalidMass,
    /// The link has neither collision nor visual entries.
    NoGeometry,
    /// The picked geometry has no closed-form inertia.
    UnsupportedGeometry {
        /// Where the geometry came from.
        source: GeometrySource,
        /// Shape name, e.g. `mesh`.
        kind: &'static str,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkNotFound => f.write_str("link element not found"),
            Self::InvalidMass => f.write_str("missing or non-positive mass"),
            Self::NoGeometry => f.write_str("no usable geometry (box/cylinder/sphere)"),
            Self::UnsupportedGeometry { source, kind } => {
                write!(f, "unsupported geometry type for {source}: {kind}")
            }
        }
    }
}

/// Edits and skips computed for a document, before anything is written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewritePlan {
    /// New inertials, in model order.
    pub edits: Vec<InertialEdit>,
    /// Selected links that cannot be rewritten, in model order.
    pub skipped: Vec<(String, SkipReason)>,
}

/// Outcome of [`fix_inertias`].
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteReport {
    /// File that was written.
    pub output: PathBuf,
    /// Rewritten links, in model order.
    pub updated: Vec<String>,
    /// Selected links left unchanged, with the reason.
    pub skipped: Vec<(String, SkipReason)>,
}

/// Names of links with a failure that matches `options`, in report order.
///
/// Without `include_warnings` only error-severity failures count; without
/// `include_triangle` triangle-inequality failures are ignored.
#[must_use]
pub fn collect_problem_links(summary: &InertiaSummary, options: &RewriteOptions) -> Vec<String> {
    summary
        .iter()
        .filter(|(_, checks)| {
            checks.iter().any(|c| {
                !c.passed
                    && (options.include_warnings || c.severity == Severity::Error)
                    && (options.include_triangle || c.kind != CheckKind::TriangleInequality)
            })
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// First geometry of the preferred kind, falling back to the other kind.
#[must_use]
pub fn pick_geometry(
    link: &UrdfLink,
    prefer: GeometrySource,
) -> Option<(GeometrySource, &UrdfGeometry, &UrdfOrigin)> {
    let collision = || {
        link.collisions
            .first()
            .map(|c| (GeometrySource::Collision, &c.geometry, &c.origin))
    };
    let visual = || {
        link.visuals
            .first()
            .map(|v| (GeometrySource::Visual, &v.geometry, &v.origin))
    };
    match prefer {
        GeometrySource::Collision => collision().or_else(visual),
        GeometrySource::Visual => visual().or_else(collision),
    }
}

/// Principal moments given in a shape frame rotated by `rpy`, expressed in
/// the link frame and cleaned up for writing.
#[must_use]
pub fn link_frame_inertia(moments: &Vector3<f64>, rpy: &Vector3<f64>) -> UrdfInertia {
    let rotated = rotate_principal(moments, &rpy_rotation(rpy));
    UrdfInertia::from_matrix(&sanitize(&rotated, SANITIZE_TOLERANCE))
}

/// Decide the new inertial of every selected link.
///
/// # Errors
///
/// Returns [`InertiaError::NoQualifyingLinks`] if no link is selected, and
/// propagates document errors other than a missing link.
pub fn plan_rewrite(
    document: &UrdfDocument,
    robot: &UrdfRobot,
    options: &RewriteOptions,
) -> InertiaResult<RewritePlan> {
    let summary = summarize_with(&robot.links, &options.params);
    let selected = collect_problem_links(&summary, options);
    if selected.is_empty() {
        return Err(InertiaError::NoQualifyingLinks);
    }

    let mut plan = RewritePlan::default();
    for name in selected {
        match plan_link(document, robot, &name, options.prefer)? {
            Ok(edit) => {
                debug!(link = %name, inertia = ?edit.inertia.entries(), "replacing inertia");
                plan.edits.push(edit);
            }
            Err(reason) => {
                warn!(link = %name, %reason, "skipping inertia rewrite");
                plan.skipped.push((name, reason));
            }
        }
    }
    Ok(plan)
}

fn plan_link(
    document: &UrdfDocument,
    robot: &UrdfRobot,
    name: &str,
    prefer: GeometrySource,
) -> InertiaResult<Result<InertialEdit, SkipReason>> {
    let mass = match document.link_mass(name) {
        Ok(mass) => mass,
        Err(UrdfError::LinkNotFound(_)) => return Ok(Err(SkipReason::LinkNotFound)),
        Err(e) => return Err(e.into()),
    };
    let Some(mass) = mass.filter(|m| m.is_finite() && *m > 0.0) else {
        return Ok(Err(SkipReason::InvalidMass));
    };

    let link = robot.require_link(name)?;
    let Some((source, geometry, origin)) = pick_geometry(link, prefer) else {
        return Ok(Err(SkipReason::NoGeometry));
    };
    let Some(estimate) = estimate_principal_inertia(geometry, mass) else {
        return Ok(Err(SkipReason::UnsupportedGeometry {
            source,
            kind: geometry.kind(),
        }));
    };

    Ok(Ok(InertialEdit {
        link: name.to_string(),
        center_of_mass: origin.xyz,
        inertia: link_frame_inertia(&estimate.moments, &origin.rpy),
    }))
}

/// `<stem>_fixed<.ext>` next to `source`.
#[must_use]
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{stem}_fixed.{}", ext.to_string_lossy()),
        None => format!("{stem}_fixed"),
    };
    source.with_file_name(name)
}

/// Rewrite the inertias of failing links in `source` and write the result
/// to `output` (default: [`default_output_path`]).
///
/// Nothing is written unless at least one link is updated.
///
/// # Errors
///
/// - [`InertiaError::OutputOverwritesSource`] if `output` is `source`
/// - [`InertiaError::NoQualifyingLinks`] if no link fails a selected check
/// - [`InertiaError::NoLinksUpdated`] if every selected link is skipped
/// - read, parse and write failures
pub fn fix_inertias(
    source: &Path,
    output: Option<&Path>,
    options: &RewriteOptions,
) -> InertiaResult<RewriteReport> {
    let output = output.map_or_else(|| default_output_path(source), Path::to_path_buf);
    if same_file(source, &output) {
        return Err(InertiaError::OutputOverwritesSource(output));
    }

    let document = UrdfDocument::load(source)?;
    let robot = document.parse()?;
    let plan = plan_rewrite(&document, &robot, options)?;

    if plan.edits.is_empty() {
        return Err(InertiaError::NoLinksUpdated {
            reasons: plan
                .skipped
                .into_iter()
                .map(|(link, reason)| (link, reason.to_string()))
                .collect(),
        });
    }

    let text = document.apply(&plan.edits)?;
    fs::write(&output, text).map_err(|e| InertiaError::write(&output, e))?;

    let updated: Vec<String> = plan.edits.into_iter().map(|e| e.link).collect();
    info!(
        source = %source.display(),
        output = %output.display(),
        updated = updated.len(),
        skipped = plan.skipped.len(),
        "wrote repaired URDF"
    );

    Ok(RewriteReport {
        output,
        updated,
        skipped: plan.skipped,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sim_urdf::{parse_urdf_str, UrdfCollision, UrdfVisual};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_skip_reason_messages() {
        assert_eq!(SkipReason::LinkNotFound.to_string(), "link element not found");
        assert_eq!(SkipReason::InvalidMass.to_string(), "missing or non-positive mass");
        assert_eq!(
            SkipReason::NoGeometry.to_string(),
            "no usable geometry (box/cylinder/sphere)"
        );
        assert_eq!(
            SkipReason::UnsupportedGeometry {
                source: GeometrySource::Visual,
                kind: "mesh"
            }
            .to_string(),
            "unsupported geometry type for visual: mesh"
        );
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("robots/arm/arm.urdf")),
            PathBuf::from("robots/arm/arm_fixed.urdf")
        );
        assert_eq!(
            default_output_path(Path::new("model")),
            PathBuf::from("model_fixed")
        );
    }

    #[test]
    fn test_options_defaults() {
        let options = RewriteOptions::default();
        assert!(!options.include_warnings);
        assert!(options.include_triangle);
        assert_eq!(options.prefer, GeometrySource::Collision);

        let options = options
            .include_warnings(true)
            .include_triangle(false)
            .prefer(GeometrySource::Visual);
        assert!(options.include_warnings);
        assert!(!options.include_triangle);
        assert_eq!(options.prefer, GeometrySource::Visual);
    }

    #[test]
    fn test_pick_geometry_preference() {
        let link = UrdfLink::new("l")
            .with_visual(UrdfVisual::new(UrdfOrigin::default(), UrdfGeometry::sphere(1.0)))
            .with_collision(UrdfCollision::new(
                UrdfOrigin::from_xyz(0.0, 0.0, 1.0),
                UrdfGeometry::mesh("hull.stl"),
            ))
            .with_collision(UrdfCollision::new(
                UrdfOrigin::default(),
                UrdfGeometry::box_shape(1.0, 1.0, 1.0),
            ));

        let (source, geometry, origin) = pick_geometry(&link, GeometrySource::Collision).unwrap();
        assert_eq!(source, GeometrySource::Collision);
        assert_eq!(geometry.kind(), "mesh");
        assert_relative_eq!(origin.xyz.z, 1.0);

        let (source, geometry, _) = pick_geometry(&link, GeometrySource::Visual).unwrap();
        assert_eq!(source, GeometrySource::Visual);
        assert_eq!(geometry.kind(), "sphere");

        let visual_only = UrdfLink::new("v")
            .with_visual(UrdfVisual::new(UrdfOrigin::default(), UrdfGeometry::sphere(1.0)));
        let (source, _, _) = pick_geometry(&visual_only, GeometrySource::Collision).unwrap();
        assert_eq!(source, GeometrySource::Visual);

        assert!(pick_geometry(&UrdfLink::new("bare"), GeometrySource::Collision).is_none());
    }

    #[test]
    fn test_link_frame_inertia_identity() {
        let moments = Vector3::new(5.0 / 6.0, 25.0 / 12.0, 25.0 / 12.0);
        let inertia = link_frame_inertia(&moments, &Vector3::zeros());
        assert_relative_eq!(inertia.ixx, 5.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(inertia.iyy, 25.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(inertia.izz, 25.0 / 12.0, epsilon = 1e-12);
        assert_eq!(inertia.ixy, 0.0);
        assert_eq!(inertia.ixz, 0.0);
        assert_eq!(inertia.iyz, 0.0);
    }

    #[test]
    fn test_link_frame_inertia_rotated_cylinder() {
        // cylinder axis (local z) rolled onto the link y axis
        let moments = Vector3::new(1.0, 1.0, 0.2);
        let inertia = link_frame_inertia(&moments, &Vector3::new(FRAC_PI_2, 0.0, 0.0));
        assert_relative_eq!(inertia.ixx, 1.0, epsilon = 1e-12);
        assert_relative_eq!(inertia.iyy, 0.2, epsilon = 1e-12);
        assert_relative_eq!(inertia.izz, 1.0, epsilon = 1e-12);
        assert_eq!(inertia.iyz, 0.0);
    }

    const ROBOT: &str = r#"<robot name="r">
  <link name="good">
    <inertial><mass value="1"/><inertia ixx="0.1" iyy="0.1" izz="0.1"/></inertial>
  </link>
  <link name="flat">
    <inertial><mass value="5"/><inertia ixx="0" iyy="0" izz="0"/></inertial>
    <collision><geometry><box size="2 1 1"/></geometry></collision>
  </link>
  <link name="skewed">
    <inertial><mass value="1"/><inertia ixx="1" iyy="1" izz="3"/></inertial>
    <collision><geometry><sphere radius="1"/></geometry></collision>
  </link>
  <link name="scanned">
    <inertial><mass value="2"/><inertia ixx="-1" iyy="1" izz="1"/></inertial>
    <collision><geometry><mesh filename="scan.stl"/></geometry></collision>
  </link>
  <link name="weightless">
    <inertial><mass value="0"/><inertia ixx="1" iyy="1" izz="1"/></inertial>
    <collision><geometry><sphere radius="1"/></geometry></collision>
  </link>
  <link name="floating">
    <inertial><mass value="1"/><inertia ixx="-1" iyy="1" izz="1"/></inertial>
  </link>
</robot>"#;

    #[test]
    fn test_plan_rewrite() {
        let doc = UrdfDocument::new(ROBOT);
        let robot = parse_urdf_str(ROBOT).unwrap();
        let plan = plan_rewrite(&doc, &robot, &RewriteOptions::default()).unwrap();

        let edited: Vec<&str> = plan.edits.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(edited, ["flat", "skewed"]);

        let flat = &plan.edits[0].inertia;
        assert_relative_eq!(flat.ixx, 5.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(flat.iyy, 25.0 / 12.0, epsilon = 1e-12);

        assert_eq!(
            plan.skipped,
            [
                (
                    "scanned".to_string(),
                    SkipReason::UnsupportedGeometry {
                        source: GeometrySource::Collision,
                        kind: "mesh"
                    }
                ),
                ("weightless".to_string(), SkipReason::InvalidMass),
                ("floating".to_string(), SkipReason::NoGeometry),
            ]
        );
    }

    #[test]
    fn test_plan_without_triangle() {
        let doc = UrdfDocument::new(ROBOT);
        let robot = parse_urdf_str(ROBOT).unwrap();
        let options = RewriteOptions::default().include_triangle(false);
        let plan = plan_rewrite(&doc, &robot, &options).unwrap();
        assert!(plan.edits.iter().all(|e| e.link != "skewed"));
    }

    #[test]
    fn test_plan_nothing_to_do() {
        let xml = r#"<robot name="r"><link name="a"><inertial><mass value="1"/><inertia ixx="1" iyy="1" izz="1"/></inertial></link></robot>"#;
        let robot = parse_urdf_str(xml).unwrap();
        assert!(matches!(
            plan_rewrite(&UrdfDocument::new(xml), &robot, &RewriteOptions::default()),
            Err(InertiaError::NoQualifyingLinks)
        ));
    }
}
