//! Terminal output for check reports, trees and rewrites.
//!
//! Every writer takes a `color` flag; without it the output is plain text.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use sim_inertia::{InertiaSummary, RewriteReport};

use crate::scene::{StatusTag, TreeScene};

fn paint(text: &str, tag: StatusTag, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match tag {
        StatusTag::Ok => text.green().to_string(),
        StatusTag::Warn => text.yellow().to_string(),
        StatusTag::Fail => text.red().to_string(),
    }
}

/// Print every link's checks followed by a summary line.
///
/// ```text
///   Link: base
///     [OK] mass_positive: Mass is positive.
///       - mass: 5
///   Summary: 4 ok, 1 warnings
/// ```
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_check_report(
    out: &mut impl Write,
    summary: &InertiaSummary,
    color: bool,
) -> io::Result<()> {
    for (link, checks) in summary.iter() {
        writeln!(out, "  Link: {link}")?;
        if checks.is_empty() {
            writeln!(out, "    (no checks run)")?;
            continue;
        }
        for check in checks {
            let tag = StatusTag::of(check);
            let label = paint(&format!("[{tag}]"), tag, color);
            writeln!(out, "    {label} {}: {}", check.kind, check.message)?;
            for (key, value) in check.details.entries() {
                writeln!(out, "      - {key}: {value}")?;
            }
        }
    }

    let counts = summary.counts();
    let mut parts = Vec::new();
    if counts.passed > 0 {
        parts.push(paint(&format!("{} ok", counts.passed), StatusTag::Ok, color));
    }
    if counts.warnings > 0 {
        parts.push(paint(
            &format!("{} warnings", counts.warnings),
            StatusTag::Warn,
            color,
        ));
    }
    if counts.failures > 0 {
        parts.push(paint(
            &format!("{} failures", counts.failures),
            StatusTag::Fail,
            color,
        ));
    }
    if parts.is_empty() {
        parts.push("no checks run".to_string());
    }
    writeln!(out, "  Summary: {}", parts.join(", "))
}

/// Print the scene as an indented list of placed links and their joints.
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_tree(out: &mut impl Write, scene: &TreeScene, color: bool) -> io::Result<()> {
    let base = scene.metadata.base_link.as_deref().unwrap_or("-");
    writeln!(out, "Robot: {} (base: {base})", scene.metadata.robot_name)?;

    writeln!(out, "Links:")?;
    for node in &scene.nodes {
        writeln!(
            out,
            "  {} at ({}, {}) [{:?}, fill {}, outline {} x{}]",
            node.name,
            node.position.x,
            node.position.y,
            node.style.shape,
            node.style.fill,
            node.style.outline,
            node.style.outline_width,
        )?;
        for entry in &node.payload.check_entries {
            let label = paint(entry.tag.as_str(), entry.tag, color);
            writeln!(out, "    {label} {}", entry.text)?;
        }
    }

    if !scene.edges.is_empty() {
        writeln!(out, "Joints:")?;
    }
    for edge in &scene.edges {
        let kind = edge.joint_type.as_ref().map_or("unknown", |t| t.as_str());
        writeln!(
            out,
            "  {} -> {} via {} ({kind}, stroke {})",
            edge.parent,
            edge.child,
            edge.label.as_deref().unwrap_or("-"),
            edge.stroke,
        )?;
    }
    Ok(())
}

/// Print updated and skipped links and the written path.
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_rewrite_report(out: &mut impl Write, report: &RewriteReport) -> io::Result<()> {
    let mut updated: Vec<&str> = report.updated.iter().map(String::as_str).collect();
    updated.sort_unstable();
    writeln!(
        out,
        "Updated {} link(s): {}",
        updated.len(),
        updated.join(", ")
    )?;

    if !report.skipped.is_empty() {
        let skipped: Vec<String> = report
            .skipped
            .iter()
            .map(|(link, reason)| format!("{link} [{reason}]"))
            .collect();
        writeln!(out, "Skipped: {}", skipped.join(", "))?;
    }
    writeln!(out, "Wrote: {}", report.output.display())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use sim_inertia::{summarize, SkipReason};
    use sim_urdf::{KinematicTree, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointType, UrdfLink, UrdfRobot};

    use crate::layout::compute_tree_layout;
    use crate::scene::build_tree_scene;

    fn robot() -> UrdfRobot {
        UrdfRobot::new("pendulum")
            .with_link(UrdfLink::new("world"))
            .with_link(
                UrdfLink::new("bob")
                    .with_inertial(UrdfInertial::new(2.0, UrdfInertia::diagonal(1.0, 1.0, 1.0))),
            )
            .with_joint(UrdfJoint::new("hinge", UrdfJointType::Revolute, "world", "bob"))
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_check_report_plain() {
        let summary = summarize(&robot().links);
        let text = render(|out| write_check_report(out, &summary, false));

        assert!(text.starts_with(
            "  Link: world\n    [WARN] inertial_present: Link has no <inertial> definition.\n"
        ));
        assert!(text.contains("    [OK] mass_positive: Mass is positive.\n      - mass: 2\n"));
        assert!(text.contains("      - eigenvalues: [1, 1, 1]\n"));
        assert!(text.ends_with("  Summary: 4 ok, 1 warnings\n"));
    }

    #[test]
    fn test_check_report_colored() {
        let summary = summarize(&robot().links);
        let text = render(|out| write_check_report(out, &summary, true));
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("inertial_present"));
    }

    #[test]
    fn test_empty_report() {
        let text = render(|out| write_check_report(out, &InertiaSummary::default(), false));
        assert_eq!(text, "  Summary: no checks run\n");
    }

    #[test]
    fn test_tree() {
        let robot = robot();
        let tree = KinematicTree::from_robot(&robot);
        let scene = build_tree_scene(
            &robot,
            &tree,
            &compute_tree_layout(&tree),
            &summarize(&robot.links),
        );
        let text = render(|out| write_tree(out, &scene, false));

        assert!(text.starts_with("Robot: pendulum (base: world)\nLinks:\n"));
        assert!(text.contains("  bob at (0, -1) [Ellipse, fill #e3f2fd, outline #1565c0 x3]\n"));
        assert!(text.contains("    WARN inertial_present: Link has no <inertial> definition.\n"));
        assert!(text.contains("    OK positive_definite\n"));
        assert!(text.ends_with("  world -> bob via hinge (revolute, stroke #1976d2)\n"));
    }

    #[test]
    fn test_rewrite_report() {
        let report = RewriteReport {
            output: PathBuf::from("arm_fixed.urdf"),
            updated: vec!["upper".to_string(), "base".to_string()],
            skipped: vec![("tool".to_string(), SkipReason::NoGeometry)],
        };
        let text = render(|out| write_rewrite_report(out, &report));
        assert_eq!(
            text,
            format!(
                "Updated 2 link(s): base, upper\nSkipped: tool [{}]\nWrote: arm_fixed.urdf\n",
                SkipReason::NoGeometry
            )
        );
    }
}
