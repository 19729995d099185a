//! Renderer-independent description of a kinematic tree with its checks.
//!
//! A [`TreeScene`] holds one node per link and one edge per child link.
//! Node styling follows the link's contents and its worst failed check.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use sim_inertia::{CheckKind, InertiaCheck, InertiaSummary, Severity};
use sim_urdf::{KinematicTree, UrdfJointType, UrdfRobot};

use crate::layout::{NodePosition, TreeLayout};

// ============================================================================
// Scene types
// ============================================================================

/// Node outline shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    /// Links with an inertial block.
    Ellipse,
    /// Links without one.
    Rectangle,
}

/// Colors and outline of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    /// Outline shape.
    pub shape: NodeShape,
    /// Fill color.
    pub fill: &'static str,
    /// Outline color.
    pub outline: &'static str,
    /// Label color.
    pub font_color: &'static str,
    /// Outline width in pixels.
    pub outline_width: u8,
}

/// Status tag of one check line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusTag {
    /// Passed.
    #[serde(rename = "OK")]
    Ok,
    /// Failed with warning severity.
    #[serde(rename = "WARN")]
    Warn,
    /// Failed with any other severity.
    #[serde(rename = "FAIL")]
    Fail,
}

impl StatusTag {
    /// Tag for a check outcome.
    #[must_use]
    pub fn of(check: &InertiaCheck) -> Self {
        if check.passed {
            Self::Ok
        } else if check.severity == Severity::Warning {
            Self::Warn
        } else {
            Self::Fail
        }
    }

    /// Upper-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One display line per check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    /// Outcome tag.
    pub tag: StatusTag,
    /// Check name when passed, else the formatted failure message.
    pub text: String,
}

/// Link data attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePayload {
    /// Whether the link has an inertial block.
    pub has_inertia: bool,
    /// Whether the link has any collision element.
    pub has_collision: bool,
    /// Checks of the link in evaluation order.
    pub checks: Vec<InertiaCheck>,
    /// Display lines for `checks`.
    pub check_entries: Vec<StatusEntry>,
    /// Moments of the collision estimate, taken from the geometry check.
    pub expected_eigenvalues: Option<[f64; 3]>,
}

/// A link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    /// Link name.
    pub name: String,
    /// Layout position, the origin for unplaced links.
    pub position: NodePosition,
    /// Link contents and checks.
    pub payload: NodePayload,
    /// Styling.
    pub style: NodeStyle,
}

/// A joint, drawn from parent to child.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneEdge {
    /// Parent link.
    pub parent: String,
    /// Child link.
    pub child: String,
    /// Joint name.
    pub label: Option<String>,
    /// Joint type, when the joint is declared.
    pub joint_type: Option<UrdfJointType>,
    /// Stroke color.
    pub stroke: &'static str,
}

/// Robot-level information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneMetadata {
    /// Robot name.
    pub robot_name: String,
    /// Root link.
    pub base_link: Option<String>,
}

/// Nodes, edges and metadata of a kinematic tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeScene {
    /// One node per link, in model order.
    pub nodes: Vec<SceneNode>,
    /// One edge per child link, in joint order.
    pub edges: Vec<SceneEdge>,
    /// Robot-level information.
    pub metadata: SceneMetadata,
}

impl TreeScene {
    /// Node of `link`.
    #[must_use]
    pub fn node(&self, link: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.name == link)
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Build the scene for `robot`.
///
/// Links missing from `positions` sit at the origin; links missing from
/// `summary` get no checks.
#[must_use]
pub fn build_tree_scene(
    robot: &UrdfRobot,
    tree: &KinematicTree,
    positions: &TreeLayout,
    summary: &InertiaSummary,
) -> TreeScene {
    let nodes = robot
        .links
        .iter()
        .map(|link| {
            let has_inertia = link.has_inertial();
            let has_collision = link.has_collision();
            let checks = summary.get(&link.name).unwrap_or_default().to_vec();

            let (fill, font_color) = if has_collision {
                ("#66bb6a", "#ffffff")
            } else if has_inertia {
                ("#e3f2fd", "#0d47a1")
            } else {
                ("#eceff1", "#37474f")
            };
            let (outline, outline_width) = outline_for(&checks, has_inertia);

            SceneNode {
                name: link.name.clone(),
                position: positions.get(&link.name).copied().unwrap_or_default(),
                style: NodeStyle {
                    shape: if has_inertia {
                        NodeShape::Ellipse
                    } else {
                        NodeShape::Rectangle
                    },
                    fill,
                    outline,
                    font_color,
                    outline_width,
                },
                payload: NodePayload {
                    has_inertia,
                    has_collision,
                    check_entries: checks.iter().map(status_entry).collect(),
                    expected_eigenvalues: checks
                        .iter()
                        .find(|c| c.kind == CheckKind::GeometryConsistency)
                        .and_then(InertiaCheck::expected_eigenvalues),
                    checks,
                },
            }
        })
        .collect();

    let mut edges = Vec::new();
    let mut drawn = HashSet::new();
    for joint in &robot.joints {
        let child = joint.child.as_str();
        if !drawn.insert(child) {
            continue;
        }
        let Some(parent) = tree.parent_of(child) else {
            continue;
        };
        let label = tree.joint_for(child);
        let joint_type = label
            .and_then(|name| robot.joint(name))
            .map(|j| j.joint_type.clone());
        edges.push(SceneEdge {
            parent: parent.to_string(),
            child: child.to_string(),
            label: label.map(ToString::to_string),
            stroke: stroke_for(joint_type.as_ref()),
            joint_type,
        });
    }

    TreeScene {
        nodes,
        edges,
        metadata: SceneMetadata {
            robot_name: robot.name.clone(),
            base_link: tree.root().map(ToString::to_string),
        },
    }
}

fn outline_for(checks: &[InertiaCheck], has_inertia: bool) -> (&'static str, u8) {
    let worst = checks.iter().map(StatusTag::of).max_by_key(|tag| match tag {
        StatusTag::Ok => 0,
        StatusTag::Warn => 1,
        StatusTag::Fail => 2,
    });
    match worst {
        Some(StatusTag::Fail) => ("#c62828", 5),
        Some(StatusTag::Warn) => ("#f9a825", 4),
        _ if has_inertia => ("#1565c0", 3),
        _ => ("#90a4ae", 2),
    }
}

fn stroke_for(joint_type: Option<&UrdfJointType>) -> &'static str {
    match joint_type {
        Some(UrdfJointType::Revolute) => "#1976d2",
        Some(UrdfJointType::Continuous) => "#00796b",
        Some(UrdfJointType::Prismatic) => "#f57c00",
        Some(UrdfJointType::Planar) => "#6a1b9a",
        _ => "#424242",
    }
}

fn status_entry(check: &InertiaCheck) -> StatusEntry {
    let tag = StatusTag::of(check);
    let text = match tag {
        StatusTag::Ok => check.kind.to_string(),
        StatusTag::Warn | StatusTag::Fail => format_failure(check),
    };
    StatusEntry { tag, text }
}

/// `"check: message (key=value; ...)"` with 3 significant digits.
#[must_use]
pub fn format_failure(check: &InertiaCheck) -> String {
    let base = format!("{}: {}", check.kind, check.message);
    if check.details.is_empty() {
        return base;
    }
    let details: Vec<String> = check
        .details
        .entries()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{base} ({})", details.join("; "))
}
