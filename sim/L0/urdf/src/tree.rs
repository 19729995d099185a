//! Kinematic tree over a parsed robot.
//!
//! [`KinematicTree`] is a lenient view used for display and traversal: it
//! never fails and tolerates forests and dangling joints. Use
//! [`validate_structure`] when a strict single-rooted tree is required.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, UrdfError};
use crate::types::{UrdfJoint, UrdfRobot};

/// Parent/child relations between links, keyed by link name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinematicTree {
    root: Option<String>,
    parent: HashMap<String, String>,
    joint_for: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

impl KinematicTree {
    /// Build the tree from the joints of `robot`.
    ///
    /// The root is the first link (in document order) that is not the
    /// child of any joint, or the first link when every link is a child.
    #[must_use]
    pub fn from_robot(robot: &UrdfRobot) -> Self {
        let mut parent = HashMap::new();
        let mut joint_for = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        for joint in &robot.joints {
            parent.insert(joint.child.clone(), joint.parent.clone());
            joint_for.insert(joint.child.clone(), joint.name.clone());
            children
                .entry(joint.parent.clone())
                .or_default()
                .push(joint.child.clone());
        }

        let root = robot
            .links
            .iter()
            .find(|l| !parent.contains_key(&l.name))
            .or_else(|| robot.links.first())
            .map(|l| l.name.clone());

        Self {
            root,
            parent,
            joint_for,
            children,
        }
    }

    /// Root link name, `None` for a robot without links.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Parent link of `link`.
    #[must_use]
    pub fn parent_of(&self, link: &str) -> Option<&str> {
        self.parent.get(link).map(String::as_str)
    }

    /// Name of the joint whose child is `link`.
    #[must_use]
    pub fn joint_for(&self, link: &str) -> Option<&str> {
        self.joint_for.get(link).map(String::as_str)
    }

    /// Child links of `link` in joint declaration order.
    #[must_use]
    pub fn children_of(&self, link: &str) -> &[String] {
        self.children.get(link).map_or(&[], Vec::as_slice)
    }

    /// All links reachable from the root, depth-first pre-order.
    ///
    /// Each link is visited at most once, so a cyclic description still
    /// terminates.
    #[must_use]
    pub fn descendants(&self) -> Vec<String> {
        let Some(root) = self.root.as_deref() else {
            return Vec::new();
        };

        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];

        while let Some(link) = stack.pop() {
            if !seen.insert(link) {
                continue;
            }
            order.push(link.to_string());
            // Reversed so the first child is popped first.
            for child in self.children_of(link).iter().rev() {
                stack.push(child.as_str());
            }
        }

        order
    }
}

/// Check that `robot` forms exactly one tree.
///
/// Fails on duplicate link or joint names, joints that reference unknown
/// links, links with more than one parent, zero or several roots, and
/// cycles.
///
/// # Errors
///
/// Returns the first structural problem found.
pub fn validate_structure(robot: &UrdfRobot) -> Result<()> {
    check_duplicates(robot)?;

    let link_names: HashSet<&str> = robot.link_names().collect();
    let mut parent_joint: HashMap<&str, &str> = HashMap::new();

    for joint in &robot.joints {
        check_joint_links(joint, &link_names)?;
        if parent_joint
            .insert(joint.child.as_str(), joint.name.as_str())
            .is_some()
        {
            return Err(UrdfError::KinematicLoop(format!(
                "link '{}' has multiple parent joints",
                joint.child
            )));
        }
    }

    let roots: Vec<String> = robot
        .link_names()
        .filter(|name| !parent_joint.contains_key(name))
        .map(str::to_string)
        .collect();

    match roots.as_slice() {
        [] => return Err(UrdfError::NoRootLink),
        [_] => {}
        _ => return Err(UrdfError::MultipleRootLinks(roots)),
    }

    // With one parent per link and a single root, any link unreachable
    // from the root sits on a cycle.
    let reached: HashSet<String> = KinematicTree::from_robot(robot)
        .descendants()
        .into_iter()
        .collect();
    if let Some(orphan) = robot.link_names().find(|name| !reached.contains(*name)) {
        return Err(UrdfError::KinematicLoop(format!(
            "cycle detected involving link '{orphan}'"
        )));
    }

    Ok(())
}

fn check_duplicates(robot: &UrdfRobot) -> Result<()> {
    let mut link_names = HashSet::new();
    for link in &robot.links {
        if !link_names.insert(&link.name) {
            return Err(UrdfError::DuplicateLink(link.name.clone()));
        }
    }

    let mut joint_names = HashSet::new();
    for joint in &robot.joints {
        if !joint_names.insert(&joint.name) {
            return Err(UrdfError::DuplicateJoint(joint.name.clone()));
        }
    }

    Ok(())
}

fn check_joint_links(joint: &UrdfJoint, link_names: &HashSet<&str>) -> Result<()> {
    for link in [&joint.parent, &joint.child] {
        if !link_names.contains(link.as_str()) {
            return Err(UrdfError::undefined_link(link, &joint.name));
        }
    }
    Ok(())
}
