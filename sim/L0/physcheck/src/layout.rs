//! Top-down placement of kinematic tree nodes.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use sim_urdf::KinematicTree;

/// Horizontal distance between siblings on one level.
pub const NODE_SPACING: f64 = 1.5;

/// Position of a node in layout units; depth grows downward along -y.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodePosition {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate, `-depth`.
    pub y: f64,
}

impl NodePosition {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node positions keyed by link name.
pub type TreeLayout = HashMap<String, NodePosition>;

/// Place every link reachable from the root.
///
/// Links are grouped by breadth-first depth. A lone link sits on x = 0;
/// several links on one level are spread [`NODE_SPACING`] apart and
/// centered on x = 0, in visiting order.
#[must_use]
pub fn compute_tree_layout(tree: &KinematicTree) -> TreeLayout {
    let mut levels: Vec<Vec<&str>> = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = tree.root().map(|r| (r, 0)).into_iter().collect();

    while let Some((link, depth)) = queue.pop_front() {
        if !seen.insert(link) {
            continue;
        }
        if levels.len() <= depth {
            levels.resize_with(depth + 1, Vec::new);
        }
        levels[depth].push(link);
        for child in tree.children_of(link) {
            queue.push_back((child.as_str(), depth + 1));
        }
    }

    let mut positions = TreeLayout::new();
    for (depth, links) in levels.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let (y, count) = (0.0 - depth as f64, links.len() as f64);
        let offset = -(count - 1.0) * NODE_SPACING / 2.0;
        for (i, link) in links.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = offset + i as f64 * NODE_SPACING;
            positions.insert((*link).to_string(), NodePosition::new(x, y));
        }
    }
    positions
}
