//! Command-line front end for URDF inertia checks.
//!
//! The `physcheck` binary resolves a robot description, runs the
//! [`sim_inertia`] checks on it and either prints the report, prints the
//! kinematic tree with per-link status, or writes a repaired copy. This
//! library holds the parts of the tool that do not touch process state:
//!
//! - [`resolve`]: target names and directories to URDF paths
//! - [`prompt`]: yes/no and numbered-choice questions over any stream
//! - [`layout`] and [`scene`]: renderer-independent tree description
//! - [`report`]: terminal output
//!
//! # Example
//!
//! ```
//! use sim_inertia::summarize;
//! use sim_physcheck::{build_tree_scene, compute_tree_layout};
//! use sim_urdf::{parse_urdf_str, KinematicTree};
//!
//! let robot = parse_urdf_str(r#"
//!     <robot name="pendulum">
//!       <link name="world"/>
//!       <link name="bob">
//!         <inertial>
//!           <mass value="1"/>
//!           <inertia ixx="0.1" iyy="0.1" izz="0.1"/>
//!         </inertial>
//!       </link>
//!       <joint name="hinge" type="continuous">
//!         <parent link="world"/>
//!         <child link="bob"/>
//!       </joint>
//!     </robot>
//! "#).unwrap();
//!
//! let tree = KinematicTree::from_robot(&robot);
//! let layout = compute_tree_layout(&tree);
//! let scene = build_tree_scene(&robot, &tree, &layout, &summarize(&robot.links));
//!
//! assert_eq!(scene.metadata.base_link.as_deref(), Some("world"));
//! assert_eq!(scene.node("bob").unwrap().position.y, -1.0);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-physcheck/0.7.0")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod error;
pub mod layout;
pub mod prompt;
pub mod report;
pub mod resolve;
pub mod scene;

pub use error::{ResolveError, Result};
pub use layout::{compute_tree_layout, NodePosition, TreeLayout, NODE_SPACING};
pub use prompt::Prompter;
pub use report::{write_check_report, write_rewrite_report, write_tree};
pub use resolve::{directory_urdfs, list_robot_urdfs, resolve_urdf_path};
pub use scene::{
    build_tree_scene, format_failure, NodePayload, NodeShape, NodeStyle, SceneEdge,
    SceneMetadata, SceneNode, StatusEntry, StatusTag, TreeScene,
};
