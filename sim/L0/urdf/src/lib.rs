//! URDF robot description model and tooling.
//!
//! This crate reads [URDF](http://wiki.ros.org/urdf) (Unified Robot
//! Description Format) documents into typed, immutable values and provides
//! the pieces that inertia analysis and repair build on.
//!
//! # Features
//!
//! - Parse URDF XML from files or strings
//! - Kinematic tree queries and structural validation
//! - Targeted editing of `<inertial>` blocks that leaves the rest of the
//!   document untouched
//! - `%g`-style number formatting for writing values back
//!
//! # Example
//!
//! ```
//! use sim_urdf::{parse_urdf_str, KinematicTree};
//!
//! let urdf = r#"
//!     <robot name="pendulum">
//!         <link name="base"/>
//!         <link name="bob">
//!             <inertial>
//!                 <origin xyz="0 0 -1"/>
//!                 <mass value="1.0"/>
//!                 <inertia ixx="0.004" iyy="0.004" izz="0.004"/>
//!             </inertial>
//!             <collision>
//!                 <origin xyz="0 0 -1"/>
//!                 <geometry><sphere radius="0.1"/></geometry>
//!             </collision>
//!         </link>
//!         <joint name="hinge" type="continuous">
//!             <parent link="base"/>
//!             <child link="bob"/>
//!             <axis xyz="0 1 0"/>
//!         </joint>
//!     </robot>
//! "#;
//!
//! let robot = parse_urdf_str(urdf).expect("should parse");
//! assert_eq!(robot.name, "pendulum");
//! assert!(robot.link("bob").is_some_and(|l| l.has_inertial()));
//!
//! let tree = KinematicTree::from_robot(&robot);
//! assert_eq!(tree.root(), Some("base"));
//! assert_eq!(tree.joint_for("bob"), Some("hinge"));
//! ```
//!
//! # Supported URDF Elements
//!
//! - `<link>` with `<inertial>`, `<visual>` and `<collision>`
//! - `<joint>` of type `fixed`, `revolute`, `continuous`, `prismatic`,
//!   `floating` or `planar`, with `<origin>`, `<axis>`, `<limit>` and
//!   `<dynamics>`; a missing `type` reads as `fixed` and any other value is
//!   kept as [`UrdfJointType::Other`]
//! - `<box>`, `<cylinder>`, `<sphere>` and `<mesh>` geometry; any other
//!   shape is kept as [`UrdfGeometry::Unknown`]
//!
//! `<material>` definitions, `<gazebo>` and `<transmission>` blocks are
//! skipped.
//!
//! # Tolerance
//!
//! An `<inertial>` that lacks either `<mass>` or `<inertia>` is treated as
//! absent. A `<visual>` or `<collision>` that cannot be read is dropped with
//! a warning instead of failing the whole document.

#![doc(html_root_url = "https://docs.rs/sim-urdf/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]

mod document;
mod error;
mod parser;
mod tree;
mod types;

pub use document::{format_significant, InertialEdit, UrdfDocument, WRITE_PRECISION};
pub use error::{Result, UrdfError};
pub use parser::{load_urdf_file, parse_urdf_str};
pub use tree::{validate_structure, KinematicTree};
pub use types::{
    UrdfCollision, UrdfGeometry, UrdfInertia, UrdfInertial, UrdfJoint, UrdfJointDynamics,
    UrdfJointLimit, UrdfJointType, UrdfLink, UrdfOrigin, UrdfRobot, UrdfVisual,
};
