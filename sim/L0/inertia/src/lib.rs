//! Physical plausibility checks for URDF link inertias.
//!
//! Every link with an `<inertial>` block runs through a fixed battery of
//! checks: the mass must be finite and positive, the tensor positive
//! definite, its principal moments must satisfy the triangle inequality
//! and stay within a bounded spread, and when a primitive collision shape
//! is available the moments are compared with a uniform-density estimate.
//! Failing links can be repaired by replacing their tensor with that
//! estimate.
//!
//! # Layer 0 Crate
//!
//! Pure computation over [`sim_urdf`] values, no rendering dependencies.
//! The check engine holds no state and is safe to call from many threads.
//!
//! # Example
//!
//! ```
//! use sim_inertia::{evaluate, CheckKind};
//! use sim_urdf::{UrdfInertia, UrdfInertial, UrdfLink};
//!
//! // Principal moments (1, 1, 3) cannot belong to a rigid body.
//! let link = UrdfLink::new("forearm")
//!     .with_inertial(UrdfInertial::new(1.0, UrdfInertia::diagonal(1.0, 1.0, 3.0)));
//!
//! let checks = evaluate(&link);
//! let triangle = checks
//!     .iter()
//!     .find(|c| c.kind == CheckKind::TriangleInequality)
//!     .expect("always evaluated");
//! assert!(!triangle.passed);
//! ```
//!
//! # Checks
//!
//! | Check | Failure severity |
//! |-------|------------------|
//! | `inertial_present` | warning |
//! | `mass_finite` | error |
//! | `mass_positive` | error |
//! | `zero_mass_inertia` | error |
//! | `positive_definite` | error |
//! | `triangle_inequality` | error |
//! | `eigenvalue_ratio` | warning |
//! | `geometry_consistency` | warning |

#![doc(html_root_url = "https://docs.rs/sim-inertia/0.7.0")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::similar_names,
    clippy::many_single_char_names,
    clippy::float_cmp
)]

mod check;
mod error;
mod estimate;
mod evaluate;
mod params;
mod rewrite;
mod summary;
mod tensor;

pub use check::{worst_failure, CheckDetails, CheckKind, DetailValue, InertiaCheck, Severity};
pub use error::{InertiaError, InertiaResult};
pub use estimate::{estimate_principal_inertia, InertiaEstimate};
pub use evaluate::{evaluate, evaluate_with};
pub use params::CheckParams;
pub use rewrite::{
    collect_problem_links, default_output_path, fix_inertias, link_frame_inertia, pick_geometry,
    plan_rewrite, GeometrySource, RewriteOptions, RewritePlan, RewriteReport, SkipReason,
    SANITIZE_TOLERANCE,
};
pub use summary::{summarize, summarize_with, CheckCounts, InertiaSummary};
pub use tensor::{inertia_matrix, rotate_principal, rpy_rotation, sanitize, sorted_eigenvalues};
