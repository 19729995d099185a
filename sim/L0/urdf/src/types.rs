//! Typed model of a URDF robot description.
//!
//! Links are immutable values produced once by the parser. Everything that
//! inspects or repairs inertial data works on these types and never on the
//! raw XML, with the single exception of the document editor used to
//! persist repaired tensors.

use nalgebra::{Matrix3, Rotation3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrdfError};

/// Unit vector along `v`, or +Z when `v` has (near) zero length.
#[inline]
fn unit_axis_or_z(v: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 1e-10 { v / n } else { Vector3::z() }
}

// ============================================================================
// Origin (Pose)
// ============================================================================

/// The `<origin>` element: a translation and a roll-pitch-yaw rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfOrigin {
    /// Translation in meters.
    pub xyz: Vector3<f64>,
    /// Roll, pitch and yaw in radians.
    pub rpy: Vector3<f64>,
}

impl Default for UrdfOrigin {
    fn default() -> Self {
        Self {
            xyz: Vector3::zeros(),
            rpy: Vector3::zeros(),
        }
    }
}

impl UrdfOrigin {
    /// Origin from a translation and rpy angles.
    #[must_use]
    pub fn new(xyz: Vector3<f64>, rpy: Vector3<f64>) -> Self {
        Self { xyz, rpy }
    }

    /// Create an origin at a position with identity rotation.
    #[must_use]
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), Vector3::zeros())
    }

    /// Set the roll-pitch-yaw angles.
    #[must_use]
    pub fn with_rpy(mut self, roll: f64, pitch: f64, yaw: f64) -> Self {
        self.rpy = Vector3::new(roll, pitch, yaw);
        self
    }

    /// Rotation matrix of the rpy angles.
    ///
    /// URDF composes fixed-axis rotations roll (X), then pitch (Y), then yaw
    /// (Z), so the matrix is `Rz(yaw) * Ry(pitch) * Rx(roll)`.
    #[must_use]
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        Rotation3::from_euler_angles(self.rpy.x, self.rpy.y, self.rpy.z).into_inner()
    }

    /// Whether the rotation part is exactly zero.
    #[must_use]
    pub fn is_axis_aligned(&self) -> bool {
        self.rpy == Vector3::zeros()
    }
}

// ============================================================================
// Inertial Properties
// ============================================================================

/// The six independent entries of a symmetric inertia tensor.
///
/// URDF lists only the upper triangle; the lower triangle is implied, so a
/// tensor assembled from this value is symmetric by construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfInertia {
    /// `Ixx`.
    pub ixx: f64,
    /// `Ixy`.
    pub ixy: f64,
    /// `Ixz`.
    pub ixz: f64,
    /// `Iyy`.
    pub iyy: f64,
    /// `Iyz`.
    pub iyz: f64,
    /// `Izz`.
    pub izz: f64,
}

impl UrdfInertia {
    /// Create a tensor from its entries in URDF attribute order.
    #[must_use]
    pub fn new(ixx: f64, ixy: f64, ixz: f64, iyy: f64, iyz: f64, izz: f64) -> Self {
        Self {
            ixx,
            ixy,
            ixz,
            iyy,
            iyz,
            izz,
        }
    }

    /// Tensor with zero products of inertia.
    #[must_use]
    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Self {
        Self::new(ixx, 0.0, 0.0, iyy, 0.0, izz)
    }

    /// Take the upper triangle of a 3x3 matrix.
    #[must_use]
    pub fn from_matrix(m: &Matrix3<f64>) -> Self {
        Self::new(
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 2)],
        )
    }

    /// Entries as `[ixx, ixy, ixz, iyy, iyz, izz]`.
    #[must_use]
    pub fn entries(&self) -> [f64; 6] {
        [self.ixx, self.ixy, self.ixz, self.iyy, self.iyz, self.izz]
    }
}

/// Inertial properties from the `<inertial>` element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfInertial {
    /// Inertial frame relative to the link frame; `xyz` is the center of mass.
    pub origin: UrdfOrigin,
    /// Mass in kg. May be non-finite or non-positive in a faulty description.
    pub mass: f64,
    /// Inertia tensor about the center of mass.
    pub inertia: UrdfInertia,
}

impl UrdfInertial {
    /// Create inertial properties at the link origin.
    #[must_use]
    pub fn new(mass: f64, inertia: UrdfInertia) -> Self {
        Self {
            origin: UrdfOrigin::default(),
            mass,
            inertia,
        }
    }

    /// Set the inertial frame origin.
    #[must_use]
    pub fn with_origin(mut self, origin: UrdfOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Center of mass in the link frame.
    #[must_use]
    pub fn center_of_mass(&self) -> Vector3<f64> {
        self.origin.xyz
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Geometry shape from the `<geometry>` element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UrdfGeometry {
    /// Box with full side lengths (x, y, z) in meters.
    Box {
        /// Extents along x, y and z.
        size: Vector3<f64>,
    },
    /// Cylinder along the local Z axis.
    Cylinder {
        /// Radius.
        radius: f64,
        /// Length along Z.
        length: f64,
    },
    /// Sphere centered on the origin.
    Sphere {
        /// Radius.
        radius: f64,
    },
    /// External mesh; carries no closed-form inertia.
    Mesh {
        /// Mesh URI as written in the file.
        filename: String,
        /// Per-axis scale, if given.
        scale: Option<Vector3<f64>>,
    },
    /// A `<geometry>` element with no recognized shape.
    Unknown,
}

impl UrdfGeometry {
    /// Box from its three side lengths.
    #[must_use]
    pub fn box_shape(x: f64, y: f64, z: f64) -> Self {
        Self::Box {
            size: Vector3::new(x, y, z),
        }
    }

    /// Cylinder from radius and length.
    #[must_use]
    pub fn cylinder(radius: f64, length: f64) -> Self {
        Self::Cylinder { radius, length }
    }

    /// Sphere from its radius.
    #[must_use]
    pub fn sphere(radius: f64) -> Self {
        Self::Sphere { radius }
    }

    /// Create a mesh geometry without scale.
    #[must_use]
    pub fn mesh(filename: impl Into<String>) -> Self {
        Self::Mesh {
            filename: filename.into(),
            scale: None,
        }
    }

    /// The URDF element name of the shape (`"unknown"` for [`Self::Unknown`]).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Cylinder { .. } => "cylinder",
            Self::Sphere { .. } => "sphere",
            Self::Mesh { .. } => "mesh",
            Self::Unknown => "unknown",
        }
    }
}

// ============================================================================
// Visual and Collision
// ============================================================================

/// A `<visual>` entry of a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfVisual {
    /// `name` attribute, if any.
    pub name: Option<String>,
    /// Shape frame in the link frame.
    pub origin: UrdfOrigin,
    /// Shape.
    pub geometry: UrdfGeometry,
    /// Referenced material name.
    pub material: Option<String>,
}

impl UrdfVisual {
    /// Create an unnamed visual without material.
    #[must_use]
    pub fn new(origin: UrdfOrigin, geometry: UrdfGeometry) -> Self {
        Self {
            name: None,
            origin,
            geometry,
            material: None,
        }
    }
}

/// A `<collision>` entry of a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfCollision {
    /// `name` attribute, if any.
    pub name: Option<String>,
    /// Shape frame in the link frame.
    pub origin: UrdfOrigin,
    /// Shape.
    pub geometry: UrdfGeometry,
}

impl UrdfCollision {
    /// Create an unnamed collision.
    #[must_use]
    pub fn new(origin: UrdfOrigin, geometry: UrdfGeometry) -> Self {
        Self {
            name: None,
            origin,
            geometry,
        }
    }
}

// ============================================================================
// Link
// ============================================================================

/// A `<link>`: one rigid body with its optional inertia and shapes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfLink {
    /// Unique name within the robot.
    pub name: String,
    /// Inertial properties. `None` when the link has no `<inertial>` or when
    /// it lacks a `<mass>` or `<inertia>` child.
    pub inertial: Option<UrdfInertial>,
    /// Visual geometries in document order.
    pub visuals: Vec<UrdfVisual>,
    /// Collision geometries in document order.
    pub collisions: Vec<UrdfCollision>,
}

impl UrdfLink {
    /// Bare link without inertia or shapes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inertial: None,
            visuals: Vec::new(),
            collisions: Vec::new(),
        }
    }

    /// Attach an inertial block.
    #[must_use]
    pub fn with_inertial(mut self, inertial: UrdfInertial) -> Self {
        self.inertial = Some(inertial);
        self
    }

    /// Add a visual geometry.
    #[must_use]
    pub fn with_visual(mut self, visual: UrdfVisual) -> Self {
        self.visuals.push(visual);
        self
    }

    /// Append a collision shape.
    #[must_use]
    pub fn with_collision(mut self, collision: UrdfCollision) -> Self {
        self.collisions.push(collision);
        self
    }

    /// Whether the link carries an inertial block.
    #[must_use]
    pub fn has_inertial(&self) -> bool {
        self.inertial.is_some()
    }

    /// Whether the link has at least one collision geometry.
    #[must_use]
    pub fn has_collision(&self) -> bool {
        !self.collisions.is_empty()
    }
}

// ============================================================================
// Joint
// ============================================================================

/// Kind of a `<joint>`.
///
/// Type strings outside the URDF set are kept verbatim in [`Self::Other`];
/// the inertia analysis never looks at joints, so an exotic joint must not
/// keep a robot from loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UrdfJointType {
    /// Rotation about the axis within limits.
    Revolute,
    /// Unbounded rotation about the axis.
    Continuous,
    /// Translation along the axis.
    Prismatic,
    /// No relative motion. Also used when `type` is absent.
    #[default]
    Fixed,
    /// Free motion in all six degrees of freedom.
    Floating,
    /// Motion in the plane normal to the axis.
    Planar,
    /// Any other `type` value, e.g. `ball`.
    #[cfg_attr(feature = "serde", serde(untagged))]
    Other(String),
}

impl UrdfJointType {
    /// Kind for a `type` attribute value.
    #[must_use]
    pub fn from_attribute(s: &str) -> Self {
        match s {
            "revolute" => Self::Revolute,
            "continuous" => Self::Continuous,
            "prismatic" => Self::Prismatic,
            "fixed" => Self::Fixed,
            "floating" => Self::Floating,
            "planar" => Self::Planar,
            other => Self::Other(other.to_string()),
        }
    }

    /// The `type` attribute spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Revolute => "revolute",
            Self::Continuous => "continuous",
            Self::Prismatic => "prismatic",
            Self::Fixed => "fixed",
            Self::Floating => "floating",
            Self::Planar => "planar",
            Self::Other(kind) => kind,
        }
    }
}

/// The `<limit>` of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJointLimit {
    /// Lowest position.
    pub lower: f64,
    /// Highest position.
    pub upper: f64,
    /// Effort bound.
    pub effort: f64,
    /// Velocity bound.
    pub velocity: f64,
}

/// The `<dynamics>` of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJointDynamics {
    /// Damping.
    pub damping: f64,
    /// Friction.
    pub friction: f64,
}

/// A `<joint>` between a parent and a child link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfJoint {
    /// Unique name within the robot.
    pub name: String,
    /// Kind of motion.
    pub joint_type: UrdfJointType,
    /// Name of the parent link.
    pub parent: String,
    /// Name of the child link.
    pub child: String,
    /// Joint frame in the parent link frame.
    pub origin: UrdfOrigin,
    /// Unit axis in the joint frame, +Z when absent.
    pub axis: Vector3<f64>,
    /// Position, effort and velocity bounds.
    pub limit: Option<UrdfJointLimit>,
    /// Damping and friction.
    pub dynamics: Option<UrdfJointDynamics>,
}

impl UrdfJoint {
    /// Joint at the parent origin with a +Z axis.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        joint_type: UrdfJointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            parent: parent.into(),
            child: child.into(),
            origin: UrdfOrigin::default(),
            axis: Vector3::z(),
            limit: None,
            dynamics: None,
        }
    }

    /// Replace the joint frame.
    #[must_use]
    pub fn with_origin(mut self, origin: UrdfOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Replace the axis; it is normalized.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = unit_axis_or_z(axis);
        self
    }

    /// Attach bounds.
    #[must_use]
    pub fn with_limit(mut self, limit: UrdfJointLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attach damping and friction.
    #[must_use]
    pub fn with_dynamics(mut self, dynamics: UrdfJointDynamics) -> Self {
        self.dynamics = Some(dynamics);
        self
    }
}

// ============================================================================
// Robot
// ============================================================================

/// A parsed `<robot>`: its links and joints in document order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UrdfRobot {
    /// Value of the `name` attribute.
    pub name: String,
    /// Links as declared.
    pub links: Vec<UrdfLink>,
    /// Joints as declared.
    pub joints: Vec<UrdfJoint>,
}

impl UrdfRobot {
    /// Robot without links or joints.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            links: Vec::new(),
            joints: Vec::new(),
        }
    }

    /// Append a link.
    #[must_use]
    pub fn with_link(mut self, link: UrdfLink) -> Self {
        self.links.push(link);
        self
    }

    /// Append a joint.
    #[must_use]
    pub fn with_joint(mut self, joint: UrdfJoint) -> Self {
        self.joints.push(joint);
        self
    }

    /// First link called `name`.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&UrdfLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Get a link by name, failing when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`UrdfError::LinkNotFound`] if no link has this name.
    pub fn require_link(&self, name: &str) -> Result<&UrdfLink> {
        self.link(name)
            .ok_or_else(|| UrdfError::LinkNotFound(name.to_string()))
    }

    /// First joint called `name`.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&UrdfJoint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Link names in document order.
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.name.as_str())
    }

    /// Joint names in document order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|j| j.name.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_origin_default() {
        let origin = UrdfOrigin::default();
        assert_eq!(origin.xyz, Vector3::zeros());
        assert_eq!(origin.rpy, Vector3::zeros());
        assert!(origin.is_axis_aligned());
    }

    #[test]
    fn test_yaw_rotates_x_onto_y() {
        let origin = UrdfOrigin::default().with_rpy(0.0, 0.0, FRAC_PI_2);
        let rotated = origin.rotation_matrix() * Vector3::x();
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rpy_composes_roll_then_pitch_then_yaw() {
        let (roll, pitch, yaw) = (0.3, -0.7, 1.1);
        let origin = UrdfOrigin::default().with_rpy(roll, pitch, yaw);

        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), roll);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), pitch);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), yaw);
        let expected = (rz * ry * rx).into_inner();

        let actual = origin.rotation_matrix();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(actual[(i, j)], expected[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_inertia_matrix_roundtrip_entries() {
        let inertia = UrdfInertia::new(1.0, 0.1, 0.2, 2.0, 0.3, 3.0);
        let m = Matrix3::new(1.0, 0.1, 0.2, 0.1, 2.0, 0.3, 0.2, 0.3, 3.0);
        assert_eq!(UrdfInertia::from_matrix(&m), inertia);
        assert_eq!(inertia.entries(), [1.0, 0.1, 0.2, 2.0, 0.3, 3.0]);
    }

    #[test]
    fn test_geometry_kind() {
        assert_eq!(UrdfGeometry::box_shape(1.0, 1.0, 1.0).kind(), "box");
        assert_eq!(UrdfGeometry::cylinder(0.1, 1.0).kind(), "cylinder");
        assert_eq!(UrdfGeometry::sphere(0.1).kind(), "sphere");
        assert_eq!(UrdfGeometry::mesh("arm.stl").kind(), "mesh");
        assert_eq!(UrdfGeometry::Unknown.kind(), "unknown");
    }

    #[test]
    fn test_joint_type_from_attribute() {
        assert_eq!(
            UrdfJointType::from_attribute("revolute"),
            UrdfJointType::Revolute
        );
        assert_eq!(UrdfJointType::from_attribute("fixed"), UrdfJointType::Fixed);
        assert_eq!(
            UrdfJointType::from_attribute("ball"),
            UrdfJointType::Other("ball".into())
        );
        assert_eq!(UrdfJointType::from_attribute("ball").as_str(), "ball");
        assert_eq!(UrdfJointType::Prismatic.as_str(), "prismatic");
        assert_eq!(UrdfJointType::default(), UrdfJointType::Fixed);
    }

    #[test]
    fn test_joint_axis_normalized() {
        let joint = UrdfJoint::new("j", UrdfJointType::Revolute, "a", "b")
            .with_axis(Vector3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(joint.axis.y, 1.0, epsilon = 1e-12);

        let degenerate =
            UrdfJoint::new("j", UrdfJointType::Revolute, "a", "b").with_axis(Vector3::zeros());
        assert_eq!(degenerate.axis, Vector3::z());
    }

    #[test]
    fn test_robot_lookup() {
        let robot = UrdfRobot::new("test_robot")
            .with_link(UrdfLink::new("base_link"))
            .with_link(UrdfLink::new("link1"))
            .with_joint(UrdfJoint::new(
                "joint1",
                UrdfJointType::Revolute,
                "base_link",
                "link1",
            ));

        assert!(robot.link("base_link").is_some());
        assert!(robot.joint("joint1").is_some());
        assert_eq!(robot.link_names().collect::<Vec<_>>(), ["base_link", "link1"]);
        assert!(robot.require_link("link1").is_ok());
        assert!(matches!(
            robot.require_link("ghost"),
            Err(UrdfError::LinkNotFound(name)) if name == "ghost"
        ));
    }
}
