//! Error types for URDF parsing, tree validation and document editing.

use thiserror::Error;

/// Everything that can go wrong reading, validating or editing a robot
/// description.
#[derive(Debug, Error)]
pub enum UrdfError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    XmlParse(String),

    /// An edited document could not be serialized.
    #[error("failed to write XML: {0}")]
    XmlWrite(String),

    /// A child element the format requires is absent.
    #[error("<{element}> is required in {context}")]
    MissingElement {
        /// Tag of the absent element.
        element: &'static str,
        /// Enclosing element, e.g. `link 'base'`.
        context: String,
    },

    /// An attribute the format requires is absent.
    #[error("attribute '{attribute}' is required on {element}")]
    MissingAttribute {
        /// Name of the absent attribute.
        attribute: &'static str,
        /// Element that lacks it.
        element: String,
    },

    /// An attribute is present but its value cannot be used.
    #[error("bad '{attribute}' on {element}: {message}")]
    InvalidAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Element carrying the attribute.
        element: String,
        /// What is wrong with the value.
        message: String,
    },

    /// Lookup of a link that does not exist in the model.
    #[error("link not found: {0}")]
    LinkNotFound(String),

    /// A joint names a link the robot does not declare.
    #[error("joint '{joint_name}' refers to undeclared link '{link_name}'")]
    UndefinedLink {
        /// The undeclared link.
        link_name: String,
        /// Joint holding the reference.
        joint_name: String,
    },

    /// Two links share a name.
    #[error("link '{0}' is declared more than once")]
    DuplicateLink(String),

    /// Two joints share a name.
    #[error("joint '{0}' is declared more than once")]
    DuplicateJoint(String),

    /// The joints do not form a tree below the root.
    #[error("joints do not form a tree: {0}")]
    KinematicLoop(String),

    /// Every link is the child of some joint.
    #[error("robot has no root link")]
    NoRootLink,

    /// More than one link is nobody's child.
    #[error("robot has several root links: {}", .0.join(", "))]
    MultipleRootLinks(Vec<String>),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UrdfError {
    /// [`Self::MissingElement`] for `element` inside `context`.
    pub fn missing_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }

    /// [`Self::MissingAttribute`] for `attribute` on `element`.
    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
        }
    }

    /// [`Self::InvalidAttribute`] with a reason.
    pub fn invalid_attribute(
        attribute: &'static str,
        element: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute,
            element: element.into(),
            message: message.into(),
        }
    }

    /// [`Self::UndefinedLink`] for a joint referring to `link_name`.
    pub fn undefined_link(link_name: impl Into<String>, joint_name: impl Into<String>) -> Self {
        Self::UndefinedLink {
            link_name: link_name.into(),
            joint_name: joint_name.into(),
        }
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, UrdfError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            UrdfError::missing_element("geometry", "collision in link 'base'").to_string(),
            "<geometry> is required in collision in link 'base'"
        );
        assert_eq!(
            UrdfError::invalid_attribute("value", "mass", "expected a number").to_string(),
            "bad 'value' on mass: expected a number"
        );
        assert_eq!(
            UrdfError::LinkNotFound("forearm".into()).to_string(),
            "link not found: forearm"
        );
        assert_eq!(
            UrdfError::undefined_link("ghost", "elbow").to_string(),
            "joint 'elbow' refers to undeclared link 'ghost'"
        );
        assert_eq!(
            UrdfError::MultipleRootLinks(vec!["a".into(), "b".into()]).to_string(),
            "robot has several root links: a, b"
        );
    }
}
