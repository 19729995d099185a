//! Error types for target resolution and prompting.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning a command-line target into a URDF path.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A directory target holds no URDF files.
    #[error("No URDF files found under {}", .0.display())]
    NoUrdfFiles(PathBuf),

    /// No robot directory matches the requested name.
    #[error("Robot '{target}' not found under {}.", root.display())]
    RobotNotFound {
        /// Name as typed by the user.
        target: String,
        /// Robots directory that was searched.
        root: PathBuf,
    },

    /// The robots directory holds no robot with a URDF.
    #[error("No robots found under {}.", .0.display())]
    NoRobots(PathBuf),

    /// A selection was requested from an empty list.
    #[error("No options available for selection.")]
    NoOptions,

    /// Interactive input ended before a valid answer.
    #[error("input closed before a selection was made")]
    InputClosed,

    /// I/O error while listing directories or prompting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Create a robot-not-found error.
    pub fn robot_not_found(target: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self::RobotNotFound {
            target: target.into(),
            root: root.into(),
        }
    }
}

/// Result type for resolution.
pub type Result<T> = std::result::Result<T, ResolveError>;
