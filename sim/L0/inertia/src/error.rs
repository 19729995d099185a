//! Error types for inertia repair.
//!
//! The checks themselves never fail; only the rewriter, which reads and
//! writes files, has error paths.

use std::path::PathBuf;

use sim_urdf::UrdfError;
use thiserror::Error;

/// Result type alias for inertia operations.
pub type InertiaResult<T> = Result<T, InertiaError>;

/// Errors that can occur while repairing inertias.
#[derive(Debug, Error)]
pub enum InertiaError {
    /// The URDF could not be read, parsed or edited.
    #[error(transparent)]
    Urdf(#[from] UrdfError),

    /// Writing the output file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No link fails a check at the requested severities.
    #[error("No links with failing checks at requested severities.")]
    NoQualifyingLinks,

    /// Every selected link was skipped.
    #[error("No links were updated. Reasons: {}", format_reasons(.reasons))]
    NoLinksUpdated {
        /// Link name and skip reason, in model order.
        reasons: Vec<(String, String)>,
    },

    /// The destination is the source file.
    #[error("refusing to overwrite the source file {0}")]
    OutputOverwritesSource(PathBuf),
}

impl InertiaError {
    /// Create a write error.
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

fn format_reasons(reasons: &[(String, String)]) -> String {
    if reasons.is_empty() {
        return "none".to_string();
    }
    reasons
        .iter()
        .map(|(link, reason)| format!("{link} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InertiaError::NoQualifyingLinks;
        assert_eq!(
            err.to_string(),
            "No links with failing checks at requested severities."
        );

        let err = InertiaError::NoLinksUpdated {
            reasons: vec![
                ("base".into(), "missing or non-positive mass".into()),
                ("arm".into(), "unsupported geometry type for collision: mesh".into()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "No links were updated. Reasons: base (missing or non-positive mass), \
             arm (unsupported geometry type for collision: mesh)"
        );

        let err = InertiaError::NoLinksUpdated { reasons: vec![] };
        assert!(err.to_string().ends_with("Reasons: none"));
    }

    #[test]
    fn test_urdf_error_is_transparent() {
        let err = InertiaError::from(UrdfError::LinkNotFound("arm".into()));
        assert_eq!(err.to_string(), "link not found: arm");
    }
}
