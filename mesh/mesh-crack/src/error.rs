//! Error types for crack insertion.

use mesh_types::MeshError;
use thiserror::Error;

/// Result type for crack operations.
pub type CrackResult<T> = Result<T, CrackError>;

/// Errors that can occur while cracking a mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrackError {
    /// The two meshes are not consecutive levels over the same coordinates.
    #[error("level mismatch: {0}")]
    LevelMismatch(String),

    /// Faces of the crack group are not faces of the volume mesh.
    #[error("{context}: {missing} face(s) not found among the cell faces")]
    NotIncluded {
        /// Which inclusion failed.
        context: String,
        /// Number of faces without a match.
        missing: usize,
    },

    /// A crack face is not shared by exactly two cells.
    #[error("crack face {face} has {owners} owner cell(s), expected 2")]
    NotInnerFace {
        /// Face id in the face mesh.
        face: usize,
        /// Number of cells owning it.
        owners: usize,
    },

    /// A crack face kept all of its nodes on both sides.
    #[error("crack face {face} is not duplicated, its nodes stay shared")]
    NotDuplicated {
        /// Face id in the face mesh.
        face: usize,
    },

    /// The two cells around a face disagree on a renumbered node.
    #[error("face {face} gets incoherent new ids for node {node} from its two cells")]
    IncoherentConnectivity {
        /// Face id in the face mesh.
        face: usize,
        /// Node whose new id differs between the two sides.
        node: i64,
    },

    /// Opening factor outside `(0, 1)`.
    #[error("opening factor {0} should be in (0, 1)")]
    InvalidFactor(f64),

    /// Error raised by the underlying mesh.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl CrackError {
    /// Create a level mismatch error.
    pub fn level_mismatch(reason: impl Into<String>) -> Self {
        Self::LevelMismatch(reason.into())
    }

    /// Create an inclusion error.
    pub fn not_included(context: impl Into<String>, missing: usize) -> Self {
        Self::NotIncluded {
            context: context.into(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CrackError::NotInnerFace { face: 4, owners: 1 };
        assert_eq!(
            format!("{err}"),
            "crack face 4 has 1 owner cell(s), expected 2"
        );
        let err = CrackError::not_included("crack group", 3);
        assert!(format!("{err}").contains("3 face(s)"));
    }

    #[test]
    fn test_mesh_error_is_transparent() {
        let inner = MeshError::invalid_argument("bad");
        let err = CrackError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}
