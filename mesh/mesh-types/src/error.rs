//! Error types shared by every unstructured-mesh operation.

use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while building, querying or editing a mesh.
///
/// Every variant carries enough context (the offending id, the expected
/// size) to locate the problem inside a large production mesh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Coordinates or connectivity were never set.
    #[error("{what} not set")]
    NotConfigured {
        /// What is missing ("coordinates", "connectivity", ...).
        what: &'static str,
    },

    /// A topological or space dimension disagrees with the expected one.
    #[error("{context}: dimension mismatch (expected {expected}, got {actual})")]
    DimensionMismatch {
        /// Operation and entity involved.
        context: String,
        /// Expected dimension.
        expected: i64,
        /// Dimension actually found.
        actual: i64,
    },

    /// A fixed-size structure received the wrong length.
    #[error("{context}: size mismatch (expected {expected}, got {actual})")]
    SizeMismatch {
        /// Operation and entity involved.
        context: String,
        /// Expected length.
        expected: usize,
        /// Length actually found.
        actual: usize,
    },

    /// A node or cell id lies outside its valid domain.
    #[error("{context}: id {id} out of range [0, {bound})")]
    OutOfRange {
        /// Operation and entity involved.
        context: String,
        /// The offending id.
        id: i64,
        /// Exclusive upper bound of the valid domain.
        bound: usize,
    },

    /// A degenerate input makes the requested operation ill-posed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An orientation repair could not reach a consistent state.
    #[error("cell {cell}: irreparable geometry: {reason}")]
    IrreparableGeometry {
        /// The cell that could not be repaired.
        cell: usize,
        /// What went wrong.
        reason: String,
    },

    /// A requested combination is intentionally unhandled.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A connectivity slice carries an unknown geometric type code.
    #[error("unknown geometric type code {0}")]
    UnknownCellType(i64),
}

impl MeshError {
    /// Create a not-configured error.
    #[must_use]
    pub const fn not_configured(what: &'static str) -> Self {
        Self::NotConfigured { what }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(context: impl Into<String>, expected: i64, actual: i64) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create a size mismatch error.
    #[must_use]
    pub fn size_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Create an out-of-range error.
    #[must_use]
    pub fn out_of_range(context: impl Into<String>, id: i64, bound: usize) -> Self {
        Self::OutOfRange {
            context: context.into(),
            id,
            bound,
        }
    }

    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(details: impl Into<String>) -> Self {
        Self::InvalidArgument(details.into())
    }

    /// Create an irreparable geometry error.
    #[must_use]
    pub fn irreparable(cell: usize, reason: impl Into<String>) -> Self {
        Self::IrreparableGeometry {
            cell,
            reason: reason.into(),
        }
    }

    /// Create a not-implemented error.
    #[must_use]
    pub fn not_implemented(details: impl Into<String>) -> Self {
        Self::NotImplemented(details.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::not_configured("coordinates");
        assert_eq!(format!("{err}"), "coordinates not set");

        let err = MeshError::out_of_range("cell 4", 12, 9);
        let msg = format!("{err}");
        assert!(msg.contains("cell 4"));
        assert!(msg.contains("12"));

        let err = MeshError::size_mismatch("insert_next_cell(QUAD4)", 4, 3);
        assert!(format!("{err}").contains("expected 4, got 3"));

        let err = MeshError::irreparable(7, "non manifold edge");
        assert!(format!("{err}").starts_with("cell 7"));
    }
}
