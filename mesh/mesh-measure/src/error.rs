//! Error types for measurement operations.

use thiserror::Error;

/// Result type alias for measurement operations.
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Errors that can occur during measurement operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// Matrix operands do not chain.
    #[error(
        "matrix product: the number of columns of the first matrix ({cols}) differs from the number of rows of the second ({rows})"
    )]
    DimensionMismatch {
        /// Columns of the left operand.
        cols: usize,
        /// Rows of the right operand.
        rows: usize,
    },

    /// A buffer is too short for the requested shape or stride.
    #[error("{context}: buffer too short (need {expected}, got {actual})")]
    SizeMismatch {
        /// Operation and buffer involved.
        context: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid measurement parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl MeasureError {
    /// Create an invalid params error.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::InvalidParams(details.into())
    }

    /// Check that `buf` holds at least `expected` values.
    pub(crate) const fn check_len(
        context: &'static str,
        buf_len: usize,
        expected: usize,
    ) -> MeasureResult<()> {
        if buf_len < expected {
            return Err(Self::SizeMismatch {
                context,
                expected,
                actual: buf_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeasureError::DimensionMismatch { cols: 3, rows: 2 };
        assert!(format!("{err}").contains("(3)"));

        let err = MeasureError::invalid_params("bad value");
        assert!(format!("{err}").contains("bad value"));

        let err = MeasureError::check_len("ddot x", 2, 5).unwrap_err();
        assert!(format!("{err}").contains("need 5, got 2"));
    }
}
