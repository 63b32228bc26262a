//! Error types for zone operations.

use thiserror::Error;

/// Result type for zone operations.
pub type ZoneResult<T> = Result<T, ZoneError>;

/// Errors that can occur during zone operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// A seed is not an element of the graph.
    #[error("seed #{position} is {seed}, should be in [0, {count})")]
    SeedOutOfRange {
        /// Position of the seed in the seed list.
        position: usize,
        /// The invalid seed.
        seed: usize,
        /// Number of elements in the graph.
        count: usize,
    },

    /// The adjacency graph references an element it does not have.
    #[error("element {element} has neighbor {neighbor}, graph has {count} elements")]
    InvalidGraph {
        /// Element whose neighbor list is invalid.
        element: usize,
        /// The invalid neighbor id.
        neighbor: i64,
        /// Number of elements in the graph.
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZoneError::SeedOutOfRange {
            position: 2,
            seed: 9,
            count: 4,
        };
        assert_eq!(format!("{err}"), "seed #2 is 9, should be in [0, 4)");
    }
}
