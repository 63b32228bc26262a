//! Tunables and policy enums for mesh operations.

use mesh_types::{MeshError, MeshResult};

/// Parameters for orientation checks and repair.
///
/// # Example
///
/// ```
/// use mesh_unstructured::OrientationParams;
///
/// let params = OrientationParams::default().with_polyhedron_eps(1e-10);
/// assert_eq!(params.polyhedron_eps, 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationParams {
    /// Most negative signed volume still accepted for a polyhedron.
    ///
    /// Default: `1e-14`
    pub polyhedron_eps: f64,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            polyhedron_eps: 1e-14,
        }
    }
}

impl OrientationParams {
    /// Reject any negative polyhedron volume.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            polyhedron_eps: 0.0,
        }
    }

    /// Set the polyhedron volume tolerance.
    #[must_use]
    pub const fn with_polyhedron_eps(mut self, eps: f64) -> Self {
        self.polyhedron_eps = eps;
        self
    }
}

/// Parameters for building a [`CellLocator`](crate::CellLocator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorParams {
    /// Maximum number of cells stored in a leaf.
    ///
    /// Default: `8`
    pub max_leaf_size: usize,

    /// Absolute margin added to every cell box when the tree is built.
    ///
    /// Default: `1e-12`
    pub precision: f64,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            max_leaf_size: 8,
            precision: 1e-12,
        }
    }
}

impl LocatorParams {
    /// Set the leaf size.
    #[must_use]
    pub const fn with_max_leaf_size(mut self, size: usize) -> Self {
        self.max_leaf_size = size;
        self
    }

    /// Set the cell box margin.
    #[must_use]
    pub const fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }
}

/// How two cells are compared.
///
/// The numeric codes are the historical policy numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellComparePolicy {
    /// Same type and identical node sequence.
    Exact,
    /// Same type and one node ring is a rotation of the other.
    PermutedSameOrientation,
    /// Same type and same node set.
    Nodal,
    /// Same node set, type ignored.
    NodalNoType,
    /// Same type and one node ring is a rotation of the other or of its
    /// reverse.
    PermutedAnyOrientation,
}

impl CellComparePolicy {
    /// Policy from its historical code (0, 1, 2, 3 or 7).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidArgument`] for any other code.
    pub fn from_code(code: i32) -> MeshResult<Self> {
        match code {
            0 => Ok(Self::Exact),
            1 => Ok(Self::PermutedSameOrientation),
            2 => Ok(Self::Nodal),
            3 => Ok(Self::NodalNoType),
            7 => Ok(Self::PermutedAnyOrientation),
            other => Err(MeshError::invalid_argument(format!(
                "unknown cell comparison policy {other}, expected 0, 1, 2, 3 or 7"
            ))),
        }
    }

    /// Historical code of the policy.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Exact => 0,
            Self::PermutedSameOrientation => 1,
            Self::Nodal => 2,
            Self::NodalNoType => 3,
            Self::PermutedAnyOrientation => 7,
        }
    }
}

/// Outcome of a cell comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellEquality {
    /// The cells differ.
    NotEqual,
    /// Equal with the same orientation.
    Same,
    /// Equal with opposite orientations.
    Reversed,
}

impl CellEquality {
    /// Whether the cells were found equal.
    #[must_use]
    pub const fn is_equal(self) -> bool {
        !matches!(self, Self::NotEqual)
    }
}

/// Numbering of the descending connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DescendingNumbering {
    /// Sub-entity ids as is.
    #[default]
    Plain,
    /// `id + 1`, negated when the cell runs over the sub-entity backwards.
    OrientationSensitive,
}

/// How [`UMesh::simplexize`](crate::UMesh::simplexize) cuts cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimplexizePolicy {
    /// Quadrangles cut along the 0-2 diagonal.
    Pol0,
    /// Quadrangles cut along the 1-3 diagonal.
    Pol1,
    /// Hexahedra cut into 5 tetrahedra.
    PlanarFace5,
    /// Hexahedra cut into 6 tetrahedra.
    PlanarFace6,
}

/// How [`UMesh::tetrahedrize`](crate::UMesh::tetrahedrize) cuts hexahedra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SplittingPolicy {
    /// 5 tetrahedra, no new node.
    PlanarFace5,
    /// 6 tetrahedra, no new node.
    #[default]
    PlanarFace6,
    /// 24 tetrahedra over face and cell centers.
    General24,
    /// 48 tetrahedra over edge, face and cell centers.
    General48,
}

/// Target of a linear to quadratic conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuadraticConversion {
    /// Mid-edge nodes only (`TRI6`, `QUAD8`, `HEXA20`, ...).
    #[default]
    Minimal,
    /// Mid-edge nodes plus face and volume centers (`TRI7`, `QUAD9`,
    /// `HEXA27`, ...).
    Rich,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_codes() {
        for code in [0, 1, 2, 3, 7] {
            assert_eq!(CellComparePolicy::from_code(code).unwrap().code(), code);
        }
        assert!(CellComparePolicy::from_code(4).is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(OrientationParams::default().polyhedron_eps, 1e-14);
        assert_eq!(LocatorParams::default().max_leaf_size, 8);
        assert_eq!(SplittingPolicy::default(), SplittingPolicy::PlanarFace6);
    }
}
