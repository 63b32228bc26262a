//! Unstructured mesh connectivity and geometry toolkit.
//!
//! This umbrella crate re-exports all mesh-* crates, providing a unified API
//! for finite-element mesh processing. All crates are Layer 0 (zero Bevy
//! dependencies) and can be used in CLI tools, solvers or servers.
//!
//! # Quick Start
//!
//! ```
//! use mesh::prelude::*;
//!
//! // a unit square split in two triangles, one of them inverted
//! let mut m = UMesh::new(2);
//! m.set_coords(Coords::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0], 3).unwrap());
//! m.allocate_cells(2);
//! m.insert_next_cell(GeometricType::Tri3, &[0, 1, 2]).unwrap();
//! m.insert_next_cell(GeometricType::Tri3, &[0, 3, 2]).unwrap();
//! m.finish_inserting_cells();
//!
//! // repair orientation, then look at the skin
//! let fixed = m.orient_correctly_2d_cells(&[0.0, 0.0, 1.0], false).unwrap();
//! assert_eq!(fixed, vec![1]);
//! assert_eq!(m.compute_skin().unwrap().number_of_cells().unwrap(), 4);
//! ```
//!
//! # Module Organization
//!
//! ## Foundation
//! - [`types`] - Coordinates, cell types, indexed arrays, bounding boxes, errors
//! - [`measure`] - Dense linear algebra, oriented boxes, element quality metrics
//!
//! ## Connectivity
//! - [`unstructured`] - The `UMesh` cell container and everything derived from
//!   its nodal connectivity
//! - [`zones`] - Spread zones and connected components over neighbor graphs
//!
//! ## Topology Changes
//! - [`crack`] - Crack insertion along a face group and crack opening
//!
//! # Feature Flags
//!
//! - `serde` - Serialization of the foundation types
//! - `parallel` - Parallel construction of the cell locator

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Coordinates, cell types, indexed arrays, bounding boxes.
pub use mesh_types as types;

/// Linear algebra helpers, oriented bounding boxes, quality metrics.
pub use mesh_measure as measure;

/// Spread zones and connected components.
pub use mesh_zones as zones;

/// Unstructured meshes: connectivity, orientation, splitting, location.
pub use mesh_unstructured as unstructured;

/// Crack insertion and opening.
pub use mesh_crack as crack;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for mesh processing.
///
/// This module re-exports the most commonly used types and traits.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{
        Aabb, Coords, GeometricType, IndexedArray, MeshError, MeshResult, SharedCoords,
    };

    // Meshes and their policies
    pub use mesh_unstructured::{
        CellComparePolicy, CellLocator, DescendingNumbering, LocatorParams, PointSet,
        SplittingPolicy, UMesh,
    };

    // Cracks
    pub use mesh_crack::{CrackOutcome, CrackParams, crack_along, open_crack};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let mesh = UMesh::new(3);
        assert_eq!(mesh.mesh_dimension().unwrap(), 3);
        assert!(mesh.number_of_cells().is_err());
        assert!(CrackParams::default().group_must_be_fully_duplicated);
    }

    #[test]
    fn test_module_reexports() {
        let _ = types::IndexedArray::new();
        let _ = unstructured::OrientationParams::default();
        let _ = zones::SpreadConfig::default();
        let _ = crack::CrackOutcome::default();
    }
}
