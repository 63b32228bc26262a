//! Unstructured finite-element meshes.
//!
//! A [`UMesh`] holds cells of one topological dimension over a shared
//! coordinate array ([`PointSet`]). On top of the nodal connectivity this
//! crate derives the other relations and repairs what mesh generators get
//! wrong:
//!
//! - **Descending connectivity**: faces or edges shared between cells,
//!   skins, boundaries and neighbor graphs
//! - **Equality**: cell comparison policies and duplicate cell detection
//! - **Orientation**: detection and repair of inverted polygons, extruded
//!   cells, tetrahedra, pyramids and polyhedra
//! - **Renumbering**: node merging, coordinate zipping, cell permutation
//! - **Simplification and splitting**: degenerated cells, poly types,
//!   simplices, tetrahedra, quadratic conversion
//! - **Location and geometry**: point location, distances, measures,
//!   centers and quality fields
//!
//! Node and cell ids are `i64` inside connectivity arrays, with `-1` as the
//! polyhedron face separator; counts and positions are `usize`.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Coords, GeometricType};
//! use mesh_unstructured::UMesh;
//!
//! // two unit squares side by side
//! let mut mesh = UMesh::new(2);
//! mesh.set_coords(
//!     Coords::new(vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0], 2).unwrap(),
//! );
//! mesh.allocate_cells(2);
//! mesh.insert_next_cell(GeometricType::Quad4, &[0, 1, 4, 3]).unwrap();
//! mesh.insert_next_cell(GeometricType::Quad4, &[1, 2, 5, 4]).unwrap();
//! mesh.finish_inserting_cells();
//!
//! let neighbors = mesh.compute_neighbors_of_cells().unwrap();
//! assert_eq!(neighbors.group(0), &[1]);
//! assert_eq!(mesh.measure_field(false).unwrap(), vec![1.0, 1.0]);
//! ```
//!
//! # Features
//!
//! - `parallel`: `CellLocator::build_parallel` builds the tree with rayon

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod descending;
mod equality;
mod geometry;
mod locate;
mod neighbors;
mod nodes;
mod orientation;
mod params;
mod point_set;
mod quadratic;
mod simplify;
mod split;
mod umesh;
mod zip;

pub use descending::Descending;
pub use equality::are_cells_equal;
pub use locate::CellLocator;
pub use orientation::{
    correct_extruded_static_cell, is_3d_extruded_static_cell_well_oriented, is_polygon_well_oriented,
    is_polyhedron_well_oriented, polyhedron_signed_volume, try_to_correct_polyhedron_orientation,
};
pub use params::{
    CellComparePolicy, CellEquality, DescendingNumbering, LocatorParams, OrientationParams,
    QuadraticConversion, SimplexizePolicy, SplittingPolicy,
};
pub use point_set::PointSet;
pub use umesh::{CellRef, ConnectivityState, UMesh};

pub use mesh_zones::{SpreadConfig, SpreadZone};
