//! Core data model for unstructured meshes.
//!
//! This crate provides the foundational types shared by the mesh crates:
//!
//! - [`IndexedArray`] - Ragged array (flat values + offsets) used for every
//!   connectivity relation
//! - [`GeometricType`] - Closed set of cell types with their reference models
//! - [`Coords`] / [`SharedCoords`] - Node coordinates and their shared handle
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`MeshError`] - Error taxonomy of every mesh operation
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Python bindings
//!
//! # Connectivity format
//!
//! A cell is stored as `[type code, node0, node1, ...]`. Polyhedra list their
//! faces one after the other, separated by [`FACE_SEPARATOR`] (`-1`). Ids are
//! `i64` so that `-1` can mark a separator or a removed entity; counts and
//! positions are `usize`.
//!
//! # Example
//!
//! ```
//! use mesh_types::{GeometricType, IndexedArray};
//!
//! let mut conn = IndexedArray::new();
//! conn.push_group([GeometricType::Tri3.code(), 0, 1, 2]);
//! conn.push_group([GeometricType::Quad4.code(), 1, 3, 4, 2]);
//!
//! let ty = GeometricType::from_code(conn.group(1)[0]).unwrap();
//! assert_eq!(ty, GeometricType::Quad4);
//! assert_eq!(ty.dimension(), 2);
//! ```
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod cell;
mod coords;
mod error;
mod indexed;

pub use bounds::{Aabb, pad};
pub use cell::{
    FACE_SEPARATOR, GeometricType, SonTemplate, polyhedron_faces, reverse_1d, reverse_2d,
};
pub use coords::{Coords, SharedCoords};
pub use error::{MeshError, MeshResult};
pub use indexed::{
    IndexedArray, convert_index_array_to_old_to_new, invert_old_to_new, to_id, to_index,
};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
