//! Geometric measurement kernels for unstructured meshes.
//!
//! This crate provides the numeric building blocks that do not need a mesh
//! topology:
//!
//! - **Directed bounding box**: box aligned with the principal axes of
//!   inertia of a point cloud, with separating-axis disjointness tests
//! - **Quality metrics**: skew, edge ratio, aspect ratio and warpage of
//!   triangles, quadrangles and tetrahedra
//! - **Linear algebra**: BLAS-1 vector routines, LU factorization, matrix
//!   inversion and product on small dense matrices
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//! - Other game engines
//!
//! # Example
//!
//! ```
//! use mesh_measure::{DirectedBoundingBox, quad_edge_ratio};
//!
//! let pts = [0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 1.0, 0.0, 0.0, 1.0, 0.0];
//!
//! let obb = DirectedBoundingBox::new(&pts, 3).unwrap();
//! assert!(!obb.is_out(&[2.0, 0.5, 0.0]));
//! assert!(obb.is_out(&[2.0, 0.5, 1.0]));
//!
//! assert!((quad_edge_ratio(&pts).unwrap() - 4.0).abs() < 1e-12);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod linalg;
mod obb;
mod quality;

pub use error::{MeasureError, MeasureResult};
pub use linalg::{
    LuFactor, daxpy, ddot, dgedi, dgefa, dscal, dswap, idamax, inverse_matrix, matrix_product,
};
pub use obb::DirectedBoundingBox;
pub use quality::{
    quad_aspect_ratio, quad_edge_ratio, quad_skew, quad_warp, tetra_aspect_ratio,
    tetra_edge_ratio, tri_aspect_ratio, tri_edge_ratio,
};
