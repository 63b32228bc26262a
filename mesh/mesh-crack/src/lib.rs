//! Crack insertion along a group of faces of an unstructured mesh.
//!
//! A crack is a set of inner faces across which the cells must stop being
//! connected. [`crack_along`] splits the nodes of those faces, giving each
//! side of the crack its own copies, and duplicates the faces in the face
//! mesh so that both sides keep a boundary. [`open_crack`] then moves the
//! new nodes apart to make the gap visible.
//!
//! Both meshes share one coordinate buffer; new nodes are appended to it,
//! so every mesh built on the same coordinates sees them.
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod crack;
mod error;

pub use crack::{CellNodeMap, CrackOutcome, CrackParams, crack_along, open_crack};
pub use error::{CrackError, CrackResult};
