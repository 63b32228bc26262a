//! Spread zones and connected components over adjacency graphs.
//!
//! The graphs are the neighbor relations produced by `mesh-unstructured`
//! (cell to cell through shared faces, node to node through edges), stored
//! as an [`IndexedArray`](mesh_types::IndexedArray): group `i` lists the
//! neighbors of element `i`. Negative entries are ignored.
//!
//! - [`compute_spread_zone_gradually_from_seed`] - level-by-level
//!   propagation from a seed set, optionally depth limited
//! - [`partition_by_spread_zone`] - split all elements into connected
//!   components
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Example
//!
//! ```
//! use mesh_types::IndexedArray;
//! use mesh_zones::{SpreadConfig, compute_spread_zone_gradually_from_seed};
//!
//! // a triangle 0-1-2 and an isolated element 3
//! let graph = IndexedArray::from_groups([&[1_i64, 2][..], &[0, 2], &[0, 1], &[]]);
//! let zone = compute_spread_zone_gradually_from_seed(&[1], &graph, &SpreadConfig::default())
//!     .unwrap();
//! assert_eq!(zone.ids, vec![0, 1, 2]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod spread;

pub use error::{ZoneError, ZoneResult};
pub use spread::{
    SpreadConfig, SpreadZone, compute_spread_zone_gradually_from_seed, partition_by_spread_zone,
};
