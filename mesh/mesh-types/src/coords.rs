//! Node coordinates and their shared handle.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{MeshError, MeshResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense coordinate array: `number_of_nodes() x dim` doubles, row-major.
///
/// # Example
///
/// ```
/// use mesh_types::Coords;
///
/// let c = Coords::new(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0], 2).unwrap();
/// assert_eq!(c.number_of_nodes(), 3);
/// assert_eq!(c.node(2), &[1.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coords {
    data: Vec<f64>,
    dim: usize,
}

impl Coords {
    /// Wrap a flat buffer of `dim` components per node.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidArgument`] if `dim` is 0 and
    /// [`MeshError::SizeMismatch`] if `data.len()` is not a multiple of `dim`.
    pub fn new(data: Vec<f64>, dim: usize) -> MeshResult<Self> {
        if dim == 0 {
            return Err(MeshError::invalid_argument("coordinates need at least one component"));
        }
        if data.len() % dim != 0 {
            return Err(MeshError::size_mismatch(
                format!("coordinates with {dim} components"),
                data.len().next_multiple_of(dim),
                data.len(),
            ));
        }
        Ok(Self { data, dim })
    }

    /// Number of components per node (space dimension).
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Number of nodes.
    #[must_use]
    pub fn number_of_nodes(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Coordinates of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= number_of_nodes()`.
    #[must_use]
    pub fn node(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Mutable coordinates of node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= number_of_nodes()`.
    pub fn node_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Node `i` padded with zeros to three components.
    #[must_use]
    pub fn point3(&self, i: usize) -> [f64; 3] {
        let mut p = [0.0; 3];
        for (k, v) in self.node(i).iter().take(3).enumerate() {
            p[k] = *v;
        }
        p
    }

    /// Flat buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Iterate over the nodes.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.dim)
    }

    /// Append a node.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::SizeMismatch`] if `point.len() != dim()`.
    pub fn push_node(&mut self, point: &[f64]) -> MeshResult<usize> {
        if point.len() != self.dim {
            return Err(MeshError::size_mismatch("appended node", self.dim, point.len()));
        }
        self.data.extend_from_slice(point);
        Ok(self.number_of_nodes() - 1)
    }

    /// Consume into the flat buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

/// Shared, reference-counted coordinate buffer.
///
/// Cloning the handle aliases the buffer: every mesh holding a clone sees
/// in-place modifications made through any other clone. Use
/// [`SharedCoords::deep_copy`] to get an independent buffer.
///
/// # Example
///
/// ```
/// use mesh_types::{Coords, SharedCoords};
///
/// let a = SharedCoords::new(Coords::new(vec![0.0, 0.0, 0.0], 3).unwrap());
/// let b = a.clone();
/// a.write().as_mut_slice()[0] = 5.0;
/// assert_eq!(b.read().node(0)[0], 5.0);
/// assert!(a.ptr_eq(&b));
/// assert!(!a.ptr_eq(&a.deep_copy()));
/// ```
#[derive(Debug, Clone)]
pub struct SharedCoords(Arc<RwLock<Coords>>);

impl SharedCoords {
    /// Wrap a coordinate array in a new shared handle.
    #[must_use]
    pub fn new(coords: Coords) -> Self {
        Self(Arc::new(RwLock::new(coords)))
    }

    /// Shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, Coords> {
        self.0.read()
    }

    /// Exclusive write access, visible to every alias.
    pub fn write(&self) -> RwLockWriteGuard<'_, Coords> {
        self.0.write()
    }

    /// Whether both handles alias the same buffer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Independent copy of the current content.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self::new(self.read().clone())
    }

    /// Number of handles aliasing this buffer.
    #[must_use]
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl From<Coords> for SharedCoords {
    fn from(coords: Coords) -> Self {
        Self::new(coords)
    }
}
