//! The unstructured mesh: cells stored as `[type code, nodes...]` groups.

use std::collections::BTreeSet;

use mesh_types::{
    FACE_SEPARATOR, GeometricType, IndexedArray, MeshError, MeshResult, SharedCoords,
    invert_old_to_new, polyhedron_faces, to_id, to_index,
};
use tracing::debug;

use crate::point_set::PointSet;

/// Where the connectivity of a mesh stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectivityState {
    /// No connectivity.
    #[default]
    Empty,
    /// Storage reserved, no cell yet.
    Allocating,
    /// Cells being inserted.
    Building,
    /// Storage compacted or set in one go.
    Finalized,
}

/// Borrowed view of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef<'a> {
    /// Cell type.
    pub ty: GeometricType,
    /// Node ids, with `-1` between polyhedron faces.
    pub nodes: &'a [i64],
}

impl<'a> CellRef<'a> {
    pub(crate) fn parse(cell: usize, group: &'a [i64]) -> MeshResult<Self> {
        let (&code, nodes) = group.split_first().ok_or_else(|| {
            MeshError::invalid_argument(format!("cell {cell} has no type code"))
        })?;
        Ok(Self {
            ty: GeometricType::from_code(code)?,
            nodes,
        })
    }

    /// Node ids without polyhedron face separators.
    pub fn node_ids(&self) -> impl Iterator<Item = i64> + 'a {
        self.nodes.iter().copied().filter(|&n| n != FACE_SEPARATOR)
    }
}

/// Unstructured mesh of a single topological dimension.
///
/// Cloning shares the coordinates and copies the connectivity; see
/// [`UMesh::deep_copy`] for a fully independent mesh.
///
/// # Example
///
/// ```
/// use mesh_types::{Coords, GeometricType};
/// use mesh_unstructured::UMesh;
///
/// let mut mesh = UMesh::new(2);
/// mesh.set_coords(Coords::new(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 2).unwrap());
/// mesh.allocate_cells(2);
/// mesh.insert_next_cell(GeometricType::Tri3, &[0, 1, 2]).unwrap();
/// mesh.insert_next_cell(GeometricType::Tri3, &[0, 2, 3]).unwrap();
/// mesh.finish_inserting_cells();
///
/// mesh.check_consistency().unwrap();
/// assert_eq!(mesh.number_of_cells().unwrap(), 2);
/// assert_eq!(mesh.cell(1).unwrap().nodes, &[0, 2, 3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UMesh {
    point_set: PointSet,
    mesh_dim: Option<usize>,
    connectivity: Option<IndexedArray>,
    state: ConnectivityState,
    types: BTreeSet<GeometricType>,
}

impl UMesh {
    /// An empty mesh of topological dimension `mesh_dim`.
    #[must_use]
    pub fn new(mesh_dim: usize) -> Self {
        Self {
            mesh_dim: Some(mesh_dim),
            ..Self::default()
        }
    }

    /// A mesh with the given dimension, coordinates and connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownCellType`] for an invalid type code.
    pub fn from_parts(
        mesh_dim: usize,
        coords: impl Into<SharedCoords>,
        connectivity: IndexedArray,
    ) -> MeshResult<Self> {
        let mut mesh = Self::new(mesh_dim);
        mesh.set_coords(coords);
        mesh.set_connectivity(connectivity, true)?;
        Ok(mesh)
    }

    /// Copy with its own coordinate buffer.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let mut out = self.clone();
        if let Ok(coords) = self.point_set.coords() {
            out.point_set.set_coords(coords.deep_copy());
        }
        out
    }

    /// Topological dimension.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if it was never set.
    pub fn mesh_dimension(&self) -> MeshResult<usize> {
        self.mesh_dim
            .ok_or(MeshError::not_configured("mesh dimension"))
    }

    /// Set the topological dimension.
    pub fn set_mesh_dimension(&mut self, mesh_dim: usize) {
        self.mesh_dim = Some(mesh_dim);
    }

    /// The node set.
    #[must_use]
    pub const fn point_set(&self) -> &PointSet {
        &self.point_set
    }

    /// The node set, for transforms.
    pub fn point_set_mut(&mut self) -> &mut PointSet {
        &mut self.point_set
    }

    /// Install coordinates.
    pub fn set_coords(&mut self, coords: impl Into<SharedCoords>) {
        self.point_set.set_coords(coords);
    }

    /// The coordinate handle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if no coordinates were set.
    pub fn coords(&self) -> MeshResult<&SharedCoords> {
        self.point_set.coords()
    }

    /// Number of nodes.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if no coordinates were set.
    pub fn number_of_nodes(&self) -> MeshResult<usize> {
        self.point_set.number_of_nodes()
    }

    /// Number of components per node.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if no coordinates were set.
    pub fn space_dimension(&self) -> MeshResult<usize> {
        self.point_set.space_dimension()
    }

    /// Where the connectivity stands.
    #[must_use]
    pub const fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Reserve room for `hint` cells and drop any previous cell.
    pub fn allocate_cells(&mut self, hint: usize) {
        self.connectivity = Some(IndexedArray::with_capacity(hint, hint * 5));
        self.types.clear();
        self.state = ConnectivityState::Allocating;
    }

    /// Append a cell.
    ///
    /// # Errors
    ///
    /// - [`MeshError::NotConfigured`] before [`UMesh::allocate_cells`] or
    ///   without a mesh dimension
    /// - [`MeshError::DimensionMismatch`] if `ty` is not of the mesh dimension
    /// - [`MeshError::SizeMismatch`] if a static type gets the wrong number of
    ///   nodes
    pub fn insert_next_cell(&mut self, ty: GeometricType, nodes: &[i64]) -> MeshResult<()> {
        let mesh_dim = self.mesh_dimension()?;
        if ty.dimension() != mesh_dim {
            return Err(MeshError::dimension_mismatch(
                format!("insertion of a {ty} cell"),
                to_id(mesh_dim),
                to_id(ty.dimension()),
            ));
        }
        if let Some(expected) = ty.node_count() {
            if expected != nodes.len() {
                return Err(MeshError::size_mismatch(
                    format!("insertion of a {ty} cell"),
                    expected,
                    nodes.len(),
                ));
            }
        }
        let conn = self.connectivity.as_mut().ok_or(MeshError::not_configured(
            "cell storage, call allocate_cells first",
        ))?;
        conn.push_group(std::iter::once(ty.code()).chain(nodes.iter().copied()));
        self.types.insert(ty);
        self.state = ConnectivityState::Building;
        Ok(())
    }

    /// Compact the storage once every cell is inserted.
    pub fn finish_inserting_cells(&mut self) {
        if let Some(conn) = self.connectivity.as_mut() {
            conn.shrink_to_fit();
            self.state = ConnectivityState::Finalized;
        }
    }

    /// Replace the whole connectivity.
    ///
    /// With `recompute_types` false the type cache is cleared and only
    /// rebuilt by [`UMesh::compute_types`].
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownCellType`] (or
    /// [`MeshError::InvalidArgument`] for an empty group) when recomputing
    /// types over an invalid connectivity. The connectivity is installed
    /// anyway.
    pub fn set_connectivity(
        &mut self,
        connectivity: IndexedArray,
        recompute_types: bool,
    ) -> MeshResult<()> {
        self.connectivity = Some(connectivity);
        self.state = ConnectivityState::Finalized;
        if recompute_types {
            self.compute_types()
        } else {
            self.types.clear();
            Ok(())
        }
    }

    /// Rebuild the set of types present.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownCellType`] for an invalid type code.
    pub fn compute_types(&mut self) -> MeshResult<()> {
        let mut types = BTreeSet::new();
        if let Some(conn) = &self.connectivity {
            for (i, group) in conn.iter().enumerate() {
                types.insert(CellRef::parse(i, group)?.ty);
            }
        }
        self.types = types;
        Ok(())
    }

    /// Types present in the mesh, ascending.
    #[must_use]
    pub const fn geometric_types(&self) -> &BTreeSet<GeometricType> {
        &self.types
    }

    /// The connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] if none was set.
    pub fn connectivity(&self) -> MeshResult<&IndexedArray> {
        self.connectivity
            .as_ref()
            .ok_or(MeshError::not_configured("connectivity"))
    }

    /// Mutable connectivity; callers keep the type cache in sync.
    pub(crate) fn connectivity_mut(&mut self) -> MeshResult<&mut IndexedArray> {
        self.connectivity
            .as_mut()
            .ok_or(MeshError::not_configured("connectivity"))
    }

    /// Install a rebuilt connectivity and refresh the type cache.
    pub(crate) fn replace_connectivity(&mut self, connectivity: IndexedArray) -> MeshResult<()> {
        self.set_connectivity(connectivity, true)
    }

    /// Number of cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without connectivity.
    pub fn number_of_cells(&self) -> MeshResult<usize> {
        Ok(self.connectivity()?.len())
    }

    /// Cell `i`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without connectivity,
    /// [`MeshError::OutOfRange`] for a bad id and
    /// [`MeshError::UnknownCellType`] for an invalid type code.
    pub fn cell(&self, i: usize) -> MeshResult<CellRef<'_>> {
        let conn = self.connectivity()?;
        if i >= conn.len() {
            return Err(MeshError::out_of_range("cell id", to_id(i), conn.len()));
        }
        CellRef::parse(i, conn.group(i))
    }

    /// Type of cell `i`.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::cell`].
    pub fn type_of_cell(&self, i: usize) -> MeshResult<GeometricType> {
        Ok(self.cell(i)?.ty)
    }

    /// Every cell in order.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without connectivity. Items fail
    /// on invalid type codes.
    pub fn cells(
        &self,
    ) -> MeshResult<impl ExactSizeIterator<Item = MeshResult<CellRef<'_>>> + '_> {
        Ok(self
            .connectivity()?
            .iter()
            .enumerate()
            .map(|(i, group)| CellRef::parse(i, group)))
    }

    /// Ids of the cells of type `ty`, ascending.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::cells`].
    pub fn cell_ids_with_type(&self, ty: GeometricType) -> MeshResult<Vec<usize>> {
        let mut ids = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            if cell?.ty == ty {
                ids.push(i);
            }
        }
        Ok(ids)
    }

    /// Number of nodes of each cell, face separators excluded.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::cells`].
    pub fn compute_nb_of_nodes_per_cell(&self) -> MeshResult<Vec<usize>> {
        self.cells()?
            .map(|cell| Ok(cell?.node_ids().count()))
            .collect()
    }

    /// Structural validation: connectivity and coordinates present, valid
    /// type codes, every type of the mesh dimension.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshError`] found.
    pub fn check_consistency_light(&self) -> MeshResult<()> {
        let mesh_dim = self.mesh_dimension()?;
        self.coords()?;
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty.dimension() != mesh_dim {
                return Err(MeshError::dimension_mismatch(
                    format!("cell {i} of type {}", cell.ty),
                    to_id(mesh_dim),
                    to_id(cell.ty.dimension()),
                ));
            }
        }
        Ok(())
    }

    /// [`UMesh::check_consistency_light`] plus node ids in range, node count
    /// of static types and face separators only inside polyhedra.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshError`] found.
    pub fn check_consistency(&self) -> MeshResult<()> {
        self.check_consistency_light()?;
        let n = self.number_of_nodes()?;
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            let expected = cell.ty.node_count().unwrap_or(cell.nodes.len());
            if expected != cell.nodes.len() {
                return Err(MeshError::size_mismatch(
                    format!("cell {i} of type {}", cell.ty),
                    expected,
                    cell.nodes.len(),
                ));
            }
            if cell.ty == GeometricType::QPolygon && cell.nodes.len() % 2 != 0 {
                return Err(MeshError::size_mismatch(
                    format!("cell {i} of type {}", cell.ty),
                    cell.nodes.len() + 1,
                    cell.nodes.len(),
                ));
            }
            let polyhedron = cell.ty == GeometricType::Polyhedron;
            for &node in cell.nodes {
                if node == FACE_SEPARATOR && polyhedron {
                    continue;
                }
                if to_index(node).is_none_or(|k| k >= n) {
                    return Err(MeshError::out_of_range(format!("node of cell {i}"), node, n));
                }
            }
        }
        Ok(())
    }

    /// [`UMesh::check_consistency`] plus no node repeated inside a cell, or
    /// inside a face for polyhedra.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshError`] found; a repeated node gives
    /// [`MeshError::InvalidArgument`].
    pub fn check_geom_consistency(&self) -> MeshResult<()> {
        self.check_consistency()?;
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty == GeometricType::Polyhedron {
                for (f, face) in polyhedron_faces(cell.nodes).enumerate() {
                    if let Some(node) = first_repeated(face) {
                        return Err(MeshError::invalid_argument(format!(
                            "face {f} of polyhedron {i} uses node {node} twice"
                        )));
                    }
                }
            } else if let Some(node) = first_repeated(cell.nodes) {
                return Err(MeshError::invalid_argument(format!(
                    "cell {i} uses node {node} twice"
                )));
            }
        }
        Ok(())
    }

    /// Sub-mesh made of the cells `ids`, in that order.
    ///
    /// With `keep_coords` the result shares this mesh's coordinates;
    /// otherwise its unused nodes are removed into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::OutOfRange`] for a bad cell id.
    pub fn build_part_of_my_self(&self, ids: &[usize], keep_coords: bool) -> MeshResult<Self> {
        let conn = self.connectivity()?.extract_groups(ids)?;
        let mut part = Self {
            point_set: self.point_set.clone(),
            mesh_dim: self.mesh_dim,
            connectivity: None,
            state: ConnectivityState::Empty,
            types: BTreeSet::new(),
        };
        part.set_connectivity(conn, true)?;
        if !keep_coords {
            part.zip_coords()?;
        }
        Ok(part)
    }

    /// Move cell `i` to position `old_to_new[i]`.
    ///
    /// With `check`, the array is validated as a permutation before anything
    /// moves, reporting the two cells sent to the same place.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::SizeMismatch`] if the array does not have one
    /// entry per cell, [`MeshError::OutOfRange`] for a target past the last
    /// cell and [`MeshError::InvalidArgument`] if it is not a permutation.
    pub fn renumber_cells(&mut self, old_to_new: &[i64], check: bool) -> MeshResult<()> {
        let n = self.number_of_cells()?;
        if old_to_new.len() != n {
            return Err(MeshError::size_mismatch(
                "cell renumbering array",
                n,
                old_to_new.len(),
            ));
        }
        if check {
            let mut source: Vec<Option<usize>> = vec![None; n];
            for (old, &new) in old_to_new.iter().enumerate() {
                let t = to_index(new)
                    .filter(|&t| t < n)
                    .ok_or_else(|| MeshError::out_of_range(format!("new id of cell {old}"), new, n))?;
                if let Some(first) = source[t] {
                    return Err(MeshError::invalid_argument(format!(
                        "cells {first} and {old} are both renumbered to {t}"
                    )));
                }
                source[t] = Some(old);
            }
        }
        let new_to_old = invert_old_to_new(old_to_new, n)?;
        let conn = self.connectivity()?;
        let mut out = IndexedArray::with_capacity(n, conn.values().len());
        for (new, &old) in new_to_old.iter().enumerate() {
            let old = to_index(old).ok_or_else(|| {
                MeshError::invalid_argument(format!("no cell is renumbered to {new}"))
            })?;
            out.push_group(conn.group(old).iter().copied());
        }
        debug!(cells = n, "cells renumbered");
        self.replace_connectivity(out)
    }
}

fn first_repeated(nodes: &[i64]) -> Option<i64> {
    let mut seen = BTreeSet::new();
    nodes.iter().copied().find(|&n| !seen.insert(n))
}
