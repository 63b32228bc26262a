//! Descending connectivity: faces or edges of the cells, shared between
//! neighbors.

use mesh_types::{
    GeometricType, IndexedArray, MeshError, MeshResult, convert_index_array_to_old_to_new, invert_old_to_new,
    to_id, to_index,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::equality::{are_cells_equal, find_common_cells_in};
use crate::params::{CellComparePolicy, CellEquality, DescendingNumbering};
use crate::umesh::{CellRef, UMesh};

/// Sub-entities of a mesh with the relations to its cells.
#[derive(Debug, Clone)]
pub struct Descending {
    /// One cell per distinct sub-entity, sharing the coordinates of the
    /// source mesh.
    pub mesh: UMesh,
    /// For each source cell, its sub-entities in model order, encoded per
    /// [`Descending::numbering`].
    pub desc: IndexedArray,
    /// For each sub-entity, the source cells it bounds, ascending.
    pub rev_desc: IndexedArray,
    /// Encoding of [`Descending::desc`].
    pub numbering: DescendingNumbering,
}

impl Descending {
    /// Sub-entities of `cell` as `(id, reversed)` pairs.
    ///
    /// `reversed` is always false with [`DescendingNumbering::Plain`].
    pub fn entities_of(&self, cell: usize) -> impl Iterator<Item = (usize, bool)> + '_ {
        let numbering = self.numbering;
        self.desc
            .group(cell)
            .iter()
            .filter_map(move |&v| decode(v, numbering))
    }

    /// Number of owners of each sub-entity.
    #[must_use]
    pub fn owner_counts(&self) -> Vec<usize> {
        (0..self.rev_desc.len())
            .map(|s| self.rev_desc.group_len(s))
            .collect()
    }
}

fn decode(v: i64, numbering: DescendingNumbering) -> Option<(usize, bool)> {
    match numbering {
        DescendingNumbering::Plain => to_index(v).map(|s| (s, false)),
        DescendingNumbering::OrientationSensitive => {
            let s = to_index(v.abs() - 1)?;
            Some((s, v < 0))
        }
    }
}

/// Reverse nodal relation of a connectivity: for each node, the cells using
/// it, each cell listed once.
pub(crate) fn reverse_nodal_of(conn: &IndexedArray, n_nodes: usize) -> MeshResult<IndexedArray> {
    let mut nodes_of = IndexedArray::with_capacity(conn.len(), conn.values().len());
    let mut buf: SmallVec<[i64; 32]> = SmallVec::new();
    for (i, group) in conn.iter().enumerate() {
        buf.clear();
        buf.extend(CellRef::parse(i, group)?.node_ids());
        buf.sort_unstable();
        buf.dedup();
        nodes_of.push_group(buf.iter().copied());
    }
    nodes_of.build_reverse(n_nodes)
}

impl UMesh {
    /// For each node, the cells using it, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates or
    /// connectivity and [`MeshError::OutOfRange`] for a bad node id.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Coords, GeometricType};
    /// use mesh_unstructured::UMesh;
    ///
    /// let mut m = UMesh::new(1);
    /// m.set_coords(Coords::new(vec![0.0, 1.0, 2.0], 1).unwrap());
    /// m.allocate_cells(2);
    /// m.insert_next_cell(GeometricType::Seg2, &[0, 1]).unwrap();
    /// m.insert_next_cell(GeometricType::Seg2, &[1, 2]).unwrap();
    ///
    /// let rev = m.reverse_nodal_connectivity().unwrap();
    /// assert_eq!(rev.group(1), &[0, 1]);
    /// ```
    pub fn reverse_nodal_connectivity(&self) -> MeshResult<IndexedArray> {
        reverse_nodal_of(self.connectivity()?, self.number_of_nodes()?)
    }

    /// Build the sub-entities `delta` dimensions below the cells.
    ///
    /// `delta` 1 gives faces of 3D cells, edges of 2D cells and points of 1D
    /// cells; `delta` 2 gives the edges of 3D cells directly. Sons are taken
    /// from the cell models; two sons with the same type and node set are one
    /// sub-entity, numbered in order of first appearance and stored with the
    /// node order of that first appearance.
    ///
    /// # Errors
    ///
    /// - [`MeshError::InvalidArgument`] for `delta` outside 1..=2 or a mesh of
    ///   points
    /// - [`MeshError::DimensionMismatch`] for `delta` 2 on a non 3D mesh
    /// - [`MeshError::NotConfigured`] without coordinates or connectivity
    pub fn build_descending_connectivity(
        &self,
        delta: usize,
        numbering: DescendingNumbering,
    ) -> MeshResult<Descending> {
        let mesh_dim = self.mesh_dimension()?;
        match delta {
            1 if mesh_dim == 0 => {
                return Err(MeshError::invalid_argument(
                    "a mesh of points has no sub-entity",
                ));
            }
            1 => {}
            2 if mesh_dim != 3 => {
                return Err(MeshError::dimension_mismatch(
                    "edges of a volume mesh",
                    3,
                    to_id(mesh_dim),
                ));
            }
            2 => {}
            other => {
                return Err(MeshError::invalid_argument(format!(
                    "sub-entity delta must be 1 or 2, got {other}"
                )));
            }
        }
        let n_nodes = self.number_of_nodes()?;
        let n_cells = self.number_of_cells()?;

        // Every son of every cell, duplicates included.
        let mut sons = IndexedArray::with_capacity(n_cells * 4, n_cells * 16);
        let mut owned = IndexedArray::with_capacity(n_cells, n_cells * 4);
        for cell in self.cells()? {
            let cell = cell?;
            let first = sons.len();
            let mut push = |ty: GeometricType, nodes: &[i64]| {
                sons.push_group(std::iter::once(ty.code()).chain(nodes.iter().copied()));
            };
            if delta == 1 {
                cell.ty.for_each_son(cell.nodes, &mut push);
            } else {
                cell.ty.for_each_edge(cell.nodes, &mut push);
            }
            owned.push_group((first..sons.len()).map(to_id));
        }

        let rev_nodal = reverse_nodal_of(&sons, n_nodes)?;
        let common = find_common_cells_in(&sons, &rev_nodal, CellComparePolicy::Nodal, 0)?;
        let (old_to_new, n_sub) = convert_index_array_to_old_to_new(sons.len(), &common)?;
        let firsts: Vec<usize> = invert_old_to_new(&old_to_new, n_sub)?
            .into_iter()
            .filter_map(to_index)
            .collect();

        let mut plain = IndexedArray::with_capacity(n_cells, sons.len());
        let mut desc = IndexedArray::with_capacity(n_cells, sons.len());
        for group in owned.iter() {
            plain.push_group(group.iter().map(|&p| old_to_new[son_index(p)]));
            if numbering == DescendingNumbering::Plain {
                continue;
            }
            let mut encoded: SmallVec<[i64; 12]> = SmallVec::new();
            for &p in group {
                let p = son_index(p);
                let s = old_to_new[p];
                let first = firsts[son_index(s)];
                let reversed = first != p && {
                    let a = CellRef::parse(p, sons.group(p))?;
                    let b = CellRef::parse(first, sons.group(first))?;
                    are_cells_equal(&a, &b, CellComparePolicy::PermutedAnyOrientation)?
                        == CellEquality::Reversed
                };
                encoded.push(if reversed { -(s + 1) } else { s + 1 });
            }
            desc.push_group(encoded);
        }
        let rev_desc = plain.build_reverse(n_sub)?;
        if numbering == DescendingNumbering::Plain {
            desc = plain;
        }

        let mut mesh = Self::new(mesh_dim - delta);
        mesh.set_coords(self.coords()?.clone());
        mesh.set_connectivity(sons.extract_groups(&firsts)?, true)?;
        debug!(
            cells = n_cells,
            provisional = sons.len(),
            sub_entities = n_sub,
            delta,
            "descending connectivity built"
        );
        Ok(Descending {
            mesh,
            desc,
            rev_desc,
            numbering,
        })
    }

    /// Edges of a 3D mesh, skipping the face level.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::build_descending_connectivity`] with `delta` 2.
    pub fn explode_3d_mesh_to_1d(&self) -> MeshResult<Descending> {
        self.build_descending_connectivity(2, DescendingNumbering::Plain)
    }

    /// Sub-entities bounding a single cell, sharing the coordinates.
    ///
    /// The faces are oriented as seen from the cell that owns them.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::build_descending_connectivity`].
    pub fn compute_skin(&self) -> MeshResult<Self> {
        let d = self.build_descending_connectivity(1, DescendingNumbering::Plain)?;
        let ids: Vec<usize> = d
            .owner_counts()
            .iter()
            .enumerate()
            .filter_map(|(s, &n)| (n == 1).then_some(s))
            .collect();
        d.mesh.build_part_of_my_self(&ids, true)
    }

    /// Cells with at least one sub-entity on the skin, ascending.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::build_descending_connectivity`].
    pub fn find_cell_ids_on_boundary(&self) -> MeshResult<Vec<usize>> {
        let d = self.build_descending_connectivity(1, DescendingNumbering::Plain)?;
        let counts = d.owner_counts();
        Ok((0..d.desc.len())
            .filter(|&c| d.entities_of(c).any(|(s, _)| counts[s] == 1))
            .collect())
    }

    /// Nodes lying on the skin, ascending.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::build_descending_connectivity`].
    pub fn find_boundary_nodes(&self) -> MeshResult<Vec<usize>> {
        let skin = self.compute_skin()?;
        let fetched = skin.compute_fetched_nodes()?;
        Ok(fetched
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
            .collect())
    }
}

/// Ids stored by this module are non-negative by construction.
fn son_index(id: i64) -> usize {
    to_index(id).unwrap_or_default()
}
