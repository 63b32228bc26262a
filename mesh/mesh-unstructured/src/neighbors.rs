//! Neighbor graphs of cells and nodes, and the spread zones walked on them.

use mesh_types::{IndexedArray, MeshError, MeshResult, to_id, to_index};
use mesh_zones::{SpreadConfig, SpreadZone, ZoneError, compute_spread_zone_gradually_from_seed};
use smallvec::SmallVec;
use tracing::debug;

use crate::descending::reverse_nodal_of;
use crate::params::DescendingNumbering;
use crate::umesh::UMesh;

fn from_zone_error(err: ZoneError) -> MeshError {
    match err {
        ZoneError::SeedOutOfRange { seed, count, .. } => {
            MeshError::out_of_range("spread seed", to_id(seed), count)
        }
        ZoneError::InvalidGraph { .. } => MeshError::invalid_argument(err.to_string()),
    }
}

/// Sort and dedup a neighbor list, dropping `own`.
fn push_sorted(graph: &mut IndexedArray, buf: &mut SmallVec<[i64; 32]>, own: i64) {
    buf.sort_unstable();
    buf.dedup();
    graph.push_group(buf.iter().copied().filter(|&n| n != own));
    buf.clear();
}

impl UMesh {
    /// For each cell, the cells sharing one of its sub-entities (faces in
    /// 3D, edges in 2D, points in 1D), ascending.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::build_descending_connectivity`] with `delta` 1.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Coords, GeometricType};
    /// use mesh_unstructured::UMesh;
    ///
    /// let mut m = UMesh::new(1);
    /// m.set_coords(Coords::new(vec![0.0, 1.0, 2.0, 3.0], 1).unwrap());
    /// m.allocate_cells(3);
    /// for i in 0..3 {
    ///     m.insert_next_cell(GeometricType::Seg2, &[i, i + 1]).unwrap();
    /// }
    ///
    /// let graph = m.compute_neighbors_of_cells().unwrap();
    /// assert_eq!(graph.group(1), &[0, 2]);
    /// ```
    pub fn compute_neighbors_of_cells(&self) -> MeshResult<IndexedArray> {
        let d = self.build_descending_connectivity(1, DescendingNumbering::Plain)?;
        let n_cells = d.desc.len();
        let mut graph = IndexedArray::with_capacity(n_cells, d.desc.values().len());
        let mut buf: SmallVec<[i64; 32]> = SmallVec::new();
        for cell in 0..n_cells {
            for (s, _) in d.entities_of(cell) {
                buf.extend(d.rev_desc.group(s).iter().copied());
            }
            push_sorted(&mut graph, &mut buf, to_id(cell));
        }
        Ok(graph)
    }

    /// For each node, the nodes joined to it by an edge of the mesh
    /// skeleton, ascending.
    ///
    /// Edges of 3D cells are taken directly, those of 2D cells from the
    /// descending mesh, and a 1D mesh is its own skeleton. Only corner nodes
    /// take part: the mid node of a quadratic edge stays isolated.
    ///
    /// # Errors
    ///
    /// - [`MeshError::InvalidArgument`] for a mesh of points
    /// - [`MeshError::NotConfigured`] without coordinates or connectivity
    pub fn compute_neighbors_of_nodes(&self) -> MeshResult<IndexedArray> {
        let skeleton = match self.mesh_dimension()? {
            3 => self.explode_3d_mesh_to_1d()?.mesh,
            2 => {
                self.build_descending_connectivity(1, DescendingNumbering::Plain)?
                    .mesh
            }
            1 => self.clone(),
            _ => {
                return Err(MeshError::invalid_argument(
                    "a mesh of points has no edge skeleton",
                ));
            }
        };
        let n_nodes = self.number_of_nodes()?;
        let mut pairs = IndexedArray::with_capacity(skeleton.number_of_cells()?, 0);
        for cell in skeleton.cells()? {
            let cell = cell?;
            let k = cell.ty.corner_count(cell.nodes.len());
            for w in cell.nodes[..k].windows(2) {
                pairs.push_group([w[0], w[1]]);
            }
        }
        let by_node = pairs.build_reverse(n_nodes)?;

        let mut graph = IndexedArray::with_capacity(n_nodes, pairs.values().len());
        let mut buf: SmallVec<[i64; 32]> = SmallVec::new();
        for node in 0..n_nodes {
            for &p in by_node.group(node) {
                if let Some(p) = to_index(p) {
                    buf.extend(pairs.group(p).iter().copied());
                }
            }
            push_sorted(&mut graph, &mut buf, to_id(node));
        }
        debug!(nodes = n_nodes, edges = pairs.len(), "node neighbors computed");
        Ok(graph)
    }

    /// For each node, every other node sharing a cell with it, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates or
    /// connectivity and [`MeshError::OutOfRange`] for a bad node id.
    pub fn compute_enlarged_neighbors_of_nodes(&self) -> MeshResult<IndexedArray> {
        let conn = self.connectivity()?;
        let n_nodes = self.number_of_nodes()?;
        let rev = reverse_nodal_of(conn, n_nodes)?;
        let mut graph = IndexedArray::with_capacity(n_nodes, rev.values().len() * 4);
        let mut buf: SmallVec<[i64; 32]> = SmallVec::new();
        for node in 0..n_nodes {
            for &c in rev.group(node) {
                let c = to_index(c).unwrap_or_default();
                buf.extend(self.cell(c)?.node_ids());
            }
            push_sorted(&mut graph, &mut buf, to_id(node));
        }
        Ok(graph)
    }

    /// Cells reached from `seeds` through shared sub-entities.
    ///
    /// # Errors
    ///
    /// - [`MeshError::OutOfRange`] for a seed that is not a cell
    /// - errors of [`UMesh::compute_neighbors_of_cells`]
    pub fn compute_spread_zone_from_seed(
        &self,
        seeds: &[usize],
        config: &SpreadConfig,
    ) -> MeshResult<SpreadZone> {
        let graph = self.compute_neighbors_of_cells()?;
        compute_spread_zone_gradually_from_seed(seeds, &graph, config).map_err(from_zone_error)
    }

    /// Connected components of the cells, each ascending, ordered by their
    /// smallest cell.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::compute_neighbors_of_cells`].
    pub fn partition_by_spread_zone(&self) -> MeshResult<Vec<Vec<usize>>> {
        let graph = self.compute_neighbors_of_cells()?;
        mesh_zones::partition_by_spread_zone(&graph).map_err(from_zone_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{Coords, GeometricType};

    /// 2x2 grid of unit quads.
    fn quad_grid() -> UMesh {
        let mut xy = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                xy.extend([f64::from(i), f64::from(j)]);
            }
        }
        let mut m = UMesh::new(2);
        m.set_coords(Coords::new(xy, 2).unwrap());
        m.allocate_cells(4);
        for c in [[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]] {
            m.insert_next_cell(GeometricType::Quad4, &c).unwrap();
        }
        m
    }

    #[test]
    fn test_cell_neighbors_of_grid() {
        let g = quad_grid().compute_neighbors_of_cells().unwrap();
        assert_eq!(g.len(), 4);
        assert_eq!(g.group(0), &[1, 2]);
        assert_eq!(g.group(1), &[0, 3]);
        assert_eq!(g.group(2), &[0, 3]);
        assert_eq!(g.group(3), &[1, 2]);
    }

    #[test]
    fn test_node_neighbors_of_grid() {
        let g = quad_grid().compute_neighbors_of_nodes().unwrap();
        assert_eq!(g.len(), 9);
        assert_eq!(g.group(0), &[1, 3]);
        assert_eq!(g.group(4), &[1, 3, 5, 7]);
        assert_eq!(g.group(8), &[5, 7]);
        // every grid edge counted from both ends
        assert_eq!(g.values().len(), 24);
    }

    #[test]
    fn test_enlarged_node_neighbors() {
        let g = quad_grid().compute_enlarged_neighbors_of_nodes().unwrap();
        assert_eq!(g.group(0), &[1, 3, 4]);
        assert_eq!(g.group(4), &[0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_node_neighbors_of_tetra() {
        let mut m = UMesh::new(3);
        m.set_coords(
            Coords::new(
                vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
                3,
            )
            .unwrap(),
        );
        m.allocate_cells(1);
        m.insert_next_cell(GeometricType::Tetra4, &[0, 2, 1, 3]).unwrap();
        let g = m.compute_neighbors_of_nodes().unwrap();
        for n in 0..4 {
            assert_eq!(g.group_len(n), 3);
        }
    }

    #[test]
    fn test_partition_and_spread() {
        let mut m = UMesh::new(2);
        m.set_coords(
            Coords::new(
                vec![
                    0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 5.0, 5.0, 6.0, 5.0, 5.0, 6.0,
                ],
                2,
            )
            .unwrap(),
        );
        m.allocate_cells(3);
        m.insert_next_cell(GeometricType::Tri3, &[0, 1, 2]).unwrap();
        m.insert_next_cell(GeometricType::Tri3, &[4, 5, 6]).unwrap();
        m.insert_next_cell(GeometricType::Tri3, &[1, 3, 2]).unwrap();

        let parts = m.partition_by_spread_zone().unwrap();
        assert_eq!(parts, vec![vec![0, 2], vec![1]]);

        let zone = m
            .compute_spread_zone_from_seed(&[2], &SpreadConfig::unlimited())
            .unwrap();
        assert_eq!(zone.ids, vec![0, 2]);

        let err = m
            .compute_spread_zone_from_seed(&[7], &SpreadConfig::first_ring())
            .unwrap_err();
        assert!(matches!(err, MeshError::OutOfRange { .. }));
    }

    #[test]
    fn test_points_have_no_skeleton() {
        let mut m = UMesh::new(0);
        m.set_coords(Coords::new(vec![0.0, 1.0], 1).unwrap());
        m.allocate_cells(1);
        m.insert_next_cell(GeometricType::Point1, &[0]).unwrap();
        assert!(matches!(
            m.compute_neighbors_of_nodes(),
            Err(MeshError::InvalidArgument(_))
        ));
    }
}
