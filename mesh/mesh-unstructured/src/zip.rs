//! Node renumbering: removal of unused nodes and merging of coincident ones.

use mesh_types::{FACE_SEPARATOR, GeometricType, MeshError, MeshResult, to_id, to_index};
use tracing::debug;

use crate::umesh::UMesh;

impl UMesh {
    /// Which nodes are used by at least one cell.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::OutOfRange`] for a node id past the last node, or
    /// negative outside polyhedron face separators.
    pub fn compute_fetched_nodes(&self) -> MeshResult<Vec<bool>> {
        let n = self.number_of_nodes()?;
        let mut fetched = vec![false; n];
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            let polyhedron = cell.ty == GeometricType::Polyhedron;
            for &node in cell.nodes {
                if polyhedron && node == FACE_SEPARATOR {
                    continue;
                }
                match to_index(node).filter(|&k| k < n) {
                    Some(k) => fetched[k] = true,
                    None => {
                        return Err(MeshError::out_of_range(format!("node of cell {i}"), node, n));
                    }
                }
            }
        }
        Ok(fetched)
    }

    /// Old-to-new array compacting the used nodes (unused ones map to `-1`)
    /// and the number of used nodes.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::compute_fetched_nodes`].
    pub fn get_node_ids_in_use(&self) -> MeshResult<(Vec<i64>, usize)> {
        let fetched = self.compute_fetched_nodes()?;
        let mut next = 0;
        let old_to_new = fetched
            .iter()
            .map(|&f| {
                if f {
                    next += 1;
                    to_id(next - 1)
                } else {
                    -1
                }
            })
            .collect();
        Ok((old_to_new, next))
    }

    /// Drop the unused nodes and return the old-to-new node array.
    ///
    /// The coordinates of this mesh are replaced by a new buffer; other
    /// meshes sharing the old one are left untouched. On a mesh without
    /// orphan nodes the array is the identity.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::compute_fetched_nodes`].
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Coords, GeometricType};
    /// use mesh_unstructured::UMesh;
    ///
    /// let mut m = UMesh::new(1);
    /// m.set_coords(Coords::new(vec![0.0, 1.0, 2.0, 3.0], 1).unwrap());
    /// m.allocate_cells(1);
    /// m.insert_next_cell(GeometricType::Seg2, &[3, 1]).unwrap();
    ///
    /// assert_eq!(m.zip_coords_traducer().unwrap(), vec![-1, 0, -1, 1]);
    /// assert_eq!(m.cell(0).unwrap().nodes, &[1, 0]);
    /// assert_eq!(m.coords().unwrap().read().as_slice(), &[1.0, 3.0]);
    /// ```
    pub fn zip_coords_traducer(&mut self) -> MeshResult<Vec<i64>> {
        let (old_to_new, used) = self.get_node_ids_in_use()?;
        let before = old_to_new.len();
        if used < before {
            self.renumber_nodes(&old_to_new, used)?;
        }
        debug!(before, after = used, "unused nodes removed");
        Ok(old_to_new)
    }

    /// Drop the unused nodes.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::compute_fetched_nodes`].
    pub fn zip_coords(&mut self) -> MeshResult<()> {
        self.zip_coords_traducer().map(|_| ())
    }

    /// Move node `i` to `old_to_new[i]` in both coordinates and
    /// connectivity. The coordinates go to a new buffer.
    ///
    /// # Errors
    ///
    /// See [`UMesh::renumber_nodes_in_conn`] and
    /// [`PointSet::renumber_coords`](crate::PointSet::renumber_coords).
    pub fn renumber_nodes(&mut self, old_to_new: &[i64], new_count: usize) -> MeshResult<()> {
        self.renumber_nodes_in_conn(old_to_new)?;
        self.point_set_mut().renumber_coords(old_to_new, new_count)
    }

    /// Like [`UMesh::renumber_nodes`], merged nodes landing on their
    /// barycenter.
    ///
    /// # Errors
    ///
    /// See [`UMesh::renumber_nodes`].
    pub fn renumber_nodes_center(
        &mut self,
        old_to_new: &[i64],
        new_count: usize,
    ) -> MeshResult<()> {
        self.renumber_nodes_in_conn(old_to_new)?;
        self.point_set_mut()
            .renumber_coords_center(old_to_new, new_count)
    }

    /// Rewrite every node id of the connectivity through `old_to_new`.
    /// Coordinates are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::OutOfRange`] for a node id without entry in the
    /// array, or mapped to a negative id.
    pub fn renumber_nodes_in_conn(&mut self, old_to_new: &[i64]) -> MeshResult<()> {
        let conn = self.connectivity_mut()?;
        for g in 0..conn.len() {
            let group = conn.group_mut(g);
            let polyhedron = group.first() == Some(&GeometricType::Polyhedron.code());
            for node in group.iter_mut().skip(1) {
                if polyhedron && *node == FACE_SEPARATOR {
                    continue;
                }
                let new = to_index(*node)
                    .and_then(|k| old_to_new.get(k))
                    .copied()
                    .filter(|&v| v >= 0)
                    .ok_or_else(|| {
                        MeshError::out_of_range(
                            format!("renumbered node of cell {g}"),
                            *node,
                            old_to_new.len(),
                        )
                    })?;
                *node = new;
            }
        }
        Ok(())
    }

    /// Merge nodes closer than `precision`, keeping the coordinates of the
    /// lowest node of each group.
    ///
    /// Returns the old-to-new node array, whether anything was merged and
    /// the new node count.
    ///
    /// # Errors
    ///
    /// See [`PointSet::find_coincident_nodes`](crate::PointSet::find_coincident_nodes)
    /// and [`UMesh::renumber_nodes`].
    pub fn merge_nodes(&mut self, precision: f64) -> MeshResult<(Vec<i64>, bool, usize)> {
        self.merge_nodes_with(precision, false)
    }

    /// Like [`UMesh::merge_nodes`], each merged node moving to the barycenter
    /// of its group.
    ///
    /// # Errors
    ///
    /// See [`UMesh::merge_nodes`].
    pub fn merge_nodes_center(&mut self, precision: f64) -> MeshResult<(Vec<i64>, bool, usize)> {
        self.merge_nodes_with(precision, true)
    }

    fn merge_nodes_with(
        &mut self,
        precision: f64,
        center: bool,
    ) -> MeshResult<(Vec<i64>, bool, usize)> {
        let groups = self.point_set().find_coincident_nodes(precision, None)?;
        let (old_to_new, new_count) = self
            .point_set()
            .build_permutation_removing_duplicates(&groups)?;
        let merged = new_count != old_to_new.len();
        if merged {
            if center {
                self.renumber_nodes_center(&old_to_new, new_count)?;
            } else {
                self.renumber_nodes(&old_to_new, new_count)?;
            }
        }
        debug!(
            groups = groups.len(),
            before = old_to_new.len(),
            after = new_count,
            "coincident nodes merged"
        );
        Ok((old_to_new, merged, new_count))
    }
}
