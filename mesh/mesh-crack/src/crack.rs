//! Crack insertion and opening.

use std::collections::{BTreeMap, BTreeSet};

use mesh_types::{IndexedArray, MeshError, to_id, to_index};
use mesh_unstructured::{CellComparePolicy, Descending, DescendingNumbering, UMesh};
use mesh_zones::partition_by_spread_zone;
use tracing::{debug, info, warn};

use crate::error::{CrackError, CrackResult};

/// Node renumbering per cell: `cell -> (old node -> new node)`.
pub type CellNodeMap = BTreeMap<usize, BTreeMap<i64, i64>>;

/// Parameters for [`crack_along`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrackParams {
    /// Reject a crack face whose nodes all stay shared between its two
    /// cells with [`CrackError::NotDuplicated`]. When false such a face is
    /// still copied, with the same nodes as the original.
    pub group_must_be_fully_duplicated: bool,
}

impl Default for CrackParams {
    fn default() -> Self {
        Self {
            group_must_be_fully_duplicated: true,
        }
    }
}

impl CrackParams {
    /// Set whether every crack face must get new nodes.
    #[must_use]
    pub const fn with_group_must_be_fully_duplicated(mut self, strict: bool) -> Self {
        self.group_must_be_fully_duplicated = strict;
        self
    }
}

/// What [`crack_along`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrackOutcome {
    /// The face group as given.
    pub group: Vec<usize>,
    /// For each cell that lost nodes, the old-to-new node map.
    pub cell_old_to_new_nodes: CellNodeMap,
    /// `(original, copy)` face ids in the face mesh, one per crack face.
    pub duplicated_faces: Vec<(usize, usize)>,
    /// For each split node, the nodes created from it.
    pub added_nodes: BTreeMap<i64, BTreeSet<i64>>,
}

impl CrackOutcome {
    /// The face group once the copies are added to it, ascending.
    #[must_use]
    pub fn group_after(&self) -> Vec<usize> {
        let mut ids: BTreeSet<usize> = self.group.iter().copied().collect();
        ids.extend(self.duplicated_faces.iter().map(|&(_, copy)| copy));
        ids.into_iter().collect()
    }

    /// Number of nodes appended to the coordinates.
    #[must_use]
    pub fn number_of_added_nodes(&self) -> usize {
        self.added_nodes.values().map(BTreeSet::len).sum()
    }
}

/// Open a crack along the faces `group` of `m1`.
///
/// `m0` holds the cells, `m1` faces of dimension one less over the same
/// coordinates. Group faces lying on the skin of `m0` are left alone. Around
/// each node of the remaining faces, the cells are split into the sets still
/// connected without crossing the crack; every set but the first gets a copy
/// of the node, appended to the shared coordinates. Then each crack face is
/// copied at the end of `m1`: the original keeps the nodes of its first
/// owner cell, the copy takes those of the second. Other faces of `m1`
/// touching a split node follow their first owner cell.
///
/// # Errors
///
/// - [`CrackError::LevelMismatch`] if `m1` is not one dimension below `m0`
///   on the same coordinates
/// - [`CrackError::NotIncluded`] if a crack face, or a face next to the
///   crack, is not a face of a cell of `m0`
/// - [`CrackError::NotInnerFace`] if a crack face is not shared by exactly
///   two cells
/// - [`CrackError::NotDuplicated`] if a crack face keeps all its nodes and
///   [`CrackParams::group_must_be_fully_duplicated`] is set
/// - [`CrackError::IncoherentConnectivity`] if the two cells around a face
///   next to the crack disagree on a new node
/// - [`CrackError::Mesh`] for a bad face id or an unconfigured mesh
///
/// Errors raised once nodes are split leave both meshes partially cracked.
///
/// # Example
///
/// ```
/// use mesh_crack::{CrackParams, crack_along};
/// use mesh_types::{Coords, GeometricType};
/// use mesh_unstructured::{DescendingNumbering, UMesh};
///
/// // two squares sharing the edge 1-4
/// let mut m0 = UMesh::new(2);
/// m0.set_coords(
///     Coords::new(vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0], 2).unwrap(),
/// );
/// m0.allocate_cells(2);
/// m0.insert_next_cell(GeometricType::Quad4, &[0, 1, 4, 3]).unwrap();
/// m0.insert_next_cell(GeometricType::Quad4, &[1, 2, 5, 4]).unwrap();
/// m0.finish_inserting_cells();
///
/// let mut m1 = m0
///     .build_descending_connectivity(1, DescendingNumbering::Plain)
///     .unwrap()
///     .mesh;
/// let shared = (0..m1.number_of_cells().unwrap())
///     .find(|&f| m1.cell(f).unwrap().nodes == [1, 4])
///     .unwrap();
///
/// let outcome = crack_along(&mut m0, &mut m1, &[shared], &CrackParams::default()).unwrap();
/// assert_eq!(m0.number_of_nodes().unwrap(), 8);
/// assert_eq!(outcome.group_after().len(), 2);
/// ```
pub fn crack_along(
    m0: &mut UMesh,
    m1: &mut UMesh,
    group: &[usize],
    params: &CrackParams,
) -> CrackResult<CrackOutcome> {
    check_levels(m0, m1)?;

    let group_mesh = m1.build_part_of_my_self(group, true)?;
    let kept = faces_off_skin(m0, &group_mesh)?;
    if kept.len() < group.len() {
        debug!(
            skipped = group.len() - kept.len(),
            "crack faces on the skin left untouched"
        );
    }
    let crack = group_mesh.build_part_of_my_self(&kept, true)?;

    let d = m0.build_descending_connectivity(1, DescendingNumbering::Plain)?;
    let dup_in_mf = matched_ids(
        d.mesh.are_cells_included_in(&crack, CellComparePolicy::Nodal)?,
        "crack group among the cell faces",
    )?;
    let dup_in_m1 = matched_ids(
        m1.are_cells_included_in(&crack, CellComparePolicy::Nodal)?,
        "crack group in the face mesh",
    )?;

    let node_to_cells = m0.reverse_nodal_connectivity()?;
    let node_cells = cells_around_crack_nodes(&d.mesh, &node_to_cells, &dup_in_mf)?;
    let graph = cut_cell_graph(&d, &node_cells, &dup_in_mf);
    // taken before the face mesh changes
    let (change_in_m1, change_in_mf) =
        faces_touching_crack_nodes(m1, &d.mesh, &node_cells, &dup_in_m1)?;

    let cell_old_to_new_nodes = split_crack_nodes(m0, &node_cells, &graph)?;

    let mut faces = m1.connectivity()?.clone();
    let duplicated_faces = duplicate_crack_faces(
        &mut faces,
        &d.rev_desc,
        &dup_in_m1,
        &dup_in_mf,
        &cell_old_to_new_nodes,
        params,
    )?;
    renumber_faces_near_crack(
        &mut faces,
        &d.rev_desc,
        &change_in_m1,
        &change_in_mf,
        &cell_old_to_new_nodes,
    )?;
    m1.set_connectivity(faces, true)?;

    let mut added_nodes: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for map in cell_old_to_new_nodes.values() {
        for (&old, &new) in map {
            added_nodes.entry(old).or_default().insert(new);
        }
    }

    let outcome = CrackOutcome {
        group: group.to_vec(),
        cell_old_to_new_nodes,
        duplicated_faces,
        added_nodes,
    };
    info!(
        faces = outcome.duplicated_faces.len(),
        nodes = outcome.number_of_added_nodes(),
        cells = outcome.cell_old_to_new_nodes.len(),
        "crack inserted"
    );
    Ok(outcome)
}

/// Move the nodes created by a crack toward the center of their cell.
///
/// Each new node moves by `(1 - factor)` times the vector from its original
/// node to the center of mass of the cell, once per cell using it. A factor
/// close to 1 leaves the crack nearly closed.
///
/// # Errors
///
/// Returns [`CrackError::InvalidFactor`] unless `0 < factor < 1` and
/// [`CrackError::Mesh`] if the outcome does not match `m0`.
pub fn open_crack(m0: &UMesh, outcome: &CrackOutcome, factor: f64) -> CrackResult<()> {
    if factor.is_nan() || factor <= 0.0 || factor >= 1.0 {
        return Err(CrackError::InvalidFactor(factor));
    }
    let centers = m0.compute_cell_center_of_mass()?;
    let dim = m0.space_dimension()?;
    let cells = m0.number_of_cells()?;
    let mut coords = m0.coords()?.write();
    let count = coords.number_of_nodes();
    let node = |id: i64| {
        to_index(id)
            .filter(|&i| i < count)
            .ok_or_else(|| MeshError::out_of_range("cracked node", id, count))
    };

    for (&cell, map) in &outcome.cell_old_to_new_nodes {
        if cell >= cells {
            return Err(MeshError::out_of_range("cracked cell", to_id(cell), cells).into());
        }
        let center = &centers[cell * dim..(cell + 1) * dim];
        for (&old, &new) in map {
            let origin = coords.node(node(old)?).to_vec();
            for ((x, c), o) in coords.node_mut(node(new)?).iter_mut().zip(center).zip(&origin) {
                *x += (1.0 - factor) * (c - o);
            }
        }
    }
    debug!(factor, cells = outcome.cell_old_to_new_nodes.len(), "crack opened");
    Ok(())
}

fn check_levels(m0: &UMesh, m1: &UMesh) -> CrackResult<()> {
    let (d0, d1) = (m0.mesh_dimension()?, m1.mesh_dimension()?);
    if d1 + 1 != d0 {
        return Err(CrackError::level_mismatch(format!(
            "cells of dimension {d0} with faces of dimension {d1}"
        )));
    }
    if !m0.coords()?.ptr_eq(m1.coords()?) {
        return Err(CrackError::level_mismatch(
            "the face mesh does not share the cell coordinates",
        ));
    }
    Ok(())
}

/// Positions in `group_mesh` of the faces not on the skin of `m0`.
fn faces_off_skin(m0: &UMesh, group_mesh: &UMesh) -> CrackResult<Vec<usize>> {
    let skin = m0.compute_skin()?;
    let (_, on_skin) = skin.are_cells_included_in(group_mesh, CellComparePolicy::Nodal)?;
    Ok(on_skin
        .iter()
        .enumerate()
        .filter_map(|(k, &m)| (m < 0).then_some(k))
        .collect())
}

fn matched_ids((all, ids): (bool, Vec<i64>), context: &str) -> CrackResult<Vec<usize>> {
    if !all {
        let missing = ids.iter().filter(|&&m| m < 0).count();
        return Err(CrackError::not_included(context, missing));
    }
    Ok(ids.into_iter().filter_map(to_index).collect())
}

/// For each node of a crack face, the cells using it.
fn cells_around_crack_nodes(
    faces: &UMesh,
    node_to_cells: &IndexedArray,
    crack: &[usize],
) -> CrackResult<BTreeMap<i64, BTreeSet<usize>>> {
    let mut around: BTreeMap<i64, BTreeSet<usize>> = BTreeMap::new();
    for &face in crack {
        for node in faces.cell(face)?.node_ids() {
            let i = to_index(node)
                .filter(|&i| i < node_to_cells.len())
                .ok_or_else(|| MeshError::out_of_range("crack node", node, node_to_cells.len()))?;
            around
                .entry(node)
                .or_default()
                .extend(node_to_cells.group(i).iter().filter_map(|&c| to_index(c)));
        }
    }
    Ok(around)
}

/// Cell adjacency through faces off the crack, among cells touching it.
fn cut_cell_graph(
    d: &Descending,
    node_cells: &BTreeMap<i64, BTreeSet<usize>>,
    crack: &[usize],
) -> BTreeMap<usize, BTreeSet<usize>> {
    let touching: BTreeSet<usize> = node_cells.values().flatten().copied().collect();
    let crack: BTreeSet<usize> = crack.iter().copied().collect();
    touching
        .iter()
        .map(|&cell| {
            let around: BTreeSet<usize> = d
                .entities_of(cell)
                .filter(|(face, _)| !crack.contains(face))
                .flat_map(|(face, _)| d.rev_desc.group(face).iter().filter_map(|&c| to_index(c)))
                .filter(|other| *other != cell && touching.contains(other))
                .collect();
            (cell, around)
        })
        .collect()
}

/// Faces of `m1` off the crack using a crack node, with their ids among the
/// cell faces.
fn faces_touching_crack_nodes(
    m1: &UMesh,
    cell_faces: &UMesh,
    node_cells: &BTreeMap<i64, BTreeSet<usize>>,
    crack_in_m1: &[usize],
) -> CrackResult<(Vec<usize>, Vec<usize>)> {
    let crack: BTreeSet<usize> = crack_in_m1.iter().copied().collect();
    let node_to_faces = m1.reverse_nodal_connectivity()?;
    let mut touching = BTreeSet::new();
    for &node in node_cells.keys() {
        let Some(i) = to_index(node).filter(|&i| i < node_to_faces.len()) else {
            continue;
        };
        touching.extend(
            node_to_faces
                .group(i)
                .iter()
                .filter_map(|&f| to_index(f))
                .filter(|f| !crack.contains(f)),
        );
    }
    let in_m1: Vec<usize> = touching.into_iter().collect();
    let part = m1.build_part_of_my_self(&in_m1, true)?;
    let in_mf = matched_ids(
        cell_faces.are_cells_included_in(&part, CellComparePolicy::Nodal)?,
        "faces next to the crack",
    )?;
    Ok((in_m1, in_mf))
}

/// Give each extra connected set of cells around a crack node its own copy
/// of the node.
fn split_crack_nodes(
    m0: &mut UMesh,
    node_cells: &BTreeMap<i64, BTreeSet<usize>>,
    graph: &BTreeMap<usize, BTreeSet<usize>>,
) -> CrackResult<CellNodeMap> {
    let mut conn = m0.connectivity()?.clone();
    let mut old_to_new = CellNodeMap::new();
    {
        let mut coords = m0.coords()?.write();
        for (&node, cells) in node_cells {
            let local: Vec<usize> = cells.iter().copied().collect();
            let mut sub = IndexedArray::with_capacity(local.len(), local.len() * 4);
            for cell in &local {
                let around = graph.get(cell).ok_or_else(|| {
                    MeshError::invalid_argument(format!(
                        "cell {cell} touches crack node {node} but is not in the cut graph"
                    ))
                })?;
                sub.push_group(
                    around
                        .iter()
                        .filter_map(|n| local.binary_search(n).ok())
                        .map(to_id),
                );
            }
            let parts = partition_by_spread_zone(&sub)
                .map_err(|e| MeshError::invalid_argument(e.to_string()))?;
            if parts.len() < 2 {
                continue;
            }
            let origin = to_index(node)
                .filter(|&i| i < coords.number_of_nodes())
                .ok_or_else(|| {
                    MeshError::out_of_range("crack node", node, coords.number_of_nodes())
                })?;
            let point = coords.node(origin).to_vec();
            for part in &parts[1..] {
                let new = to_id(coords.push_node(&point)?);
                for &k in part {
                    let cell = local[k];
                    replace_node(conn.group_mut(cell), node, new);
                    old_to_new.entry(cell).or_default().insert(node, new);
                }
            }
            debug!(node, copies = parts.len() - 1, "crack node split");
        }
    }
    m0.set_connectivity(conn, true)?;
    Ok(old_to_new)
}

/// Replace `old` by `new` past the leading type code.
fn replace_node(group: &mut [i64], old: i64, new: i64) {
    for v in group.iter_mut().skip(1) {
        if *v == old {
            *v = new;
        }
    }
}

/// Apply `map` past the leading type code; whether anything changed.
fn remap(group: &mut [i64], map: Option<&BTreeMap<i64, i64>>) -> bool {
    let Some(map) = map else {
        return false;
    };
    let mut changed = false;
    for v in group.iter_mut().skip(1) {
        let old = *v;
        if let Some(&new) = map.get(&old) {
            *v = new;
            changed = true;
        }
    }
    changed
}

fn duplicate_crack_faces(
    faces: &mut IndexedArray,
    face_owners: &IndexedArray,
    crack_in_m1: &[usize],
    crack_in_mf: &[usize],
    old_to_new: &CellNodeMap,
    params: &CrackParams,
) -> CrackResult<Vec<(usize, usize)>> {
    let mut pairs = Vec::with_capacity(crack_in_m1.len());
    for (&face, &face_mf) in crack_in_m1.iter().zip(crack_in_mf) {
        let owners = face_owners.group(face_mf);
        let &[cell0, cell1] = owners else {
            return Err(CrackError::NotInnerFace {
                face,
                owners: owners.len(),
            });
        };
        let map_of = |cell: i64| to_index(cell).and_then(|c| old_to_new.get(&c));

        let copy = faces.len();
        faces.push_group(faces.group(face).to_vec());
        let first = remap(faces.group_mut(face), map_of(cell0));
        let second = remap(faces.group_mut(copy), map_of(cell1));
        if !(first || second) {
            if params.group_must_be_fully_duplicated {
                return Err(CrackError::NotDuplicated { face });
            }
            warn!(face, "crack face copied without new nodes");
        }
        pairs.push((face, copy));
    }
    Ok(pairs)
}

fn renumber_faces_near_crack(
    faces: &mut IndexedArray,
    face_owners: &IndexedArray,
    change_in_m1: &[usize],
    change_in_mf: &[usize],
    old_to_new: &CellNodeMap,
) -> CrackResult<()> {
    for (&face, &face_mf) in change_in_m1.iter().zip(change_in_mf) {
        let owners = face_owners.group(face_mf);
        let map_of = |k: usize| {
            owners
                .get(k)
                .and_then(|&c| to_index(c))
                .and_then(|c| old_to_new.get(&c))
        };
        let Some(first) = map_of(0) else {
            continue;
        };
        let second = map_of(1);
        for v in faces.group_mut(face).iter_mut().skip(1) {
            let old = *v;
            let Some(&new) = first.get(&old) else {
                continue;
            };
            if owners.len() == 2 && second.and_then(|m| m.get(&old)) != Some(&new) {
                return Err(CrackError::IncoherentConnectivity { face, node: old });
            }
            *v = new;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{Coords, GeometricType};

    /// `nx` x `ny` unit squares, counter-clockwise.
    fn quad_grid(nx: i64, ny: i64) -> UMesh {
        let mut xyz = Vec::new();
        for j in 0..=ny {
            for i in 0..=nx {
                xyz.extend([i as f64, j as f64]);
            }
        }
        let mut m = UMesh::new(2);
        m.set_coords(Coords::new(xyz, 2).unwrap());
        m.allocate_cells(usize::try_from(nx * ny).unwrap());
        let id = |i: i64, j: i64| j * (nx + 1) + i;
        for j in 0..ny {
            for i in 0..nx {
                m.insert_next_cell(
                    GeometricType::Quad4,
                    &[id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)],
                )
                .unwrap();
            }
        }
        m.finish_inserting_cells();
        m
    }

    fn faces_of(m0: &UMesh) -> UMesh {
        m0.build_descending_connectivity(1, DescendingNumbering::Plain)
            .unwrap()
            .mesh
    }

    fn face_with(m1: &UMesh, a: i64, b: i64) -> usize {
        (0..m1.number_of_cells().unwrap())
            .find(|&f| {
                let n = m1.cell(f).unwrap().nodes;
                n == [a, b] || n == [b, a]
            })
            .unwrap()
    }

    #[test]
    fn test_params_builder() {
        assert!(CrackParams::default().group_must_be_fully_duplicated);
        let p = CrackParams::default().with_group_must_be_fully_duplicated(false);
        assert!(!p.group_must_be_fully_duplicated);
    }

    #[test]
    fn test_crack_through_two_squares() {
        let mut m0 = quad_grid(2, 1);
        let mut m1 = faces_of(&m0);
        let faces = m1.number_of_cells().unwrap();
        let shared = face_with(&m1, 1, 4);

        let outcome = crack_along(&mut m0, &mut m1, &[shared], &CrackParams::default()).unwrap();

        assert_eq!(m0.number_of_nodes().unwrap(), 8);
        assert_eq!(m0.cell(0).unwrap().nodes, &[0, 1, 4, 3]);
        assert_eq!(m0.cell(1).unwrap().nodes, &[6, 2, 5, 7]);
        assert_eq!(outcome.duplicated_faces, vec![(shared, faces)]);
        assert_eq!(outcome.group_after(), vec![shared, faces]);
        assert_eq!(m1.cell(shared).unwrap().nodes, &[1, 4]);
        assert_eq!(m1.cell(faces).unwrap().nodes, &[6, 7]);
        assert_eq!(outcome.number_of_added_nodes(), 2);
        assert_eq!(outcome.added_nodes[&1], BTreeSet::from([6]));
        assert_eq!(outcome.added_nodes[&4], BTreeSet::from([7]));

        // the boundary edges of the second square follow it
        assert!(face_with(&m1, 6, 2) < faces);
        assert!(face_with(&m1, 5, 7) < faces);
        assert!(m0.compute_neighbors_of_cells().unwrap().group(0).is_empty());
        {
            let coords = m0.coords().unwrap().read();
            assert_eq!(coords.node(6), coords.node(1));
        }

        open_crack(&m0, &outcome, 0.5).unwrap();
        let coords = m0.coords().unwrap().read();
        assert_relative_eq!(coords.node(6)[0], 1.25);
        assert_relative_eq!(coords.node(6)[1], 0.25);
        assert_relative_eq!(coords.node(7)[0], 1.25);
        assert_relative_eq!(coords.node(7)[1], 0.75);
        assert_eq!(coords.node(1), &[1.0, 0.0]);
    }

    #[test]
    fn test_skin_faces_are_ignored() {
        let mut m0 = quad_grid(2, 1);
        let mut m1 = faces_of(&m0);
        let bottom = face_with(&m1, 0, 1);
        let outcome = crack_along(&mut m0, &mut m1, &[bottom], &CrackParams::default()).unwrap();
        assert!(outcome.duplicated_faces.is_empty());
        assert_eq!(outcome.group_after(), vec![bottom]);
        assert_eq!(m0.number_of_nodes().unwrap(), 6);
    }

    #[test]
    fn test_interior_face_without_free_node() {
        // edge 5-6 joins two interior nodes of a 3 x 3 grid
        let mut m0 = quad_grid(3, 3);
        let mut m1 = faces_of(&m0);
        let face = face_with(&m1, 5, 6);
        let err = crack_along(&mut m0.clone(), &mut m1.clone(), &[face], &CrackParams::default())
            .unwrap_err();
        assert_eq!(err, CrackError::NotDuplicated { face });

        let lenient = CrackParams::default().with_group_must_be_fully_duplicated(false);
        let outcome = crack_along(&mut m0, &mut m1, &[face], &lenient).unwrap();
        assert!(outcome.added_nodes.is_empty());
        let (_, copy) = outcome.duplicated_faces[0];
        assert_eq!(m1.cell(copy).unwrap().nodes, m1.cell(face).unwrap().nodes);
    }

    #[test]
    fn test_non_manifold_edge() {
        let coords = Coords::new(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0,
            ],
            3,
        )
        .unwrap();
        let mut m0 = UMesh::new(2);
        m0.set_coords(coords);
        m0.allocate_cells(3);
        for apex in 2..5 {
            m0.insert_next_cell(GeometricType::Tri3, &[0, 1, apex]).unwrap();
        }
        m0.finish_inserting_cells();
        let mut m1 = faces_of(&m0);
        let hinge = face_with(&m1, 0, 1);
        let err = crack_along(&mut m0, &mut m1, &[hinge], &CrackParams::default()).unwrap_err();
        assert_eq!(
            err,
            CrackError::NotInnerFace {
                face: hinge,
                owners: 3
            }
        );
    }

    #[test]
    fn test_group_outside_cell_faces() {
        let mut m0 = quad_grid(2, 1);
        let mut m1 = UMesh::new(1);
        m1.set_coords(m0.coords().unwrap().clone());
        m1.allocate_cells(1);
        m1.insert_next_cell(GeometricType::Seg2, &[0, 4]).unwrap();
        m1.finish_inserting_cells();
        let err = crack_along(&mut m0, &mut m1, &[0], &CrackParams::default()).unwrap_err();
        assert!(matches!(err, CrackError::NotIncluded { missing: 1, .. }));
    }

    #[test]
    fn test_level_mismatch() {
        let mut m0 = quad_grid(1, 1);
        let mut m1 = m0.clone();
        let err = crack_along(&mut m0, &mut m1, &[0], &CrackParams::default()).unwrap_err();
        assert!(matches!(err, CrackError::LevelMismatch(_)));

        let mut other = faces_of(&m0.deep_copy());
        let err = crack_along(&mut m0, &mut other, &[0], &CrackParams::default()).unwrap_err();
        assert!(matches!(err, CrackError::LevelMismatch(_)));
    }

    #[test]
    fn test_open_crack_rejects_factor() {
        let m0 = quad_grid(1, 1);
        let outcome = CrackOutcome::default();
        for factor in [0.0, 1.0, -0.5, 2.0, f64::NAN] {
            assert!(matches!(
                open_crack(&m0, &outcome, factor),
                Err(CrackError::InvalidFactor(_))
            ));
        }
        assert!(open_crack(&m0, &outcome, 0.9).is_ok());
    }
}
