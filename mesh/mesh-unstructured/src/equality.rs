//! Cell comparison and detection of duplicated cells.

use mesh_types::{
    GeometricType, IndexedArray, MeshError, MeshResult,
    convert_index_array_to_old_to_new, invert_old_to_new, to_id, to_index,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::params::{CellComparePolicy, CellEquality};
use crate::umesh::{CellRef, UMesh};

/// Compare two cells under `policy`.
///
/// Quadratic cells compare their corners and mid-edge nodes together: a
/// rotation of the corners must carry the mid nodes along.
///
/// # Errors
///
/// Returns [`MeshError::NotImplemented`] for the permutation policies on
/// two 3D cells of the same type and size.
///
/// # Example
///
/// ```
/// use mesh_types::GeometricType;
/// use mesh_unstructured::{CellComparePolicy, CellEquality, CellRef, are_cells_equal};
///
/// let a = CellRef { ty: GeometricType::Quad4, nodes: &[0, 1, 2, 3] };
/// let b = CellRef { ty: GeometricType::Quad4, nodes: &[2, 1, 0, 3] };
/// let policy = CellComparePolicy::PermutedAnyOrientation;
/// assert_eq!(are_cells_equal(&a, &b, policy).unwrap(), CellEquality::Reversed);
/// let exact = are_cells_equal(&a, &b, CellComparePolicy::Exact).unwrap();
/// assert_eq!(exact, CellEquality::NotEqual);
/// ```
pub fn are_cells_equal(
    a: &CellRef<'_>,
    b: &CellRef<'_>,
    policy: CellComparePolicy,
) -> MeshResult<CellEquality> {
    let equal = match policy {
        CellComparePolicy::Exact => a.ty == b.ty && a.nodes == b.nodes,
        CellComparePolicy::Nodal => a.ty == b.ty && node_set(a) == node_set(b),
        CellComparePolicy::NodalNoType => node_set(a) == node_set(b),
        CellComparePolicy::PermutedSameOrientation | CellComparePolicy::PermutedAnyOrientation => {
            return compare_permuted(a, b, policy == CellComparePolicy::PermutedAnyOrientation);
        }
    };
    Ok(if equal {
        CellEquality::Same
    } else {
        CellEquality::NotEqual
    })
}

fn node_set(cell: &CellRef<'_>) -> SmallVec<[i64; 16]> {
    let mut set: SmallVec<[i64; 16]> = cell.node_ids().collect();
    set.sort_unstable();
    set.dedup();
    set
}

fn compare_permuted(a: &CellRef<'_>, b: &CellRef<'_>, any_orientation: bool) -> MeshResult<CellEquality> {
    if a.ty != b.ty || a.nodes.len() != b.nodes.len() {
        return Ok(CellEquality::NotEqual);
    }
    match a.ty.dimension() {
        0 => Ok(equality_of(a.nodes == b.nodes)),
        1 => {
            if a.nodes == b.nodes {
                return Ok(CellEquality::Same);
            }
            if any_orientation && is_reversed_1d(a.ty, a.nodes, b.nodes) {
                return Ok(CellEquality::Reversed);
            }
            Ok(CellEquality::NotEqual)
        }
        2 => {
            if is_rotation_2d(a.ty, a.nodes, b.nodes) {
                return Ok(CellEquality::Same);
            }
            if any_orientation {
                let mut reversed: SmallVec<[i64; 16]> = SmallVec::from_slice(b.nodes);
                mesh_types::reverse_2d(b.ty, &mut reversed);
                if is_rotation_2d(a.ty, a.nodes, &reversed) {
                    return Ok(CellEquality::Reversed);
                }
            }
            Ok(CellEquality::NotEqual)
        }
        _ => Err(MeshError::not_implemented(format!(
            "permutation comparison of 3D cells ({})",
            a.ty
        ))),
    }
}

const fn equality_of(equal: bool) -> CellEquality {
    if equal {
        CellEquality::Same
    } else {
        CellEquality::NotEqual
    }
}

fn is_reversed_1d(ty: GeometricType, a: &[i64], b: &[i64]) -> bool {
    if ty == GeometricType::Polyline {
        return a.iter().eq(b.iter().rev());
    }
    a.len() >= 2 && a[0] == b[1] && a[1] == b[0] && a[2..] == b[2..]
}

/// Whether `b` is `a` with its ring of corners (and mid nodes) rotated.
fn is_rotation_2d(ty: GeometricType, a: &[i64], b: &[i64]) -> bool {
    let k = ty.corner_count(a.len());
    if k == 0 {
        return a == b;
    }
    let mids = if ty.is_quadratic() {
        k.min(a.len() - k)
    } else {
        0
    };
    let rest = k + mids;
    if a[rest..] != b[rest..] {
        return false;
    }
    (0..k).any(|r| {
        (0..k).all(|i| a[i] == b[(i + r) % k])
            && (0..mids).all(|i| a[k + i] == b[k + (i + r) % k])
    })
}

/// Groups of mutually equal cells, each ascending.
///
/// Cells from `start` onward seed the searches. Candidate partners of a
/// seed share all its nodes, found by intersecting the reverse nodal lists
/// of its nodes. With `start > 0` the cells below `start` are assumed free
/// of duplicates among themselves but can still pair with later cells.
pub(crate) fn find_common_cells_in(
    conn: &IndexedArray,
    rev_nodal: &IndexedArray,
    policy: CellComparePolicy,
    start: usize,
) -> MeshResult<IndexedArray> {
    let n = conn.len();
    let mut fetched = vec![false; n];
    let mut groups = IndexedArray::new();
    let mut candidates: Vec<i64> = Vec::new();
    let mut members: Vec<usize> = Vec::new();
    for i in start..n {
        if fetched[i] {
            continue;
        }
        let cell = CellRef::parse(i, conn.group(i))?;
        let mut nodes = cell.node_ids();
        let Some(first) = nodes.next() else {
            continue;
        };
        candidates.clear();
        candidates.extend_from_slice(rev_nodal_group(rev_nodal, first)?);
        for node in nodes {
            if candidates.len() <= 1 {
                break;
            }
            let others = rev_nodal_group(rev_nodal, node)?;
            candidates.retain(|c| others.binary_search(c).is_ok());
        }
        members.clear();
        for &c in &candidates {
            let Some(j) = to_index(c) else {
                continue;
            };
            let eligible = j != i && !fetched[j] && (j > i || j < start);
            if eligible {
                let other = CellRef::parse(j, conn.group(j))?;
                if are_cells_equal(&cell, &other, policy)?.is_equal() {
                    members.push(j);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        members.push(i);
        members.sort_unstable();
        for &m in &members {
            fetched[m] = true;
        }
        groups.push_group(members.iter().map(|&m| to_id(m)));
    }
    Ok(groups)
}

fn rev_nodal_group(rev_nodal: &IndexedArray, node: i64) -> MeshResult<&[i64]> {
    to_index(node)
        .filter(|&k| k < rev_nodal.len())
        .map(|k| rev_nodal.group(k))
        .ok_or_else(|| MeshError::out_of_range("node of a compared cell", node, rev_nodal.len()))
}

impl UMesh {
    /// Groups of equal cells under `policy`, see [`are_cells_equal`].
    ///
    /// Every cell from `start_cell_id` on seeds a search. When
    /// `start_cell_id > 0`, cells below it take part only as partners of
    /// later cells, which deduplicates freshly appended cells against a
    /// prefix known to be unique.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates or
    /// connectivity and [`MeshError::OutOfRange`] for a bad node id.
    pub fn find_common_cells(
        &self,
        policy: CellComparePolicy,
        start_cell_id: usize,
    ) -> MeshResult<IndexedArray> {
        let rev_nodal = self.reverse_nodal_connectivity()?;
        let groups = find_common_cells_in(self.connectivity()?, &rev_nodal, policy, start_cell_id)?;
        debug!(
            cells = self.number_of_cells()?,
            groups = groups.len(),
            policy = policy.code(),
            "common cells found"
        );
        Ok(groups)
    }

    /// Remove duplicated cells, keeping the first of each group.
    ///
    /// Returns the old-to-new cell array: a removed cell maps to the new id
    /// of the cell it duplicates.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::find_common_cells`].
    pub fn zip_connectivity_traducer(
        &mut self,
        policy: CellComparePolicy,
        start_cell_id: usize,
    ) -> MeshResult<Vec<usize>> {
        let n = self.number_of_cells()?;
        let groups = self.find_common_cells(policy, start_cell_id)?;
        let (old_to_new, new_count) = convert_index_array_to_old_to_new(n, &groups)?;
        let kept: Vec<usize> = invert_old_to_new(&old_to_new, new_count)?
            .into_iter()
            .filter_map(to_index)
            .collect();
        let conn = self.connectivity()?.extract_groups(&kept)?;
        self.replace_connectivity(conn)?;
        debug!(before = n, after = new_count, "duplicated cells removed");
        Ok(old_to_new.into_iter().filter_map(to_index).collect())
    }

    /// Whether every cell of `other` has an equal cell in this mesh.
    ///
    /// Also returns, for each cell of `other`, the id of its match here or
    /// `-1`. Both meshes must share their coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidArgument`] if the coordinates are not
    /// shared and [`MeshError::DimensionMismatch`] if the mesh dimensions
    /// differ.
    pub fn are_cells_included_in(
        &self,
        other: &Self,
        policy: CellComparePolicy,
    ) -> MeshResult<(bool, Vec<i64>)> {
        if !self.point_set().shares_coords_with(other.point_set()) {
            return Err(MeshError::invalid_argument(
                "inclusion test needs meshes sharing the same coordinates",
            ));
        }
        let (dim, other_dim) = (self.mesh_dimension()?, other.mesh_dimension()?);
        if dim != other_dim {
            return Err(MeshError::dimension_mismatch(
                "inclusion test",
                to_id(dim),
                to_id(other_dim),
            ));
        }
        let own = self.connectivity()?;
        let mut merged = own.clone();
        for group in other.connectivity()?.iter() {
            merged.push_group(group.iter().copied());
        }
        let mut both = self.clone();
        both.set_connectivity(merged, false)?;
        let groups = both.find_common_cells(policy, own.len())?;

        let mut matches = vec![-1_i64; other.number_of_cells()?];
        for group in groups.iter() {
            let Some(&head) = group.first() else {
                continue;
            };
            if to_index(head).is_none_or(|h| h >= own.len()) {
                continue;
            }
            for &member in &group[1..] {
                if let Some(k) = to_index(member).and_then(|m| m.checked_sub(own.len())) {
                    matches[k] = head;
                }
            }
        }
        let all = matches.iter().all(|&m| m >= 0);
        Ok((all, matches))
    }
}
