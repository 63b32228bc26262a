//! Node lookups shared by the geometric algorithms.

use mesh_types::{Coords, GeometricType, MeshError, MeshResult, to_id, to_index};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

/// Position of node `id`, padded with zeros to three components.
pub(crate) fn node_point(coords: &Coords, id: i64) -> MeshResult<Point3<f64>> {
    let n = coords.number_of_nodes();
    let i = to_index(id)
        .filter(|&i| i < n)
        .ok_or_else(|| MeshError::out_of_range("node of a cell", id, n))?;
    let p = coords.point3(i);
    Ok(Point3::new(p[0], p[1], p[2]))
}

/// Positions of several nodes.
pub(crate) fn node_points(coords: &Coords, ids: &[i64]) -> MeshResult<SmallVec<[Point3<f64>; 8]>> {
    ids.iter().map(|&id| node_point(coords, id)).collect()
}

/// Twice the area vector of a closed ring of nodes (sum of `p_i x p_i+1`).
pub(crate) fn area_vector(coords: &Coords, ring: &[i64]) -> MeshResult<Vector3<f64>> {
    let pts = node_points(coords, ring)?;
    let k = pts.len();
    let mut v = Vector3::zeros();
    for i in 0..k {
        v += pts[i].coords.cross(&pts[(i + 1) % k].coords);
    }
    Ok(v)
}

/// Boundary ring of a 2D cell: corners, with the mid-edge nodes of a
/// quadratic cell interleaved.
pub(crate) fn boundary_ring(ty: GeometricType, nodes: &[i64]) -> SmallVec<[i64; 16]> {
    let k = ty.corner_count(nodes.len());
    if !ty.is_quadratic() || nodes.len() < 2 * k {
        return nodes[..k].iter().copied().collect();
    }
    (0..k).flat_map(|i| [nodes[i], nodes[k + i]]).collect()
}

/// Iso-barycenter of nodes.
pub(crate) fn iso_barycenter(coords: &Coords, ids: &[i64]) -> MeshResult<Point3<f64>> {
    let mut sum = Vector3::zeros();
    for &id in ids {
        sum += node_point(coords, id)?.coords;
    }
    let n = ids.len().max(1);
    Ok(Point3::from(sum / usize_to_f64(n)))
}

/// Counts used as weights.
#[allow(clippy::cast_precision_loss)]
pub(crate) const fn usize_to_f64(n: usize) -> f64 {
    n as f64
}

/// Fail unless the space has `expected` dimensions.
pub(crate) fn require_space_dim(context: &str, actual: usize, expected: usize) -> MeshResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(MeshError::dimension_mismatch(
            format!("{context} space dimension"),
            to_id(expected),
            to_id(actual),
        ))
    }
}

/// Fail unless the mesh has `expected` dimensions.
pub(crate) fn require_mesh_dim(context: &str, actual: usize, expected: usize) -> MeshResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(MeshError::dimension_mismatch(
            format!("{context} mesh dimension"),
            to_id(expected),
            to_id(actual),
        ))
    }
}
