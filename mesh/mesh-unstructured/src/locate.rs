//! Point location: a bounding volume hierarchy over the cell boxes with
//! exact point-in-cell predicates.
//!
//! The tree only narrows the candidates; every candidate cell is then tested
//! against the point with a predicate chosen by its dimension:
//!
//! - points: distance to the node within `eps`
//! - segments and polylines: distance to a corner segment within `eps`
//! - surface cells: within `eps` of the cell plane and inside the corner
//!   polygon (crossing count), or within `eps` of its boundary
//! - volume cells: on the inner side of every face plane, up to `eps`

use std::cmp::Ordering;

use mesh_types::{Aabb, Coords, GeometricType, IndexedArray, MeshError, MeshResult, pad, to_id};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use tracing::debug;

use crate::nodes::{area_vector, iso_barycenter, node_point, node_points, require_space_dim};
use crate::params::LocatorParams;
use crate::umesh::{CellRef, UMesh};

/// Node of the cell tree.
#[derive(Debug)]
enum LocatorNode {
    Leaf {
        bbox: Aabb,
        cells: SmallVec<[usize; 8]>,
    },
    Internal {
        bbox: Aabb,
        left: Box<Self>,
        right: Box<Self>,
    },
}

impl LocatorNode {
    const fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Bounding box tree over the cells of a mesh.
///
/// The locator borrows the mesh; moving nodes after building it gives stale
/// candidate sets.
///
/// # Example
///
/// ```
/// use mesh_types::{Coords, GeometricType};
/// use mesh_unstructured::{CellLocator, LocatorParams, UMesh};
///
/// let mut m = UMesh::new(2);
/// m.set_coords(Coords::new(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0], 2).unwrap());
/// m.allocate_cells(2);
/// m.insert_next_cell(GeometricType::Tri3, &[0, 1, 2]).unwrap();
/// m.insert_next_cell(GeometricType::Tri3, &[1, 3, 2]).unwrap();
///
/// let locator = CellLocator::new(&m, &LocatorParams::default()).unwrap();
/// assert_eq!(locator.cells_containing_point(&[0.2, 0.2], 1e-12).unwrap(), vec![0]);
/// assert_eq!(locator.cells_containing_point(&[0.5, 0.5], 1e-12).unwrap(), vec![0, 1]);
/// ```
#[derive(Debug)]
pub struct CellLocator<'a> {
    mesh: &'a UMesh,
    root: Option<LocatorNode>,
    cell_count: usize,
    space_dim: usize,
}

impl<'a> CellLocator<'a> {
    /// Build the tree over the cells of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates or
    /// connectivity and [`MeshError::OutOfRange`] for a bad node id.
    pub fn new(mesh: &'a UMesh, params: &LocatorParams) -> MeshResult<Self> {
        let shared = mesh.coords()?.clone();
        let coords = shared.read();
        let boxes = mesh
            .cells()?
            .map(|cell| cell_box(&coords, &cell?).map(|b| b.expanded(params.precision)))
            .collect::<MeshResult<Vec<Aabb>>>()?;
        let max_leaf = params.max_leaf_size.max(1);
        let root = (!boxes.is_empty()).then(|| build_recursive(&boxes, (0..boxes.len()).collect(), max_leaf));
        debug!(cells = boxes.len(), max_leaf, "cell locator built");
        Ok(Self {
            mesh,
            root,
            cell_count: boxes.len(),
            space_dim: coords.dim(),
        })
    }

    /// Build the tree with rayon, splitting subtrees of at least
    /// `parallel_threshold` cells across threads.
    ///
    /// # Errors
    ///
    /// Same as [`CellLocator::new`].
    #[cfg(feature = "parallel")]
    pub fn build_parallel(
        mesh: &'a UMesh,
        params: &LocatorParams,
        parallel_threshold: usize,
    ) -> MeshResult<Self> {
        use rayon::prelude::*;

        let shared = mesh.coords()?.clone();
        let coords = shared.read();
        let conn = mesh.connectivity()?;
        let boxes = (0..conn.len())
            .into_par_iter()
            .map(|i| {
                let cell = CellRef::parse(i, conn.group(i))?;
                cell_box(&coords, &cell).map(|b| b.expanded(params.precision))
            })
            .collect::<MeshResult<Vec<Aabb>>>()?;
        let max_leaf = params.max_leaf_size.max(1);
        let root = (!boxes.is_empty()).then(|| {
            build_recursive_parallel(&boxes, (0..boxes.len()).collect(), max_leaf, parallel_threshold)
        });
        debug!(cells = boxes.len(), max_leaf, "cell locator built in parallel");
        Ok(Self {
            mesh,
            root,
            cell_count: boxes.len(),
            space_dim: coords.dim(),
        })
    }

    /// Number of cells in the tree.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Whether the mesh had no cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Box enclosing every cell, `None` for an empty mesh.
    #[must_use]
    pub fn root_bbox(&self) -> Option<&Aabb> {
        self.root.as_ref().map(LocatorNode::bbox)
    }

    /// Cells whose box meets `bbox` enlarged by `eps`, ascending.
    #[must_use]
    pub fn cells_in_box(&self, bbox: &Aabb, eps: f64) -> Vec<usize> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            query_recursive(root, bbox, eps, &mut out);
        }
        out.sort_unstable();
        out
    }

    /// Cells containing `point` within `eps`, ascending.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DimensionMismatch`] when the point does not have the
    ///   space dimension
    /// - [`MeshError::OutOfRange`] for a bad node id
    pub fn cells_containing_point(&self, point: &[f64], eps: f64) -> MeshResult<Vec<usize>> {
        require_space_dim("located point", point.len(), self.space_dim)?;
        let p = pad(point);
        let shared = self.mesh.coords()?.clone();
        let coords = shared.read();
        let mut hits = Vec::new();
        for c in self.cells_in_box(&Aabb::new(p, p), eps) {
            if cell_contains(&coords, &self.mesh.cell(c)?, &p, eps)? {
                hits.push(c);
            }
        }
        Ok(hits)
    }

    /// Squared distance from `point` to the closest cell, with that cell.
    ///
    /// Subtrees farther than the best cell found so far are skipped. Ties go
    /// to the lowest cell id. `None` for an empty mesh.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DimensionMismatch`] when the point does not have the
    ///   space dimension
    /// - [`MeshError::InvalidArgument`] for a cell that is neither a curve nor
    ///   a surface
    pub fn nearest_cell(&self, point: &[f64]) -> MeshResult<Option<(f64, usize)>> {
        require_space_dim("distance point", point.len(), self.space_dim)?;
        let Some(root) = &self.root else {
            return Ok(None);
        };
        let p = pad(point);
        let shared = self.mesh.coords()?.clone();
        let coords = shared.read();
        let mut best = (f64::INFINITY, usize::MAX);
        nearest_recursive(root, &p, &mut best, &|c| {
            cell_distance_squared(&coords, &self.mesh.cell(c)?, &p)
        })?;
        Ok(Some(best))
    }
}

fn build_recursive(boxes: &[Aabb], mut indices: Vec<usize>, max_leaf: usize) -> LocatorNode {
    let bbox = indices
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.union(&boxes[i]));
    if indices.len() <= max_leaf {
        return LocatorNode::Leaf {
            bbox,
            cells: indices.into_iter().collect(),
        };
    }
    let right = split_at_median(boxes, &mut indices, &bbox);
    LocatorNode::Internal {
        bbox,
        left: Box::new(build_recursive(boxes, indices, max_leaf)),
        right: Box::new(build_recursive(boxes, right, max_leaf)),
    }
}

#[cfg(feature = "parallel")]
fn build_recursive_parallel(
    boxes: &[Aabb],
    mut indices: Vec<usize>,
    max_leaf: usize,
    parallel_threshold: usize,
) -> LocatorNode {
    if indices.len() < parallel_threshold {
        return build_recursive(boxes, indices, max_leaf);
    }
    let bbox = indices
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.union(&boxes[i]));
    if indices.len() <= max_leaf {
        return LocatorNode::Leaf {
            bbox,
            cells: indices.into_iter().collect(),
        };
    }
    let right = split_at_median(boxes, &mut indices, &bbox);
    let (left, right) = rayon::join(
        || build_recursive_parallel(boxes, indices, max_leaf, parallel_threshold),
        || build_recursive_parallel(boxes, right, max_leaf, parallel_threshold),
    );
    LocatorNode::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Partition `indices` around the median box center on the longest axis;
/// `indices` keeps the lower half and the upper half is returned.
fn split_at_median(boxes: &[Aabb], indices: &mut Vec<usize>, bbox: &Aabb) -> Vec<usize> {
    let axis = bbox.longest_axis();
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |&a, &b| {
        boxes[a].center()[axis].total_cmp(&boxes[b].center()[axis])
    });
    indices.split_off(mid)
}

fn query_recursive(node: &LocatorNode, query: &Aabb, eps: f64, out: &mut Vec<usize>) {
    if !node.bbox().intersects(query, eps) {
        return;
    }
    match node {
        LocatorNode::Leaf { cells, .. } => out.extend(cells.iter().copied()),
        LocatorNode::Internal { left, right, .. } => {
            query_recursive(left, query, eps, out);
            query_recursive(right, query, eps, out);
        }
    }
}

fn nearest_recursive(
    node: &LocatorNode,
    p: &Point3<f64>,
    best: &mut (f64, usize),
    dist: &dyn Fn(usize) -> MeshResult<f64>,
) -> MeshResult<()> {
    match node {
        LocatorNode::Leaf { cells, .. } => {
            for &c in cells {
                let d = dist(c)?;
                if (d, c).partial_cmp(best) == Some(Ordering::Less) {
                    *best = (d, c);
                }
            }
        }
        LocatorNode::Internal { left, right, .. } => {
            let dl = left.bbox().distance_squared_to(p);
            let dr = right.bbox().distance_squared_to(p);
            let ordered = if dl <= dr {
                [(dl, left), (dr, right)]
            } else {
                [(dr, right), (dl, left)]
            };
            for (d, child) in ordered {
                if d <= best.0 {
                    nearest_recursive(child, p, best, dist)?;
                }
            }
        }
    }
    Ok(())
}

fn cell_box(coords: &Coords, cell: &CellRef<'_>) -> MeshResult<Aabb> {
    let mut bbox = Aabb::empty();
    for id in cell.node_ids() {
        bbox.expand_to_include(&node_point(coords, id)?);
    }
    Ok(bbox)
}

fn corners<'c>(cell: &CellRef<'c>) -> &'c [i64] {
    &cell.nodes[..cell.ty.corner_count(cell.nodes.len())]
}

fn segment_distance_squared(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    let t = if len2 > 0.0 {
        ((p - a).dot(&ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).norm_squared()
}

/// Smallest squared distance from `p` to the closed polyline through `pts`.
fn ring_distance_squared(p: &Point3<f64>, pts: &[Point3<f64>], closed: bool) -> f64 {
    let k = pts.len();
    let segments = if closed { k } else { k.saturating_sub(1) };
    if segments == 0 {
        return pts.first().map_or(f64::INFINITY, |a| (p - a).norm_squared());
    }
    (0..segments)
        .map(|i| segment_distance_squared(p, &pts[i], &pts[(i + 1) % k]))
        .fold(f64::INFINITY, f64::min)
}

/// Crossing test of `p` against the polygon `pts`, projected along the
/// dominant axis of `normal`.
fn inside_polygon(p: &Point3<f64>, pts: &[Point3<f64>], normal: &Vector3<f64>) -> bool {
    let drop = normal.iamax();
    let (u, v) = match drop {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let k = pts.len();
    let mut inside = false;
    for i in 0..k {
        let a = &pts[i];
        let b = &pts[(i + 1) % k];
        if (a[v] > p[v]) != (b[v] > p[v]) {
            let x = a[u] + (p[v] - a[v]) * (b[u] - a[u]) / (b[v] - a[v]);
            if p[u] < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Plane of a corner ring: unit normal and a point, `None` when degenerate.
fn ring_plane(coords: &Coords, ring: &[i64]) -> MeshResult<Option<(Vector3<f64>, Point3<f64>)>> {
    let n = area_vector(coords, ring)?;
    let norm = n.norm();
    if norm <= f64::EPSILON {
        return Ok(None);
    }
    Ok(Some((n / norm, iso_barycenter(coords, ring)?)))
}

fn cell_contains(coords: &Coords, cell: &CellRef<'_>, p: &Point3<f64>, eps: f64) -> MeshResult<bool> {
    let eps2 = eps * eps;
    match cell.ty.dimension() {
        0 => Ok((node_point(coords, cell.nodes[0])? - p).norm_squared() <= eps2),
        1 => {
            let pts = node_points(coords, corners(cell))?;
            Ok(ring_distance_squared(p, &pts, false) <= eps2)
        }
        2 => {
            let ring = corners(cell);
            let pts = node_points(coords, ring)?;
            if ring_distance_squared(p, &pts, true) <= eps2 {
                return Ok(true);
            }
            let Some((n, origin)) = ring_plane(coords, ring)? else {
                return Ok(false);
            };
            Ok((p - origin).dot(&n).abs() <= eps && inside_polygon(p, &pts, &n))
        }
        _ => {
            let center = if cell.ty == GeometricType::Polyhedron {
                let ids: SmallVec<[i64; 32]> = cell.node_ids().collect();
                iso_barycenter(coords, &ids)?
            } else {
                iso_barycenter(coords, corners(cell))?
            };
            let mut faces: SmallVec<[SmallVec<[i64; 8]>; 8]> = SmallVec::new();
            cell.ty.for_each_son(cell.nodes, |ty, nodes| {
                faces.push(nodes[..ty.corner_count(nodes.len())].iter().copied().collect());
            });
            for face in &faces {
                let Some((n, origin)) = ring_plane(coords, face)? else {
                    continue;
                };
                let inward = if (center - origin).dot(&n) >= 0.0 { n } else { -n };
                if (p - origin).dot(&inward) < -eps {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

/// Squared distance from `p` to a curve or surface cell.
fn cell_distance_squared(coords: &Coords, cell: &CellRef<'_>, p: &Point3<f64>) -> MeshResult<f64> {
    let ring = corners(cell);
    let pts = node_points(coords, ring)?;
    match cell.ty.dimension() {
        1 => Ok(ring_distance_squared(p, &pts, false)),
        2 => {
            let edge = ring_distance_squared(p, &pts, true);
            match ring_plane(coords, ring)? {
                Some((n, origin)) => {
                    let h = (p - origin).dot(&n);
                    let foot = p - n * h;
                    if inside_polygon(&foot, &pts, &n) {
                        Ok((h * h).min(edge))
                    } else {
                        Ok(edge)
                    }
                }
                None => Ok(edge),
            }
        }
        d => Err(MeshError::invalid_argument(format!(
            "distance to cells of dimension {d} is not supported"
        ))),
    }
}

/// Split a flat buffer of points into padded points, checking the stride.
fn split_points(points: &[f64], dim: usize) -> MeshResult<Vec<&[f64]>> {
    if dim == 0 || points.len() % dim != 0 {
        return Err(MeshError::size_mismatch(
            "flat point buffer",
            points.len() / dim.max(1) * dim,
            points.len(),
        ));
    }
    Ok(points.chunks_exact(dim).collect())
}

impl UMesh {
    /// For each point of a flat buffer in the space dimension, the cells
    /// containing it within `eps`.
    ///
    /// # Errors
    ///
    /// - [`MeshError::SizeMismatch`] when the buffer is not a whole number of
    ///   points
    /// - errors of [`CellLocator::new`]
    pub fn get_cells_containing_points(&self, points: &[f64], eps: f64) -> MeshResult<IndexedArray> {
        let points = split_points(points, self.space_dimension()?)?;
        let locator = CellLocator::new(self, &LocatorParams::default())?;
        let mut out = IndexedArray::with_capacity(points.len(), points.len());
        for p in points {
            out.push_group(locator.cells_containing_point(p, eps)?.into_iter().map(to_id));
        }
        Ok(out)
    }

    /// Cells containing one point within `eps`, ascending.
    ///
    /// # Errors
    ///
    /// Same as [`CellLocator::cells_containing_point`].
    pub fn get_cells_containing_point(&self, point: &[f64], eps: f64) -> MeshResult<Vec<usize>> {
        CellLocator::new(self, &LocatorParams::default())?.cells_containing_point(point, eps)
    }

    /// Cells whose bounding box meets `bbox` (`[min0, max0, min1, max1, ...]`
    /// in the space dimension) enlarged by `eps`, ascending.
    ///
    /// # Errors
    ///
    /// - [`MeshError::SizeMismatch`] for a box of the wrong length
    /// - errors of [`CellLocator::new`]
    pub fn get_cells_in_bounding_box(&self, bbox: &[f64], eps: f64) -> MeshResult<Vec<usize>> {
        let dim = self.space_dimension()?;
        if bbox.len() != 2 * dim {
            return Err(MeshError::size_mismatch("bounding box", 2 * dim, bbox.len()));
        }
        let locator = CellLocator::new(self, &LocatorParams::default())?;
        Ok(locator.cells_in_box(&Aabb::from_minmax(bbox), eps))
    }

    /// For each point, the distance to the closest cell and that cell.
    ///
    /// The mesh must be one dimension below its space: curves in the plane,
    /// surfaces in 3D.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DimensionMismatch`] for any other dimension pair
    /// - [`MeshError::InvalidArgument`] for a mesh without cells
    /// - [`MeshError::SizeMismatch`] when the buffer is not a whole number of
    ///   points
    pub fn distance_to_points(&self, points: &[f64]) -> MeshResult<Vec<(f64, usize)>> {
        let space_dim = self.space_dimension()?;
        let mesh_dim = self.mesh_dimension()?;
        if mesh_dim + 1 != space_dim || mesh_dim == 0 {
            return Err(MeshError::dimension_mismatch(
                "distance to a mesh: mesh dimension",
                to_id(space_dim) - 1,
                to_id(mesh_dim),
            ));
        }
        let points = split_points(points, space_dim)?;
        let locator = CellLocator::new(self, &LocatorParams::default())?;
        points
            .into_iter()
            .map(|p| {
                locator
                    .nearest_cell(p)?
                    .map(|(d2, c)| (d2.sqrt(), c))
                    .ok_or_else(|| MeshError::invalid_argument("distance to a mesh without cells"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// `n` x `n` grid of unit quads in the plane.
    fn quad_grid(n: i32) -> UMesh {
        let mut xy = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                xy.extend([f64::from(i), f64::from(j)]);
            }
        }
        let mut m = UMesh::new(2);
        m.set_coords(Coords::new(xy, 2).unwrap());
        m.allocate_cells(usize::try_from(n * n).unwrap());
        let row = n + 1;
        for j in 0..n {
            for i in 0..n {
                let a = i64::from(j * row + i);
                let row = i64::from(row);
                m.insert_next_cell(GeometricType::Quad4, &[a, a + 1, a + row + 1, a + row])
                    .unwrap();
            }
        }
        m
    }

    fn unit_cube() -> UMesh {
        let mut m = UMesh::new(3);
        m.set_coords(
            Coords::new(
                vec![
                    0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0,
                    0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
                ],
                3,
            )
            .unwrap(),
        );
        m.allocate_cells(2);
        m.insert_next_cell(GeometricType::Hexa8, &[0, 3, 2, 1, 4, 7, 6, 5])
            .unwrap();
        m.insert_next_cell(GeometricType::Tetra4, &[0, 1, 3, 4]).unwrap();
        m
    }

    #[test]
    fn test_points_in_grid() {
        let m = quad_grid(2);
        assert_eq!(m.get_cells_containing_point(&[0.5, 0.5], 1e-12).unwrap(), vec![0]);
        assert_eq!(
            m.get_cells_containing_point(&[1.0, 1.0], 1e-12).unwrap(),
            vec![0, 1, 2, 3]
        );
        assert!(m.get_cells_containing_point(&[3.0, 3.0], 1e-12).unwrap().is_empty());

        let hits = m
            .get_cells_containing_points(&[1.5, 0.5, 0.5, 1.5, -1.0, 0.0], 1e-12)
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits.group(0), &[1]);
        assert_eq!(hits.group(1), &[2]);
        assert!(hits.group(2).is_empty());
    }

    #[test]
    fn test_flat_buffer_must_hold_whole_points() {
        let m = quad_grid(1);
        assert!(matches!(
            m.get_cells_containing_points(&[0.5, 0.5, 0.5], 1e-12),
            Err(MeshError::SizeMismatch { .. })
        ));
        assert!(matches!(
            m.get_cells_containing_point(&[0.5, 0.5, 0.5], 1e-12),
            Err(MeshError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_every_center_found_with_small_leaves() {
        let m = quad_grid(10);
        let locator = CellLocator::new(&m, &LocatorParams::default().with_max_leaf_size(1)).unwrap();
        assert_eq!(locator.cell_count(), 100);
        for c in 0..100_i32 {
            let p = [f64::from(c % 10) + 0.5, f64::from(c / 10) + 0.5];
            let found = locator.cells_containing_point(&p, 1e-12).unwrap();
            assert_eq!(found, vec![usize::try_from(c).unwrap()]);
        }
    }

    #[test]
    fn test_cells_in_bounding_box() {
        let m = quad_grid(2);
        assert_eq!(
            m.get_cells_in_bounding_box(&[1.5, 2.0, 1.5, 2.0], 0.0).unwrap(),
            vec![3]
        );
        assert_eq!(
            m.get_cells_in_bounding_box(&[0.5, 1.5, 0.5, 0.6], 0.0).unwrap(),
            vec![0, 1]
        );
        assert!(m.get_cells_in_bounding_box(&[0.0, 1.0], 0.0).is_err());
    }

    #[test]
    fn test_points_in_volume_cells() {
        let m = unit_cube();
        assert_eq!(
            m.get_cells_containing_point(&[0.1, 0.1, 0.1], 1e-12).unwrap(),
            vec![0, 1]
        );
        assert_eq!(
            m.get_cells_containing_point(&[0.8, 0.8, 0.8], 1e-12).unwrap(),
            vec![0]
        );
        assert!(
            m.get_cells_containing_point(&[1.5, 0.5, 0.5], 1e-12)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_surface_cell_in_space() {
        let mut m = UMesh::new(2);
        m.set_coords(
            Coords::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3).unwrap(),
        );
        m.allocate_cells(1);
        m.insert_next_cell(GeometricType::Tri3, &[0, 1, 2]).unwrap();
        assert_eq!(
            m.get_cells_containing_point(&[0.2, 0.2, 0.0], 1e-9).unwrap(),
            vec![0]
        );
        assert!(
            m.get_cells_containing_point(&[0.2, 0.2, 0.1], 1e-9)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_distance_to_curve() {
        let mut m = UMesh::new(1);
        m.set_coords(Coords::new(vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0], 2).unwrap());
        m.allocate_cells(2);
        m.insert_next_cell(GeometricType::Seg2, &[0, 1]).unwrap();
        m.insert_next_cell(GeometricType::Seg2, &[1, 2]).unwrap();
        let d = m.distance_to_points(&[0.5, 1.0, 2.5, 0.0]).unwrap();
        assert_relative_eq!(d[0].0, 1.0);
        assert_eq!(d[0].1, 0);
        assert_relative_eq!(d[1].0, 0.5);
        assert_eq!(d[1].1, 1);
    }

    #[test]
    fn test_distance_to_surface() {
        let mut m = UMesh::new(2);
        m.set_coords(
            Coords::new(
                vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0],
                3,
            )
            .unwrap(),
        );
        m.allocate_cells(2);
        m.insert_next_cell(GeometricType::Quad4, &[0, 1, 2, 3]).unwrap();
        m.insert_next_cell(GeometricType::Tri3, &[1, 4, 2]).unwrap();
        let d = m.distance_to_points(&[0.25, 0.5, 2.0, 3.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(d[0].0, 2.0);
        assert_eq!(d[0].1, 0);
        assert_relative_eq!(d[1].0, 1.0);
        assert_eq!(d[1].1, 1);

        assert!(matches!(
            quad_grid(1).distance_to_points(&[0.0, 0.0]),
            Err(MeshError::DimensionMismatch { .. })
        ));
    }
}
