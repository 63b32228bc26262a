//! Per-cell geometric fields: measures, centers and quality metrics.

use mesh_measure::{
    MeasureError, quad_aspect_ratio, quad_edge_ratio, quad_skew, quad_warp, tetra_aspect_ratio,
    tetra_edge_ratio, tri_aspect_ratio, tri_edge_ratio,
};
use mesh_types::{Coords, GeometricType, MeshError, MeshResult, to_id};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::nodes::{
    boundary_ring, iso_barycenter, node_points, require_mesh_dim, require_space_dim, usize_to_f64,
};
use crate::umesh::{CellRef, UMesh};

type Points = SmallVec<[Point3<f64>; 8]>;

/// Measures at or below this are treated as zero when weighting centers.
const NEGLIGIBLE: f64 = 1e-300;

fn measure_error(err: MeasureError) -> MeshError {
    MeshError::invalid_argument(err.to_string())
}

/// Nodes of a curve cell in path order; mid nodes sit between the ends.
fn curve_path(cell: &CellRef<'_>) -> SmallVec<[i64; 4]> {
    let n = cell.nodes;
    if cell.ty.is_quadratic() && n.len() > 2 {
        let mut path: SmallVec<[i64; 4]> = SmallVec::new();
        path.push(n[0]);
        path.extend(n[2..].iter().copied());
        path.push(n[1]);
        path
    } else {
        n.iter().copied().collect()
    }
}

/// Length and first moment of a polyline.
fn curve_moment(pts: &[Point3<f64>]) -> (f64, Vector3<f64>) {
    pts.windows(2).fold((0.0, Vector3::zeros()), |(len, m), w| {
        let l = (w[1] - w[0]).norm();
        (len + l, m + (w[0].coords + w[1].coords) * (0.5 * l))
    })
}

/// Area vector (twice the area) and signed area moment of a polygon,
/// triangulated as a fan from its first node. Signs are taken along the
/// polygon normal.
fn surface_moment(pts: &[Point3<f64>]) -> (Vector3<f64>, f64, Vector3<f64>) {
    let Some(p0) = pts.first() else {
        return (Vector3::zeros(), 0.0, Vector3::zeros());
    };
    let tris: SmallVec<[(Vector3<f64>, Vector3<f64>); 8]> = pts[1..]
        .windows(2)
        .map(|w| {
            let n = (w[0] - p0).cross(&(w[1] - p0));
            (n, (p0.coords + w[0].coords + w[1].coords) / 3.0)
        })
        .collect();
    let total: Vector3<f64> = tris.iter().map(|(n, _)| n).sum();
    let unit = total.try_normalize(NEGLIGIBLE).unwrap_or_else(Vector3::z);
    let (mut area, mut moment) = (0.0, Vector3::zeros());
    for (n, c) in &tris {
        let a = 0.5 * n.dot(&unit);
        area += a;
        moment += c * a;
    }
    (total, area, moment)
}

/// Signed volume and first moment of a volume cell: tetrahedra joining the
/// cell center to fans on each face. Outward faces give a positive volume.
fn volume_moment(coords: &Coords, cell: &CellRef<'_>) -> MeshResult<(f64, Vector3<f64>)> {
    let mut ids: SmallVec<[i64; 32]> = cell.node_ids().collect();
    if cell.ty == GeometricType::Polyhedron {
        ids.sort_unstable();
        ids.dedup();
    }
    let center = iso_barycenter(coords, &ids)?;
    let mut faces: SmallVec<[SmallVec<[i64; 16]>; 8]> = SmallVec::new();
    cell.ty
        .for_each_son(cell.nodes, |ty, nodes| faces.push(boundary_ring(ty, nodes)));
    let (mut volume, mut moment) = (0.0, Vector3::zeros());
    for face in &faces {
        let pts = node_points(coords, face)?;
        let sum: Vector3<f64> = pts.iter().map(|p| p.coords).sum();
        let fc = Point3::from(sum / usize_to_f64(pts.len().max(1)));
        for i in 0..pts.len() {
            let (a, b) = (&pts[i], &pts[(i + 1) % pts.len()]);
            let v = (fc - center).dot(&(a - center).cross(&(b - center))) / 6.0;
            volume += v;
            moment += (center.coords + fc.coords + a.coords + b.coords) * (0.25 * v);
        }
    }
    Ok((volume, moment))
}

fn push_point(out: &mut Vec<f64>, p: &Point3<f64>, dim: usize) {
    out.extend(p.coords.iter().take(dim).copied());
}

/// Corner coordinates as the flat three-per-node buffer the metrics read.
fn corner_buffer(coords: &Coords, cell: &CellRef<'_>) -> MeshResult<SmallVec<[f64; 12]>> {
    let k = cell.ty.corner_count(cell.nodes.len());
    let mut buf = SmallVec::new();
    for p in node_points(coords, &cell.nodes[..k])? {
        buf.extend(p.coords.iter().copied());
    }
    Ok(buf)
}

type Metric = fn(&[f64]) -> Result<f64, MeasureError>;

impl UMesh {
    /// Measure of each cell: 0 for points, length for curves, area for
    /// surfaces and volume for volumes.
    ///
    /// Surface cells in a 2D space are signed by their orientation in the
    /// plane; surface cells in 3D are always positive. Volume cells are
    /// positive when their faces point outwards. `abs` drops every sign.
    /// Quadratic cells are measured through their mid nodes.
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
    /// let mut m = UMesh::new(2);
    /// m.set_coords(Coords::new(vec![0.0, 0.0, 2.0, 0.0, 2.0, 1.0, 0.0, 1.0], 2).unwrap());
    /// m.allocate_cells(2);
    /// m.insert_next_cell(GeometricType::Quad4, &[0, 1, 2, 3]).unwrap();
    /// m.insert_next_cell(GeometricType::Quad4, &[0, 3, 2, 1]).unwrap();
    ///
    /// assert_eq!(m.measure_field(false).unwrap(), vec![2.0, -2.0]);
    /// assert_eq!(m.measure_field(true).unwrap(), vec![2.0, 2.0]);
    /// ```
    pub fn measure_field(&self, abs: bool) -> MeshResult<Vec<f64>> {
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let planar = coords.dim() < 3;
        let mut out = Vec::with_capacity(self.number_of_cells()?);
        for cell in self.cells()? {
            let cell = cell?;
            let m = match cell.ty.dimension() {
                0 => 0.0,
                1 => curve_moment(&node_points(&coords, &curve_path(&cell))?).0,
                2 => {
                    let pts = node_points(&coords, &boundary_ring(cell.ty, cell.nodes))?;
                    let (total, area, _) = surface_moment(&pts);
                    if planar { 0.5 * total.z } else { area }
                }
                _ => volume_moment(&coords, &cell)?.0,
            };
            out.push(if abs { m.abs() } else { m });
        }
        Ok(out)
    }

    /// Center of mass of each cell, flat in the space dimension.
    ///
    /// Cells of zero measure fall back to the iso-barycenter of their nodes.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::measure_field`].
    pub fn compute_cell_center_of_mass(&self) -> MeshResult<Vec<f64>> {
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let dim = coords.dim();
        let mut out = Vec::with_capacity(self.number_of_cells()? * dim);
        let mut fallbacks = 0_usize;
        for cell in self.cells()? {
            let cell = cell?;
            let (measure, moment) = match cell.ty.dimension() {
                0 => (0.0, Vector3::zeros()),
                1 => curve_moment(&node_points(&coords, &curve_path(&cell))?),
                2 => {
                    let pts = node_points(&coords, &boundary_ring(cell.ty, cell.nodes))?;
                    let (_, area, moment) = surface_moment(&pts);
                    (area, moment)
                }
                _ => volume_moment(&coords, &cell)?,
            };
            let center = if measure.abs() > NEGLIGIBLE {
                Point3::from(moment / measure)
            } else {
                if cell.ty.dimension() > 0 {
                    fallbacks += 1;
                }
                let ids: SmallVec<[i64; 32]> = cell.node_ids().collect();
                iso_barycenter(&coords, &ids)?
            };
            push_point(&mut out, &center, dim);
        }
        if fallbacks > 0 {
            warn!(cells = fallbacks, "cells of zero measure located at their node barycenter");
        }
        Ok(out)
    }

    /// Iso-barycenter of the nodes of each cell, flat in the space
    /// dimension. A node repeated in several polyhedron faces counts once.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::measure_field`].
    pub fn compute_iso_barycenter_of_nodes_per_cell(&self) -> MeshResult<Vec<f64>> {
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let dim = coords.dim();
        let mut out = Vec::with_capacity(self.number_of_cells()? * dim);
        for cell in self.cells()? {
            let cell = cell?;
            let mut ids: SmallVec<[i64; 32]> = cell.node_ids().collect();
            if cell.ty == GeometricType::Polyhedron {
                ids.sort_unstable();
                ids.dedup();
            }
            push_point(&mut out, &iso_barycenter(&coords, &ids)?, dim);
        }
        Ok(out)
    }

    /// Apply a per-type metric to every cell.
    fn quality_field(
        &self,
        name: &str,
        metric_of: impl Fn(GeometricType) -> Option<Metric>,
    ) -> MeshResult<Vec<f64>> {
        let space_dim = self.space_dimension()?;
        if !(2..=3).contains(&space_dim) {
            return Err(MeshError::dimension_mismatch(
                format!("{name}: space dimension"),
                3,
                to_id(space_dim),
            ));
        }
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let mut out = Vec::with_capacity(self.number_of_cells()?);
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            let metric = metric_of(cell.ty).ok_or_else(|| {
                MeshError::invalid_argument(format!(
                    "{name}: cell {i} has unsupported type {}",
                    cell.ty.name()
                ))
            })?;
            out.push(metric(&corner_buffer(&coords, &cell)?).map_err(measure_error)?);
        }
        debug!(cells = out.len(), metric = name, "quality field computed");
        Ok(out)
    }

    /// Longest over shortest edge of each TRI3, QUAD4 or TETRA4 cell.
    ///
    /// # Errors
    ///
    /// - [`MeshError::InvalidArgument`] for a cell of another type
    /// - [`MeshError::DimensionMismatch`] outside 2D and 3D spaces
    pub fn edge_ratio_field(&self) -> MeshResult<Vec<f64>> {
        self.quality_field("edge ratio", |ty| match ty {
            GeometricType::Tri3 => Some(tri_edge_ratio as Metric),
            GeometricType::Quad4 => Some(quad_edge_ratio as Metric),
            GeometricType::Tetra4 => Some(tetra_edge_ratio as Metric),
            _ => None,
        })
    }

    /// Aspect ratio of each TRI3, QUAD4 or TETRA4 cell, 1 for the regular
    /// shape.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::edge_ratio_field`].
    pub fn aspect_ratio_field(&self) -> MeshResult<Vec<f64>> {
        self.quality_field("aspect ratio", |ty| match ty {
            GeometricType::Tri3 => Some(tri_aspect_ratio as Metric),
            GeometricType::Quad4 => Some(quad_aspect_ratio as Metric),
            GeometricType::Tetra4 => Some(tetra_aspect_ratio as Metric),
            _ => None,
        })
    }

    /// Warpage of each QUAD4 cell of a surface mesh in 3D.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DimensionMismatch`] unless the mesh is a surface in 3D
    /// - [`MeshError::InvalidArgument`] for a cell that is not a QUAD4
    pub fn warp_field(&self) -> MeshResult<Vec<f64>> {
        self.require_surface_in_space("warp")?;
        self.quality_field("warp", |ty| {
            (ty == GeometricType::Quad4).then_some(quad_warp as Metric)
        })
    }

    /// Skew of each QUAD4 cell of a surface mesh in 3D.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::warp_field`].
    pub fn skew_field(&self) -> MeshResult<Vec<f64>> {
        self.require_surface_in_space("skew")?;
        self.quality_field("skew", |ty| {
            (ty == GeometricType::Quad4).then_some(quad_skew as Metric)
        })
    }

    fn require_surface_in_space(&self, context: &str) -> MeshResult<()> {
        require_mesh_dim(context, self.mesh_dimension()?, 2)?;
        require_space_dim(context, self.space_dimension()?, 3)
    }

    /// Linear surface cells whose boundary crosses itself, ascending.
    ///
    /// Two non adjacent edges cross when each one has the ends of the other
    /// strictly on both sides, farther than `eps` from its line. Quadratic
    /// cells are skipped.
    ///
    /// # Errors
    ///
    /// - [`MeshError::DimensionMismatch`] unless the mesh is a surface in 2D
    /// - [`MeshError::NotConfigured`] without coordinates or connectivity
    pub fn check_butterfly_cells(&self, eps: f64) -> MeshResult<Vec<usize>> {
        require_mesh_dim("butterfly check", self.mesh_dimension()?, 2)?;
        require_space_dim("butterfly check", self.space_dimension()?, 2)?;
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let mut out = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty.is_quadratic() {
                continue;
            }
            let pts: Points = node_points(&coords, cell.nodes)?;
            if is_butterfly(&pts, eps) {
                out.push(i);
            }
        }
        if !out.is_empty() {
            warn!(cells = out.len(), "butterfly cells found");
        }
        Ok(out)
    }
}

/// Distance of `r` from the line through `p` and `q`, signed by side.
fn side(p: &Point3<f64>, q: &Point3<f64>, r: &Point3<f64>) -> f64 {
    let pq = q - p;
    let len = pq.xy().norm();
    if len <= NEGLIGIBLE {
        return 0.0;
    }
    pq.xy().perp(&(r - p).xy()) / len
}

fn straddles(p: &Point3<f64>, q: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, eps: f64) -> bool {
    let (sa, sb) = (side(p, q, a), side(p, q, b));
    (sa > eps && sb < -eps) || (sa < -eps && sb > eps)
}

fn is_butterfly(pts: &[Point3<f64>], eps: f64) -> bool {
    let k = pts.len();
    for i in 0..k {
        let (p, q) = (&pts[i], &pts[(i + 1) % k]);
        // edges sharing a node with edge i are skipped
        for j in i + 2..k {
            if i == 0 && j == k - 1 {
                continue;
            }
            let (a, b) = (&pts[j], &pts[(j + 1) % k]);
            if straddles(p, q, a, b, eps) && straddles(a, b, p, q, eps) {
                return true;
            }
        }
    }
    false
}
