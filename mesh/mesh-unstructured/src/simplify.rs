//! Recognition of static types hidden behind dynamic cells, and collapse of
//! degenerated cells.

use hashbrown::HashMap;
use mesh_types::{
    FACE_SEPARATOR, GeometricType, IndexedArray, MeshError, MeshResult, polyhedron_faces,
};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::umesh::{CellRef, UMesh};

type NodeBuf = SmallVec<[i64; 12]>;

/// Static 2D type for a polygon with `len` distinct nodes.
fn unpoly_2d(quadratic: bool, len: usize) -> GeometricType {
    match (quadratic, len) {
        (false, 3) => GeometricType::Tri3,
        (false, 4) => GeometricType::Quad4,
        (false, _) => GeometricType::Polygon,
        (true, 6) => GeometricType::Tri6,
        (true, 8) => GeometricType::Quad8,
        (true, _) => GeometricType::QPolygon,
    }
}

fn distinct_nodes(nodes: &[i64]) -> NodeBuf {
    let mut ids: NodeBuf = nodes.iter().copied().filter(|&n| n != FACE_SEPARATOR).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Nodes in order of first appearance.
fn first_occurrences(nodes: &[i64]) -> NodeBuf {
    let mut out = NodeBuf::new();
    for &n in nodes {
        if !out.contains(&n) {
            out.push(n);
        }
    }
    out
}

/// For each node of `base`, its only edge neighbor outside `base`.
fn opposite_face(faces: &[&[i64]], base: &[i64]) -> Option<NodeBuf> {
    let mut neighbors: HashMap<i64, SmallVec<[i64; 4]>> = HashMap::new();
    for face in faces {
        let k = face.len();
        for i in 0..k {
            let (a, b) = (face[i], face[(i + 1) % k]);
            for (from, to) in [(a, b), (b, a)] {
                let list = neighbors.entry(from).or_default();
                if !list.contains(&to) {
                    list.push(to);
                }
            }
        }
    }
    let mut top = NodeBuf::new();
    for n in base {
        let mut outside = neighbors.get(n)?.iter().filter(|m| !base.contains(m));
        let m = *outside.next()?;
        if outside.next().is_some() || top.contains(&m) {
            return None;
        }
        top.push(m);
    }
    Some(top)
}

/// Recognize a polyhedron as a static linear cell.
///
/// The cell is identified by `100 * nodes + faces`; the base is taken from a
/// face listed outward, so the rebuilt cell keeps the orientation.
fn unpoly_3d(nodes: &[i64]) -> Option<(GeometricType, NodeBuf)> {
    let faces: SmallVec<[&[i64]; 8]> = polyhedron_faces(nodes).collect();
    let distinct = distinct_nodes(nodes);
    let count_of = |len: usize| faces.iter().filter(|f| f.len() == len).count();
    let face_of = |len: usize| faces.iter().copied().find(|f| f.len() == len);
    let apex_of = |base: &[i64]| distinct.iter().copied().find(|n| !base.contains(n));

    match 100 * distinct.len() + faces.len() {
        404 if count_of(3) == 4 => {
            let base = faces[0];
            let mut out: NodeBuf = base.iter().copied().collect();
            out.push(apex_of(base)?);
            Some((GeometricType::Tetra4, out))
        }
        505 if count_of(4) == 1 && count_of(3) == 4 => {
            let base = face_of(4)?;
            let mut out: NodeBuf = base.iter().copied().collect();
            out.push(apex_of(base)?);
            Some((GeometricType::Pyra5, out))
        }
        605 if count_of(3) == 2 && count_of(4) == 3 => {
            extruded(&faces, face_of(3)?, GeometricType::Penta6)
        }
        806 if count_of(4) == 6 => extruded(&faces, faces[0], GeometricType::Hexa8),
        1208 if count_of(6) == 2 && count_of(4) == 6 => {
            extruded(&faces, face_of(6)?, GeometricType::HexGp12)
        }
        _ => None,
    }
}

fn extruded(faces: &[&[i64]], base: &[i64], ty: GeometricType) -> Option<(GeometricType, NodeBuf)> {
    let top = opposite_face(faces, base)?;
    let mut out: NodeBuf = base.iter().copied().collect();
    out.extend(top);
    Some((ty, out))
}

/// Simplest type describing `cell` once repeated nodes are dropped, or
/// `None` when the cell is left as it is.
fn simplify_degenerated(cell: &CellRef<'_>) -> Option<(GeometricType, NodeBuf)> {
    let ty = cell.ty;
    if ty.is_quadratic() {
        return None;
    }
    let distinct = distinct_nodes(cell.nodes);
    let separators = cell.nodes.iter().filter(|&&n| n == FACE_SEPARATOR).count();
    if ty != GeometricType::Polyhedron && distinct.len() == cell.nodes.len() {
        return None;
    }
    match ty.dimension() {
        2 => {
            let kept = first_occurrences(cell.nodes);
            Some((unpoly_2d(false, kept.len()), kept))
        }
        3 => {
            if ty == GeometricType::Polyhedron
                && distinct.len() + separators == cell.nodes.len()
                && polyhedron_faces(cell.nodes).all(|f| first_occurrences(f).len() == f.len())
            {
                return None;
            }
            let mut faces: Vec<NodeBuf> = Vec::new();
            ty.for_each_son(cell.nodes, |_, son| {
                let face = first_occurrences(son);
                if face.len() >= 3 {
                    faces.push(face);
                }
            });
            let mut poly = NodeBuf::new();
            for (i, face) in faces.iter().enumerate() {
                if i > 0 {
                    poly.push(FACE_SEPARATOR);
                }
                poly.extend_from_slice(face);
            }
            Some(unpoly_3d(&poly).unwrap_or((GeometricType::Polyhedron, poly)))
        }
        _ => None,
    }
}

fn is_flat(ty: GeometricType, nodes: &[i64]) -> bool {
    let dim = ty.dimension();
    if distinct_nodes(nodes).len() <= dim {
        return true;
    }
    ty == GeometricType::Polyhedron && polyhedron_faces(nodes).count() < 4
}

impl UMesh {
    /// Rebuild the connectivity through `f`, which returns the replacement of
    /// a cell or `None` to keep it. Returns the ids of the replaced cells.
    fn rewrite_cells(
        &mut self,
        mut f: impl FnMut(&CellRef<'_>) -> Option<(GeometricType, NodeBuf)>,
    ) -> MeshResult<Vec<usize>> {
        let conn = self.connectivity()?;
        let mut out = IndexedArray::with_capacity(conn.len(), conn.values().len());
        let mut changed = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            match f(&cell) {
                Some((ty, nodes)) => {
                    out.push_group(std::iter::once(ty.code()).chain(nodes));
                    changed.push(i);
                }
                None => {
                    out.push_group(std::iter::once(cell.ty.code()).chain(cell.nodes.iter().copied()));
                }
            }
        }
        if !changed.is_empty() {
            self.replace_connectivity(out)?;
        }
        Ok(changed)
    }

    /// Replace dynamic cells by the static type they describe: polygons by
    /// node count, polyhedra recognized as `TETRA4`, `PYRA5`, `PENTA6`,
    /// `HEXA8` or `HEXGP12`. Unrecognized cells are left alone.
    ///
    /// Returns the ids of the converted cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without connectivity.
    pub fn un_polyze(&mut self) -> MeshResult<Vec<usize>> {
        let changed = self.rewrite_cells(|cell| match cell.ty {
            GeometricType::Polyline if cell.nodes.len() == 2 => {
                Some((GeometricType::Seg2, cell.nodes.iter().copied().collect()))
            }
            GeometricType::Polygon | GeometricType::QPolygon => {
                let ty = unpoly_2d(cell.ty.is_quadratic(), cell.nodes.len());
                (ty != cell.ty).then(|| (ty, cell.nodes.iter().copied().collect()))
            }
            GeometricType::Polyhedron => unpoly_3d(cell.nodes),
            _ => None,
        })?;
        debug!(count = changed.len(), "dynamic cells converted to static types");
        Ok(changed)
    }

    /// Collapse the repeated nodes of linear 2D and 3D cells. A `QUAD4` with
    /// two equal corners becomes a `TRI3`; a 3D cell is rebuilt from its
    /// remaining faces and recognized as a static type when possible.
    ///
    /// Returns the ids of the modified cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidArgument`] for a mesh of dimension 0 or 1.
    pub fn convert_degenerated_cells(&mut self) -> MeshResult<Vec<usize>> {
        let dim = self.mesh_dimension()?;
        if dim < 2 {
            return Err(MeshError::invalid_argument(format!(
                "degenerated cells can only be converted in 2D or 3D, not {dim}D"
            )));
        }
        let changed = self.rewrite_cells(simplify_degenerated)?;
        if !changed.is_empty() {
            info!(count = changed.len(), "degenerated cells converted");
        }
        Ok(changed)
    }

    /// Like [`UMesh::convert_degenerated_cells`], then remove the cells left
    /// without volume (fewer distinct nodes than a simplex needs). Returns the
    /// ids of the removed cells.
    ///
    /// # Errors
    ///
    /// See [`UMesh::convert_degenerated_cells`].
    pub fn convert_degenerated_cells_and_remove_flat_ones(&mut self) -> MeshResult<Vec<usize>> {
        self.convert_degenerated_cells()?;
        let mut kept = Vec::new();
        let mut removed = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if is_flat(cell.ty, cell.nodes) {
                removed.push(i);
            } else {
                kept.push(i);
            }
        }
        if !removed.is_empty() {
            let conn = self.connectivity()?.extract_groups(&kept)?;
            self.replace_connectivity(conn)?;
            info!(
                removed = removed.len(),
                remaining = kept.len(),
                "flat cells removed"
            );
        }
        Ok(removed)
    }
}
