//! Conversions between linear, quadratic and dynamic cell types.

use hashbrown::HashMap;
use mesh_types::{
    Coords, FACE_SEPARATOR, GeometricType, IndexedArray, MeshError, MeshResult, to_id, to_index,
};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::nodes::usize_to_f64;
use crate::params::QuadraticConversion;
use crate::umesh::UMesh;

/// Creates the nodes added by a linear to quadratic conversion, sharing the
/// ones that sit on a common edge or face.
struct MidNodes<'a> {
    coords: &'a Coords,
    first_new: usize,
    added: Vec<f64>,
    edges: HashMap<(i64, i64), i64>,
    faces: HashMap<SmallVec<[i64; 4]>, i64>,
}

impl<'a> MidNodes<'a> {
    fn new(coords: &'a Coords) -> Self {
        Self {
            coords,
            first_new: coords.number_of_nodes(),
            added: Vec::new(),
            edges: HashMap::new(),
            faces: HashMap::new(),
        }
    }

    fn added_count(&self) -> usize {
        self.added.len() / self.coords.dim().max(1)
    }

    /// Append the barycenter of `ids`.
    fn push_barycenter(&mut self, ids: &[i64]) -> MeshResult<i64> {
        let n = self.coords.number_of_nodes();
        let dim = self.coords.dim();
        let start = self.added.len();
        self.added.resize(start + dim, 0.0);
        for &id in ids {
            let i = to_index(id)
                .filter(|&i| i < n)
                .ok_or_else(|| MeshError::out_of_range("corner of a cell", id, n))?;
            for (acc, &c) in self.added[start..].iter_mut().zip(self.coords.node(i)) {
                *acc += c;
            }
        }
        let weight = usize_to_f64(ids.len().max(1));
        for acc in &mut self.added[start..] {
            *acc /= weight;
        }
        Ok(to_id(self.first_new + self.added_count() - 1))
    }

    fn edge(&mut self, a: i64, b: i64) -> MeshResult<i64> {
        let key = (a.min(b), a.max(b));
        if let Some(&id) = self.edges.get(&key) {
            return Ok(id);
        }
        let id = self.push_barycenter(&[a, b])?;
        self.edges.insert(key, id);
        Ok(id)
    }

    fn face(&mut self, corners: &[i64]) -> MeshResult<i64> {
        let mut key: SmallVec<[i64; 4]> = corners.iter().copied().collect();
        key.sort_unstable();
        if let Some(&id) = self.faces.get(&key) {
            return Ok(id);
        }
        let id = self.push_barycenter(corners)?;
        self.faces.insert(key, id);
        Ok(id)
    }

    /// Full connectivity of the quadratic counterpart of a linear cell.
    fn quadratic_cell(
        &mut self,
        quadratic: GeometricType,
        corners: &[i64],
    ) -> MeshResult<SmallVec<[i64; 27]>> {
        if quadratic == GeometricType::QPolygon {
            let k = corners.len();
            let mut out: SmallVec<[i64; 27]> = corners.iter().copied().collect();
            for i in 0..k {
                out.push(self.edge(corners[i], corners[(i + 1) % k])?);
            }
            return Ok(out);
        }
        let len = quadratic.node_count().unwrap_or(corners.len());
        let mut out: SmallVec<[i64; 27]> = SmallVec::from_elem(-1, len);
        out[..corners.len()].copy_from_slice(corners);

        let edge_templates = match quadratic.dimension() {
            1 => &[][..],
            2 => quadratic.son_templates(),
            _ => quadratic.edge_templates(),
        };
        if quadratic.dimension() == 1 {
            out[2] = self.edge(corners[0], corners[1])?;
        }
        for tpl in edge_templates {
            let (a, b, m) = (tpl.nodes[0], tpl.nodes[1], tpl.nodes[2]);
            out[m] = self.edge(out[a], out[b])?;
        }
        match quadratic {
            GeometricType::Tri7 | GeometricType::Quad9 => {
                out[len - 1] = self.push_barycenter(corners)?;
            }
            GeometricType::Penta18 | GeometricType::Hexa27 => {
                for tpl in quadratic.son_templates() {
                    if tpl.ty == GeometricType::Quad9 {
                        let face: SmallVec<[i64; 4]> =
                            tpl.nodes[..4].iter().map(|&i| out[i]).collect();
                        out[tpl.nodes[8]] = self.face(&face)?;
                    }
                }
                if quadratic == GeometricType::Hexa27 {
                    out[26] = self.push_barycenter(corners)?;
                }
            }
            _ => {}
        }
        Ok(out)
    }
}

impl UMesh {
    /// Replace linear cells by their quadratic counterpart. Mid-edge nodes
    /// (and, with [`QuadraticConversion::Rich`], face and volume centers) are
    /// appended to a new coordinates buffer and shared between neighbor
    /// cells; existing node ids are preserved.
    ///
    /// Types without a rich counterpart fall back to the minimal one.
    /// Returns the ids of the converted cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without coordinates or
    /// connectivity and [`MeshError::OutOfRange`] for a bad node id.
    pub fn convert_linear_cells_to_quadratic(
        &mut self,
        conversion: QuadraticConversion,
    ) -> MeshResult<Vec<usize>> {
        let rich = conversion == QuadraticConversion::Rich;
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let mut mids = MidNodes::new(&coords);
        let conn = self.connectivity()?;
        let mut out = IndexedArray::with_capacity(conn.len(), 2 * conn.values().len());
        let mut converted = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            let target = cell
                .ty
                .quadratic_type(rich)
                .or_else(|| cell.ty.quadratic_type(false));
            match target {
                Some(quadratic) => {
                    let nodes = mids.quadratic_cell(quadratic, cell.nodes)?;
                    out.push_group(std::iter::once(quadratic.code()).chain(nodes));
                    converted.push(i);
                }
                None => {
                    out.push_group(std::iter::once(cell.ty.code()).chain(cell.nodes.iter().copied()));
                }
            }
        }
        let added_count = mids.added_count();
        let MidNodes { added, .. } = mids;
        let grown = if added.is_empty() {
            None
        } else {
            let mut data = coords.as_slice().to_vec();
            data.extend(added);
            Some(Coords::new(data, coords.dim())?)
        };
        drop(coords);
        if let Some(grown) = grown {
            self.set_coords(grown);
        }
        if !converted.is_empty() {
            self.replace_connectivity(out)?;
        }
        info!(
            cells = converted.len(),
            added_nodes = added_count,
            ?conversion,
            "linear cells converted to quadratic"
        );
        Ok(converted)
    }

    /// Replace quadratic cells by their linear counterpart, keeping the
    /// corner nodes. The dropped nodes stay in the coordinates; see
    /// [`UMesh::zip_coords`]. Returns the ids of the converted cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotConfigured`] without connectivity.
    pub fn convert_quadratic_cells_to_linear(&mut self) -> MeshResult<Vec<usize>> {
        let conn = self.connectivity()?;
        let mut out = IndexedArray::with_capacity(conn.len(), conn.values().len());
        let mut converted = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty.is_quadratic() {
                let corners = cell.ty.corner_count(cell.nodes.len());
                let linear = cell.ty.linear_type();
                out.push_group(
                    std::iter::once(linear.code()).chain(cell.nodes[..corners].iter().copied()),
                );
                converted.push(i);
            } else {
                out.push_group(std::iter::once(cell.ty.code()).chain(cell.nodes.iter().copied()));
            }
        }
        if !converted.is_empty() {
            self.replace_connectivity(out)?;
        }
        debug!(count = converted.len(), "quadratic cells converted to linear");
        Ok(converted)
    }

    /// Convert the listed cells to the dynamic type of their dimension:
    /// `POLYLINE`, `POLYGON`/`QPOLYG` or `POLYHED`. Cells already dynamic are
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::OutOfRange`] for a bad cell id,
    /// [`MeshError::InvalidArgument`] for a quadratic 3D cell or a 0D cell.
    pub fn convert_to_poly_types(&mut self, cell_ids: &[usize]) -> MeshResult<()> {
        let n = self.number_of_cells()?;
        let mut replacements: Vec<(usize, GeometricType, SmallVec<[i64; 32]>)> = Vec::new();
        for &i in cell_ids {
            if i >= n {
                return Err(MeshError::out_of_range("cell to convert", to_id(i), n));
            }
            let cell = self.cell(i)?;
            if cell.ty.is_dynamic() {
                continue;
            }
            let poly = cell.ty.poly_type().ok_or_else(|| {
                MeshError::invalid_argument(format!("cell {i}: {} has no dynamic type", cell.ty))
            })?;
            let nodes: SmallVec<[i64; 32]> = match cell.ty.dimension() {
                1 => {
                    let mut nodes: SmallVec<[i64; 32]> = SmallVec::new();
                    nodes.push(cell.nodes[0]);
                    nodes.extend(cell.nodes[2..].iter().copied());
                    nodes.push(cell.nodes[1]);
                    nodes
                }
                2 => {
                    let corners = cell.ty.corner_count(cell.nodes.len());
                    let keep = if cell.ty.is_quadratic() { 2 * corners } else { corners };
                    cell.nodes[..keep].iter().copied().collect()
                }
                _ => {
                    if cell.ty.is_quadratic() {
                        return Err(MeshError::invalid_argument(format!(
                            "cell {i}: quadratic 3D cell {} cannot become a polyhedron",
                            cell.ty
                        )));
                    }
                    let mut nodes: SmallVec<[i64; 32]> = SmallVec::new();
                    cell.ty.for_each_son(cell.nodes, |_, face| {
                        if !nodes.is_empty() {
                            nodes.push(FACE_SEPARATOR);
                        }
                        nodes.extend_from_slice(face);
                    });
                    nodes
                }
            };
            replacements.push((i, poly, nodes));
        }
        if replacements.is_empty() {
            return Ok(());
        }
        let conn = self.connectivity()?;
        let mut out = IndexedArray::with_capacity(conn.len(), conn.values().len());
        let mut by_cell: HashMap<usize, usize> = HashMap::new();
        for (k, (i, _, _)) in replacements.iter().enumerate() {
            by_cell.insert(*i, k);
        }
        for (i, group) in conn.iter().enumerate() {
            match by_cell.get(&i) {
                Some(&k) => {
                    let (_, ty, nodes) = &replacements[k];
                    out.push_group(std::iter::once(ty.code()).chain(nodes.iter().copied()));
                }
                None => out.push_group(group.iter().copied()),
            }
        }
        debug!(count = replacements.len(), "cells converted to dynamic types");
        self.replace_connectivity(out)
    }

    /// Convert every cell to the dynamic type of its dimension.
    ///
    /// # Errors
    ///
    /// See [`UMesh::convert_to_poly_types`].
    pub fn convert_all_to_poly(&mut self) -> MeshResult<()> {
        let ids: Vec<usize> = (0..self.number_of_cells()?).collect();
        self.convert_to_poly_types(&ids)
    }
}
