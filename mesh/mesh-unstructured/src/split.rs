//! Splitting of cells into simplices.
//!
//! Every table below lists tetrahedra in the MED orientation: applied to a
//! well oriented cell, each sub-cell is well oriented too, and the volumes
//! add up to the volume of the cell.

use mesh_types::{
    Coords, GeometricType, IndexedArray, MeshError, MeshResult, polyhedron_faces, to_id,
};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use tracing::debug;

use crate::nodes::{iso_barycenter, node_point, require_mesh_dim, require_space_dim, usize_to_f64};
use crate::params::{SimplexizePolicy, SplittingPolicy};
use crate::umesh::UMesh;

/// `QUAD4` split along the diagonal 0-2.
const QUAD4_POL0: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];

/// `QUAD4` split along the diagonal 1-3.
const QUAD4_POL1: [[usize; 3]; 2] = [[0, 1, 3], [1, 2, 3]];

/// `HEXA8` into five tetrahedra, one of them central.
const PLANAR_FACE_5: [[usize; 4]; 5] = [
    [0, 5, 2, 7],
    [1, 2, 0, 5],
    [3, 0, 2, 7],
    [4, 5, 0, 7],
    [6, 2, 5, 7],
];

/// `HEXA8` into six tetrahedra around the diagonal 0-6.
const PLANAR_FACE_6: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

const PYRA5_TETRAS: [[usize; 4]; 2] = [[0, 1, 2, 4], [0, 2, 3, 4]];

const PENTA6_TETRAS: [[usize; 4]; 3] = [[0, 1, 2, 3], [3, 5, 4, 2], [4, 2, 1, 3]];

const HEXGP12_TETRAS: [[usize; 4]; 12] = [
    [0, 1, 5, 6],
    [6, 11, 7, 5],
    [7, 5, 1, 6],
    [1, 4, 5, 7],
    [7, 11, 10, 5],
    [10, 5, 4, 7],
    [1, 2, 4, 7],
    [7, 10, 8, 4],
    [8, 4, 2, 7],
    [2, 3, 4, 8],
    [8, 10, 9, 4],
    [9, 4, 3, 8],
];

/// Edges of a `HEXA8`, giving the mid nodes 8 to 19 of the `HEXA27` layout.
const HEXA27_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Faces of a `HEXA8`, giving the face centers 20 to 25 of the `HEXA27`
/// layout. Node 26 is the cell center.
const HEXA27_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
    [4, 5, 6, 7],
];

/// The eight sub-hexahedra of a `HEXA27` layout.
const GENERAL_48_HEXAS: [[usize; 8]; 8] = [
    [0, 8, 20, 11, 16, 21, 26, 24],
    [8, 1, 9, 20, 21, 17, 22, 26],
    [20, 9, 2, 10, 26, 22, 18, 23],
    [11, 20, 10, 3, 24, 26, 23, 19],
    [16, 21, 26, 24, 4, 12, 25, 15],
    [21, 17, 22, 26, 12, 5, 13, 25],
    [26, 22, 18, 23, 25, 13, 6, 14],
    [24, 26, 23, 19, 15, 25, 14, 7],
];

/// Accumulates the split connectivity and the points added on the way.
struct Splitter<'a> {
    coords: &'a Coords,
    first_new: usize,
    added: Vec<f64>,
    conn: IndexedArray,
    new_to_old: Vec<usize>,
}

impl<'a> Splitter<'a> {
    fn new(coords: &'a Coords, cells: usize) -> Self {
        Self {
            coords,
            first_new: coords.number_of_nodes(),
            added: Vec::new(),
            conn: IndexedArray::with_capacity(cells, 5 * cells),
            new_to_old: Vec::with_capacity(cells),
        }
    }

    fn added_count(&self) -> usize {
        self.added.len() / 3
    }

    fn add_point(&mut self, p: &Point3<f64>) -> i64 {
        let id = to_id(self.first_new + self.added_count());
        self.added.extend_from_slice(&[p.x, p.y, p.z]);
        id
    }

    fn push(&mut self, old: usize, ty: GeometricType, nodes: impl IntoIterator<Item = i64>) {
        self.conn.push_group(std::iter::once(ty.code()).chain(nodes));
        self.new_to_old.push(old);
    }

    fn push_tetras<const N: usize>(&mut self, old: usize, nodes: &[i64], table: &[[usize; N]]) {
        let ty = if N == 3 { GeometricType::Tri3 } else { GeometricType::Tetra4 };
        for t in table {
            self.push(old, ty, t.iter().map(|&i| nodes[i]));
        }
    }

    fn split_hexa(&mut self, old: usize, nodes: &[i64], policy: SplittingPolicy) -> MeshResult<()> {
        match policy {
            SplittingPolicy::PlanarFace5 => self.push_tetras(old, nodes, &PLANAR_FACE_5),
            SplittingPolicy::PlanarFace6 => self.push_tetras(old, nodes, &PLANAR_FACE_6),
            SplittingPolicy::General24 => {
                let mut centers: SmallVec<[Point3<f64>; 6]> = SmallVec::new();
                for tpl in GeometricType::Hexa8.son_templates() {
                    let face: SmallVec<[i64; 4]> = tpl.nodes.iter().map(|&i| nodes[i]).collect();
                    centers.push(iso_barycenter(self.coords, &face)?);
                }
                let center = mean(&centers);
                let face_ids: SmallVec<[i64; 6]> = centers.iter().map(|c| self.add_point(c)).collect();
                let center_id = self.add_point(&center);
                for (tpl, &fc) in GeometricType::Hexa8.son_templates().iter().zip(&face_ids) {
                    let k = tpl.nodes.len();
                    for j in 0..k {
                        let (a, b) = (nodes[tpl.nodes[j]], nodes[tpl.nodes[(j + 1) % k]]);
                        self.push(old, GeometricType::Tetra4, [a, b, fc, center_id]);
                    }
                }
            }
            SplittingPolicy::General48 => {
                let mut local: SmallVec<[i64; 27]> = nodes[..8].iter().copied().collect();
                let mut points: SmallVec<[Point3<f64>; 27]> = SmallVec::new();
                for &n in &nodes[..8] {
                    points.push(node_point(self.coords, n)?);
                }
                for [a, b] in HEXA27_EDGES {
                    points.push(Point3::from((points[a].coords + points[b].coords) / 2.0));
                }
                for face in HEXA27_FACES {
                    let corners: SmallVec<[Point3<f64>; 4]> = face.iter().map(|&i| points[i]).collect();
                    points.push(mean(&corners));
                }
                points.push(mean(&points[..8]));
                for p in &points[8..] {
                    let id = self.add_point(p);
                    local.push(id);
                }
                for hexa in GENERAL_48_HEXAS {
                    let sub: SmallVec<[i64; 8]> = hexa.iter().map(|&i| local[i]).collect();
                    self.push_tetras(old, &sub, &PLANAR_FACE_6);
                }
            }
        }
        Ok(())
    }

    fn split_polyhedron(&mut self, old: usize, nodes: &[i64]) -> MeshResult<()> {
        let faces: SmallVec<[&[i64]; 8]> = polyhedron_faces(nodes).collect();
        let mut centers: SmallVec<[Point3<f64>; 8]> = SmallVec::new();
        for face in &faces {
            centers.push(iso_barycenter(self.coords, face)?);
        }
        let center = mean(&centers);
        let face_ids: SmallVec<[i64; 8]> = centers.iter().map(|c| self.add_point(c)).collect();
        let center_id = self.add_point(&center);
        for (face, &fc) in faces.iter().zip(&face_ids) {
            let k = face.len();
            for j in 0..k {
                self.push(old, GeometricType::Tetra4, [face[j], face[(j + 1) % k], fc, center_id]);
            }
        }
        Ok(())
    }
}

fn mean(points: &[Point3<f64>]) -> Point3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / usize_to_f64(points.len().max(1)))
}

impl UMesh {
    /// Split cells into simplices without adding nodes: `QUAD4` cells of a 2D
    /// mesh with [`SimplexizePolicy::Pol0`] or [`SimplexizePolicy::Pol1`],
    /// `HEXA8` cells of a 3D mesh with the planar-face policies. Other cells
    /// are copied.
    ///
    /// Returns, for each new cell, the cell it comes from.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidArgument`] when the policy does not fit
    /// the mesh dimension.
    pub fn simplexize(&mut self, policy: SimplexizePolicy) -> MeshResult<Vec<usize>> {
        let dim = self.mesh_dimension()?;
        let (target, quads): (GeometricType, Option<&[[usize; 3]]>) = match (dim, policy) {
            (2, SimplexizePolicy::Pol0) => (GeometricType::Quad4, Some(&QUAD4_POL0[..])),
            (2, SimplexizePolicy::Pol1) => (GeometricType::Quad4, Some(&QUAD4_POL1[..])),
            (3, SimplexizePolicy::PlanarFace5 | SimplexizePolicy::PlanarFace6) => {
                (GeometricType::Hexa8, None)
            }
            _ => {
                return Err(MeshError::invalid_argument(format!(
                    "policy {policy:?} is not available for a mesh of dimension {dim}"
                )));
            }
        };
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let n_cells = self.number_of_cells()?;
        let mut splitter = Splitter::new(&coords, n_cells);
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty != target {
                splitter.push(i, cell.ty, cell.nodes.iter().copied());
                continue;
            }
            match (quads, policy) {
                (Some(table), _) => splitter.push_tetras(i, cell.nodes, table),
                (None, SimplexizePolicy::PlanarFace5) => {
                    splitter.push_tetras(i, cell.nodes, &PLANAR_FACE_5);
                }
                (None, _) => splitter.push_tetras(i, cell.nodes, &PLANAR_FACE_6),
            }
        }
        let Splitter { conn, new_to_old, .. } = splitter;
        drop(coords);
        debug!(before = n_cells, after = new_to_old.len(), ?policy, "cells simplexized");
        self.replace_connectivity(conn)?;
        Ok(new_to_old)
    }

    /// Split every linear 3D cell into `TETRA4` cells. `HEXA8` cells follow
    /// `policy`; polyhedra are split around their face centers and their
    /// center. Added points are appended to a new coordinates buffer.
    ///
    /// Returns, for each new cell, the cell it comes from, and the number of
    /// added points.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the mesh is 3D in a 3D
    /// space, and [`MeshError::InvalidArgument`] for a quadratic cell.
    pub fn tetrahedrize(&mut self, policy: SplittingPolicy) -> MeshResult<(Vec<usize>, usize)> {
        require_mesh_dim("tetrahedrize", self.mesh_dimension()?, 3)?;
        require_space_dim("tetrahedrize", self.space_dimension()?, 3)?;
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let n_cells = self.number_of_cells()?;
        let mut splitter = Splitter::new(&coords, n_cells);
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            match cell.ty {
                GeometricType::Tetra4 => splitter.push(i, cell.ty, cell.nodes.iter().copied()),
                GeometricType::Pyra5 => splitter.push_tetras(i, cell.nodes, &PYRA5_TETRAS),
                GeometricType::Penta6 => splitter.push_tetras(i, cell.nodes, &PENTA6_TETRAS),
                GeometricType::HexGp12 => splitter.push_tetras(i, cell.nodes, &HEXGP12_TETRAS),
                GeometricType::Hexa8 => splitter.split_hexa(i, cell.nodes, policy)?,
                GeometricType::Polyhedron => splitter.split_polyhedron(i, cell.nodes)?,
                other => {
                    return Err(MeshError::invalid_argument(format!(
                        "cell {i}: {other} cannot be tetrahedrized, only linear 3D cells can"
                    )));
                }
            }
        }
        let added_count = splitter.added_count();
        let Splitter { conn, new_to_old, added, .. } = splitter;
        let grown = if added.is_empty() {
            None
        } else {
            let mut data = coords.as_slice().to_vec();
            data.extend(added);
            Some(Coords::new(data, 3)?)
        };
        drop(coords);
        if let Some(grown) = grown {
            self.set_coords(grown);
        }
        debug!(
            before = n_cells,
            after = new_to_old.len(),
            added_points = added_count,
            ?policy,
            "cells tetrahedrized"
        );
        self.replace_connectivity(conn)?;
        Ok((new_to_old, added_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OrientationParams;

    fn unit_hexa() -> UMesh {
        let mut m = UMesh::new(3);
        m.set_coords(
            Coords::new(
                vec![
                    0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, //
                    0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0,
                ],
                3,
            )
            .unwrap(),
        );
        m.allocate_cells(1);
        m.insert_next_cell(GeometricType::Hexa8, &[0, 1, 2, 3, 4, 5, 6, 7]).unwrap();
        m
    }

    fn assert_well_oriented(m: &mut UMesh) {
        let fixed = m
            .find_and_correct_bad_oriented_3d_cells(&OrientationParams::default())
            .unwrap();
        assert!(fixed.is_empty(), "badly oriented sub-cells: {fixed:?}");
    }

    #[test]
    fn test_simplexize_quads() {
        let mut m = UMesh::new(2);
        m.set_coords(Coords::new(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 2.0, 0.0], 2).unwrap());
        m.allocate_cells(2);
        m.insert_next_cell(GeometricType::Quad4, &[0, 1, 2, 3]).unwrap();
        m.insert_next_cell(GeometricType::Tri3, &[1, 4, 2]).unwrap();

        let mut pol1 = m.clone();
        assert_eq!(m.simplexize(SimplexizePolicy::Pol0).unwrap(), vec![0, 0, 1]);
        assert_eq!(m.cell(0).unwrap().nodes, &[0, 1, 2]);
        assert_eq!(m.cell(1).unwrap().nodes, &[0, 2, 3]);
        assert_eq!(m.cell(2).unwrap().nodes, &[1, 4, 2]);

        pol1.simplexize(SimplexizePolicy::Pol1).unwrap();
        assert_eq!(pol1.cell(0).unwrap().nodes, &[0, 1, 3]);
        assert_eq!(pol1.cell(1).unwrap().nodes, &[1, 2, 3]);
    }

    #[test]
    fn test_simplexize_rejects_mismatched_policy() {
        let mut m = unit_hexa();
        assert!(matches!(
            m.simplexize(SimplexizePolicy::Pol0),
            Err(MeshError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_simplexize_hexa() {
        let mut five = unit_hexa();
        assert_eq!(five.simplexize(SimplexizePolicy::PlanarFace5).unwrap(), vec![0; 5]);
        assert_well_oriented(&mut five);

        let mut six = unit_hexa();
        assert_eq!(six.simplexize(SimplexizePolicy::PlanarFace6).unwrap(), vec![0; 6]);
        assert_eq!(six.number_of_nodes().unwrap(), 8);
        assert_well_oriented(&mut six);
    }

    #[test]
    fn test_tetrahedrize_general_policies() {
        let mut m = unit_hexa();
        let (n2o, added) = m.tetrahedrize(SplittingPolicy::General24).unwrap();
        assert_eq!((n2o.len(), added), (24, 7));
        assert_eq!(m.number_of_nodes().unwrap(), 15);
        assert_well_oriented(&mut m);

        let mut m = unit_hexa();
        let (n2o, added) = m.tetrahedrize(SplittingPolicy::General48).unwrap();
        assert_eq!((n2o.len(), added), (48, 19));
        assert_eq!(m.number_of_nodes().unwrap(), 27);
        let center = m.coords().unwrap().read().node(26).to_vec();
        assert_eq!(center, vec![0.5, 0.5, 0.5]);
        assert_well_oriented(&mut m);
    }

    #[test]
    fn test_tetrahedrize_keeps_aliases() {
        let mut m = unit_hexa();
        let alias = m.coords().unwrap().clone();
        m.tetrahedrize(SplittingPolicy::General24).unwrap();
        assert_eq!(alias.read().number_of_nodes(), 8);

        let mut m = unit_hexa();
        let alias = m.coords().unwrap().clone();
        let (_, added) = m.tetrahedrize(SplittingPolicy::PlanarFace6).unwrap();
        assert_eq!(added, 0);
        assert!(alias.ptr_eq(m.coords().unwrap()));
    }

    #[test]
    fn test_tetrahedrize_polyhedron() {
        let mut m = unit_hexa();
        let mut poly = UMesh::new(3);
        poly.set_coords(m.coords().unwrap().clone());
        poly.allocate_cells(1);
        poly.insert_next_cell(
            GeometricType::Polyhedron,
            &[
                0, 1, 2, 3, -1, 4, 7, 6, 5, -1, 0, 4, 5, 1, -1, 1, 5, 6, 2, -1, 2, 6, 7, 3, -1, 3,
                7, 4, 0,
            ],
        )
        .unwrap();
        let (n2o, added) = poly.tetrahedrize(SplittingPolicy::PlanarFace6).unwrap();
        assert_eq!((n2o.len(), added), (24, 7));
        assert_well_oriented(&mut poly);
        assert!(m.tetrahedrize(SplittingPolicy::PlanarFace5).is_ok());
    }

    fn single_cell(ty: GeometricType, xyz: Vec<f64>) -> UMesh {
        let n = xyz.len() / 3;
        let nodes: Vec<i64> = (0..n).map(|i| i64::try_from(i).unwrap()).collect();
        let mut m = UMesh::new(3);
        m.set_coords(Coords::new(xyz, 3).unwrap());
        m.allocate_cells(1);
        m.insert_next_cell(ty, &nodes).unwrap();
        m
    }

    /// Split the single cell of `m` and check the tetrahedra fill it exactly.
    fn assert_tetrahedrize_fills_cell(mut m: UMesh, tetras: usize, volume: f64) {
        let before = m.measure_field(false).unwrap();
        approx::assert_relative_eq!(before[0], volume, epsilon = 1e-12);

        let (n2o, added) = m.tetrahedrize(SplittingPolicy::PlanarFace5).unwrap();
        assert_eq!((n2o, added), (vec![0; tetras], 0));
        let after = m.measure_field(false).unwrap();
        assert!(after.iter().all(|&v| v > 0.0), "flat or inverted tetrahedra: {after:?}");
        approx::assert_relative_eq!(after.iter().sum::<f64>(), volume, epsilon = 1e-12);
        assert_well_oriented(&mut m);
    }

    #[test]
    fn test_tetrahedrize_pyramid() {
        let m = single_cell(
            GeometricType::Pyra5,
            vec![
                0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, //
                0.5, 0.5, 1.0,
            ],
        );
        assert_tetrahedrize_fills_cell(m, 2, 1.0 / 3.0);
    }

    #[test]
    fn test_tetrahedrize_pentahedron() {
        let m = single_cell(
            GeometricType::Penta6,
            vec![
                0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0,
            ],
        );
        assert_tetrahedrize_fills_cell(m, 3, 0.5);
    }

    #[test]
    fn test_tetrahedrize_hexagonal_prism() {
        // regular hexagon of unit side turning clockwise seen from above
        let mut xyz = Vec::new();
        for z in [0.0, 1.0] {
            for k in 0..6 {
                let angle = -f64::from(k) * std::f64::consts::FRAC_PI_3;
                xyz.extend([angle.cos(), angle.sin(), z]);
            }
        }
        let m = single_cell(GeometricType::HexGp12, xyz);
        assert_tetrahedrize_fills_cell(m, 12, 1.5 * 3.0_f64.sqrt());
    }

    #[test]
    fn test_tetrahedrize_rejects_quadratic_cells() {
        let mut m = UMesh::new(3);
        m.set_coords(Coords::new(vec![0.0; 30], 3).unwrap());
        m.allocate_cells(1);
        m.insert_next_cell(GeometricType::Tetra10, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        assert!(matches!(
            m.tetrahedrize(SplittingPolicy::PlanarFace6),
            Err(MeshError::InvalidArgument(_))
        ));
    }
}
