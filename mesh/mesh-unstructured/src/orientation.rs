//! Orientation checks and repairs for 2D and 3D cells.
//!
//! Surface cells are compared against a reference normal. Volume cells
//! follow the MED convention: the first face of a static cell (the base of an
//! extrusion, the first three nodes of a tetrahedron) turns its normal away
//! from the rest of the cell, and polyhedron faces are listed with outward
//! normals.

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use mesh_types::{
    Coords, FACE_SEPARATOR, GeometricType, MeshError, MeshResult, polyhedron_faces, reverse_2d,
};
use nalgebra::Vector3;
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::nodes::{
    area_vector, boundary_ring, node_point, require_mesh_dim, require_space_dim,
};
use crate::params::OrientationParams;
use crate::umesh::UMesh;

/// Whether a 2D cell turns counter-clockwise around `ref_normal`.
///
/// Quadratic cells use their mid-edge nodes as well as their corners.
///
/// # Errors
///
/// Returns [`MeshError::OutOfRange`] for a node outside `coords`.
pub fn is_polygon_well_oriented(
    ty: GeometricType,
    nodes: &[i64],
    coords: &Coords,
    ref_normal: &Vector3<f64>,
) -> MeshResult<bool> {
    let ring = boundary_ring(ty, nodes);
    Ok(ref_normal.dot(&area_vector(coords, &ring)?) > 0.0)
}

/// Whether an extruded static cell (`PENTA6`, `HEXA8`, `HEXGP12`) has its
/// base normal pointing away from its top. A flat cell counts as well
/// oriented since flipping it changes nothing.
///
/// # Errors
///
/// Returns [`MeshError::InvalidArgument`] for a non-extruded type and
/// [`MeshError::OutOfRange`] for a node outside `coords`.
pub fn is_3d_extruded_static_cell_well_oriented(
    ty: GeometricType,
    nodes: &[i64],
    coords: &Coords,
) -> MeshResult<bool> {
    let base = extruded_base(ty, nodes)?;
    let normal = area_vector(coords, &nodes[..base])?;
    let rise = node_point(coords, nodes[base])? - node_point(coords, nodes[0])?;
    Ok(normal.dot(&rise) <= 0.0)
}

/// Flip an extruded static cell: base and top are both reversed around their
/// first node.
///
/// # Errors
///
/// Returns [`MeshError::InvalidArgument`] for a non-extruded type.
pub fn correct_extruded_static_cell(ty: GeometricType, nodes: &mut [i64]) -> MeshResult<()> {
    let base = extruded_base(ty, nodes)?;
    nodes[1..base].reverse();
    nodes[base + 1..2 * base].reverse();
    Ok(())
}

fn extruded_base(ty: GeometricType, nodes: &[i64]) -> MeshResult<usize> {
    match ty.extruded_base_size() {
        Some(base) if nodes.len() >= 2 * base => Ok(base),
        Some(base) => Err(MeshError::size_mismatch(
            format!("nodes of {ty}"),
            2 * base,
            nodes.len(),
        )),
        None => Err(MeshError::invalid_argument(format!(
            "{ty} is not an extruded static type"
        ))),
    }
}

fn is_tetra_well_oriented(nodes: &[i64], coords: &Coords) -> MeshResult<bool> {
    let p = [
        node_point(coords, nodes[0])?,
        node_point(coords, nodes[1])?,
        node_point(coords, nodes[2])?,
        node_point(coords, nodes[3])?,
    ];
    let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
    Ok(normal.dot(&(p[3] - p[0])) <= 0.0)
}

fn is_pyramid_well_oriented(nodes: &[i64], coords: &Coords) -> MeshResult<bool> {
    let normal = area_vector(coords, &nodes[..4])?;
    let rise = node_point(coords, nodes[4])? - node_point(coords, nodes[0])?;
    Ok(normal.dot(&rise) <= 0.0)
}

/// Signed volume of a polyhedron, positive when its faces point outward.
///
/// # Errors
///
/// Returns [`MeshError::OutOfRange`] for a node outside `coords`.
pub fn polyhedron_signed_volume(nodes: &[i64], coords: &Coords) -> MeshResult<f64> {
    let mut six_volume = 0.0;
    for face in polyhedron_faces(nodes) {
        let p0 = node_point(coords, face[0])?;
        six_volume += p0.coords.dot(&area_vector(coords, face)?);
    }
    Ok(six_volume / 6.0)
}

fn has_repeated_directed_edge(nodes: &[i64]) -> bool {
    let mut seen = HashSet::new();
    for face in polyhedron_faces(nodes) {
        let k = face.len();
        for i in 0..k {
            if !seen.insert((face[i], face[(i + 1) % k])) {
                return true;
            }
        }
    }
    false
}

/// Whether a polyhedron is consistently oriented outward: no directed edge is
/// shared by two faces and the signed volume is not below `-polyhedron_eps`.
///
/// # Errors
///
/// Returns [`MeshError::OutOfRange`] for a node outside `coords`.
pub fn is_polyhedron_well_oriented(
    nodes: &[i64],
    coords: &Coords,
    params: &OrientationParams,
) -> MeshResult<bool> {
    if has_repeated_directed_edge(nodes) {
        return Ok(false);
    }
    Ok(polyhedron_signed_volume(nodes, coords)? > -params.polyhedron_eps)
}

fn flip_face(face: &mut [i64]) {
    if face.len() > 1 {
        face[1..].reverse();
    }
}

fn contains_directed_edge(face: &[i64], a: i64, b: i64) -> bool {
    let k = face.len();
    (0..k).any(|i| face[i] == a && face[(i + 1) % k] == b)
}

/// Node list of one cell being repaired.
type CellNodes = SmallVec<[i64; 32]>;

/// Make the faces of polyhedron `cell` consistent and outward.
///
/// Starting from the first face, the orientation spreads over the face graph:
/// a neighbor running a shared edge in the same direction is flipped. The
/// whole cell is then flipped if its volume is negative. `nodes` is only
/// written when the repair succeeds.
///
/// # Errors
///
/// Returns [`MeshError::IrreparableGeometry`] when the faces are not
/// connected through their edges or when two faces disagree after
/// propagation, and [`MeshError::OutOfRange`] for a node outside `coords`.
pub fn try_to_correct_polyhedron_orientation(
    cell: usize,
    nodes: &mut [i64],
    coords: &Coords,
    params: &OrientationParams,
) -> MeshResult<()> {
    let mut work = CellNodes::from_slice(nodes);
    orient_polyhedron_faces(cell, &mut work, coords, params)?;
    nodes.copy_from_slice(&work);
    Ok(())
}

fn orient_polyhedron_faces(
    cell: usize,
    nodes: &mut [i64],
    coords: &Coords,
    params: &OrientationParams,
) -> MeshResult<()> {
    let mut faces: Vec<&mut [i64]> = nodes
        .split_mut(|&n| n == FACE_SEPARATOR)
        .filter(|face| !face.is_empty())
        .collect();
    if faces.is_empty() {
        return Err(MeshError::irreparable(cell, "polyhedron without faces"));
    }

    let mut edge_faces: HashMap<(i64, i64), SmallVec<[usize; 2]>> = HashMap::new();
    for (f, face) in faces.iter().enumerate() {
        let k = face.len();
        for i in 0..k {
            let (a, b) = (face[i], face[(i + 1) % k]);
            edge_faces.entry((a.min(b), a.max(b))).or_default().push(f);
        }
    }

    let mut resolved = vec![false; faces.len()];
    let mut queue = VecDeque::from([0]);
    resolved[0] = true;
    while let Some(f) = queue.pop_front() {
        let k = faces[f].len();
        for i in 0..k {
            let (a, b) = (faces[f][i], faces[f][(i + 1) % k]);
            let Some(owners) = edge_faces.get(&(a.min(b), a.max(b))) else {
                continue;
            };
            for &g in owners {
                if g == f {
                    continue;
                }
                let same_direction = contains_directed_edge(&*faces[g], a, b);
                if resolved[g] {
                    if same_direction {
                        return Err(MeshError::irreparable(
                            cell,
                            format!("faces {f} and {g} cannot agree on edge ({a}, {b})"),
                        ));
                    }
                } else {
                    if same_direction {
                        flip_face(&mut *faces[g]);
                    }
                    resolved[g] = true;
                    queue.push_back(g);
                }
            }
        }
    }
    if let Some(lost) = resolved.iter().position(|&r| !r) {
        return Err(MeshError::irreparable(
            cell,
            format!("face {lost} is not connected to the others"),
        ));
    }
    drop(faces);

    if has_repeated_directed_edge(nodes) {
        return Err(MeshError::irreparable(cell, "non-manifold edge"));
    }
    if polyhedron_signed_volume(nodes, coords)? < -params.polyhedron_eps {
        for face in nodes
            .split_mut(|&n| n == FACE_SEPARATOR)
            .filter(|face| !face.is_empty())
        {
            flip_face(face);
        }
    }
    Ok(())
}

/// Repaired copy of a linear 3D cell, or `None` when it is already well
/// oriented (or of a type left alone).
fn repaired_3d_cell(
    i: usize,
    ty: GeometricType,
    nodes: &[i64],
    coords: &Coords,
    params: &OrientationParams,
) -> MeshResult<Option<CellNodes>> {
    let mut fixed = CellNodes::from_slice(nodes);
    match ty {
        GeometricType::Tetra4 if !is_tetra_well_oriented(nodes, coords)? => fixed.swap(1, 2),
        GeometricType::Pyra5 if !is_pyramid_well_oriented(nodes, coords)? => fixed.swap(1, 3),
        GeometricType::Penta6 | GeometricType::Hexa8 | GeometricType::HexGp12
            if !is_3d_extruded_static_cell_well_oriented(ty, nodes, coords)? =>
        {
            correct_extruded_static_cell(ty, &mut fixed)?;
        }
        GeometricType::Polyhedron if !is_polyhedron_well_oriented(nodes, coords, params)? => {
            orient_polyhedron_faces(i, &mut fixed, coords, params)?;
        }
        _ => return Ok(None),
    }
    Ok(Some(fixed))
}

impl UMesh {
    /// Write repaired cells back once every one of them was computed.
    fn commit_repairs(&mut self, repairs: Vec<(usize, CellNodes)>) -> MeshResult<Vec<usize>> {
        let conn = self.connectivity_mut()?;
        let mut ids = Vec::with_capacity(repairs.len());
        for (i, nodes) in repairs {
            conn.group_mut(i)[1..].copy_from_slice(&nodes);
            ids.push(i);
        }
        Ok(ids)
    }

    fn require_2d_in_3d(&self, normal: &[f64]) -> MeshResult<Vector3<f64>> {
        require_mesh_dim("2D orientation", self.mesh_dimension()?, 2)?;
        require_space_dim("2D orientation", self.space_dimension()?, 3)?;
        if normal.len() != 3 {
            return Err(MeshError::size_mismatch("reference normal", 3, normal.len()));
        }
        Ok(Vector3::new(normal[0], normal[1], normal[2]))
    }

    fn require_3d_in_3d(&self) -> MeshResult<()> {
        require_mesh_dim("3D orientation", self.mesh_dimension()?, 3)?;
        require_space_dim("3D orientation", self.space_dimension()?, 3)
    }

    /// Ids of the 2D cells turning clockwise around `normal`.
    ///
    /// With `poly_only`, only `POLYGON` and `QPOLYG` cells are looked at.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the mesh is 2D in a 3D
    /// space and [`MeshError::SizeMismatch`] for a normal without three
    /// components.
    pub fn are_2d_cells_not_correctly_oriented(
        &self,
        normal: &[f64],
        poly_only: bool,
    ) -> MeshResult<Vec<usize>> {
        let normal = self.require_2d_in_3d(normal)?;
        let coords = self.coords()?.read();
        let mut bad = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if poly_only && !cell.ty.is_dynamic() {
                continue;
            }
            if !is_polygon_well_oriented(cell.ty, cell.nodes, &coords, &normal)? {
                bad.push(i);
            }
        }
        Ok(bad)
    }

    /// Reverse the 2D cells turning clockwise around `normal` and return
    /// their ids.
    ///
    /// # Errors
    ///
    /// See [`UMesh::are_2d_cells_not_correctly_oriented`].
    pub fn orient_correctly_2d_cells(
        &mut self,
        normal: &[f64],
        poly_only: bool,
    ) -> MeshResult<Vec<usize>> {
        let bad = self.are_2d_cells_not_correctly_oriented(normal, poly_only)?;
        let conn = self.connectivity_mut()?;
        for &i in &bad {
            let group = conn.group_mut(i);
            let ty = GeometricType::from_code(group[0])?;
            reverse_2d(ty, &mut group[1..]);
        }
        if !bad.is_empty() {
            info!(count = bad.len(), "2D cells reoriented");
        }
        Ok(bad)
    }

    /// Flip the badly oriented `PENTA6`, `HEXA8` and `HEXGP12` cells and
    /// return their ids.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the mesh is 3D in a 3D
    /// space.
    pub fn find_and_correct_bad_oriented_3d_extruded_cells(&mut self) -> MeshResult<Vec<usize>> {
        self.require_3d_in_3d()?;
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let mut repairs = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty.is_extruded()
                && !is_3d_extruded_static_cell_well_oriented(cell.ty, cell.nodes, &coords)?
            {
                let mut nodes = CellNodes::from_slice(cell.nodes);
                correct_extruded_static_cell(cell.ty, &mut nodes)?;
                repairs.push((i, nodes));
            }
        }
        let fixed = self.commit_repairs(repairs)?;
        if !fixed.is_empty() {
            info!(count = fixed.len(), "extruded cells reoriented");
        }
        Ok(fixed)
    }

    /// Repair every linear 3D cell: extruded cells, `TETRA4` (nodes 1 and 2
    /// swapped), `PYRA5` (nodes 1 and 3 swapped) and polyhedra. Returns the
    /// ids of the modified cells. Quadratic cells are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the mesh is 3D in a 3D
    /// space, and [`MeshError::IrreparableGeometry`] for a polyhedron whose
    /// faces cannot be made consistent. No cell is modified on error.
    pub fn find_and_correct_bad_oriented_3d_cells(
        &mut self,
        params: &OrientationParams,
    ) -> MeshResult<Vec<usize>> {
        self.require_3d_in_3d()?;
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let mut repairs = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if let Some(nodes) = repaired_3d_cell(i, cell.ty, cell.nodes, &coords, params)? {
                repairs.push((i, nodes));
            }
        }
        let fixed = self.commit_repairs(repairs)?;
        if fixed.is_empty() {
            debug!("all 3D cells well oriented");
        } else {
            info!(count = fixed.len(), "3D cells reoriented");
        }
        Ok(fixed)
    }

    /// Ids of the badly oriented polyhedra.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DimensionMismatch`] unless the mesh is 3D in a 3D
    /// space.
    pub fn are_polyhedrons_not_correctly_oriented(
        &self,
        params: &OrientationParams,
    ) -> MeshResult<Vec<usize>> {
        self.require_3d_in_3d()?;
        let coords = self.coords()?.read();
        let mut bad = Vec::new();
        for (i, cell) in self.cells()?.enumerate() {
            let cell = cell?;
            if cell.ty == GeometricType::Polyhedron
                && !is_polyhedron_well_oriented(cell.nodes, &coords, params)?
            {
                bad.push(i);
            }
        }
        Ok(bad)
    }

    /// Repair the badly oriented polyhedra and return their ids.
    ///
    /// # Errors
    ///
    /// Same as [`UMesh::are_polyhedrons_not_correctly_oriented`], plus
    /// [`MeshError::IrreparableGeometry`] for a cell that cannot be fixed, in
    /// which case no polyhedron is modified.
    pub fn orient_correctly_polyhedrons(
        &mut self,
        params: &OrientationParams,
    ) -> MeshResult<Vec<usize>> {
        let bad = self.are_polyhedrons_not_correctly_oriented(params)?;
        let shared = self.coords()?.clone();
        let coords = shared.read();
        let mut repairs = Vec::with_capacity(bad.len());
        for &i in &bad {
            let mut nodes = CellNodes::from_slice(self.cell(i)?.nodes);
            orient_polyhedron_faces(i, &mut nodes, &coords, params)?;
            repairs.push((i, nodes));
        }
        let fixed = self.commit_repairs(repairs)?;
        if !fixed.is_empty() {
            info!(count = fixed.len(), "polyhedra reoriented");
        }
        Ok(fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_coords() -> Coords {
        Coords::new(
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
            ],
            3,
        )
        .unwrap()
    }

    /// Outward faces of the unit cube.
    const CUBE_FACES: [[i64; 4]; 6] = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
    ];

    fn polyhedron_nodes(faces: &[[i64; 4]]) -> Vec<i64> {
        let mut nodes = Vec::new();
        for (i, face) in faces.iter().enumerate() {
            if i > 0 {
                nodes.push(FACE_SEPARATOR);
            }
            nodes.extend_from_slice(face);
        }
        nodes
    }

    fn mesh_3d(cells: &[(GeometricType, Vec<i64>)]) -> UMesh {
        let mut m = UMesh::new(3);
        m.set_coords(cube_coords());
        m.allocate_cells(cells.len());
        for (ty, nodes) in cells {
            m.insert_next_cell(*ty, nodes).unwrap();
        }
        m
    }

    #[test]
    fn test_polygon_orientation() {
        let c = cube_coords();
        let up = Vector3::z();
        assert!(is_polygon_well_oriented(GeometricType::Quad4, &[0, 1, 2, 3], &c, &up).unwrap());
        assert!(!is_polygon_well_oriented(GeometricType::Quad4, &[0, 3, 2, 1], &c, &up).unwrap());
    }

    #[test]
    fn test_orient_2d_cells() {
        let mut m = UMesh::new(2);
        m.set_coords(cube_coords());
        m.allocate_cells(2);
        m.insert_next_cell(GeometricType::Quad4, &[0, 1, 2, 3]).unwrap();
        m.insert_next_cell(GeometricType::Polygon, &[4, 7, 6, 5]).unwrap();
        assert_eq!(m.are_2d_cells_not_correctly_oriented(&[0.0, 0.0, 1.0], false).unwrap(), vec![1]);
        assert_eq!(m.are_2d_cells_not_correctly_oriented(&[0.0, 0.0, 1.0], true).unwrap(), vec![1]);
        assert_eq!(m.orient_correctly_2d_cells(&[0.0, 0.0, 1.0], false).unwrap(), vec![1]);
        assert_eq!(m.cell(1).unwrap().nodes, &[4, 5, 6, 7]);
        assert!(m.orient_correctly_2d_cells(&[0.0, 0.0, 1.0], false).unwrap().is_empty());
    }

    #[test]
    fn test_2d_orientation_requires_3d_space() {
        let mut m = UMesh::new(2);
        m.set_coords(Coords::new(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 2).unwrap());
        m.allocate_cells(1);
        m.insert_next_cell(GeometricType::Tri3, &[0, 1, 2]).unwrap();
        assert!(matches!(
            m.are_2d_cells_not_correctly_oriented(&[0.0, 0.0, 1.0], false),
            Err(MeshError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_hexa_repair() {
        let c = cube_coords();
        // base normal points up, into the cell
        let mut bad = [0, 1, 2, 3, 4, 5, 6, 7];
        assert!(!is_3d_extruded_static_cell_well_oriented(GeometricType::Hexa8, &bad, &c).unwrap());
        correct_extruded_static_cell(GeometricType::Hexa8, &mut bad).unwrap();
        assert_eq!(bad, [0, 3, 2, 1, 4, 7, 6, 5]);
        assert!(is_3d_extruded_static_cell_well_oriented(GeometricType::Hexa8, &bad, &c).unwrap());

        let mut m = mesh_3d(&[(GeometricType::Hexa8, vec![0, 1, 2, 3, 4, 5, 6, 7])]);
        assert_eq!(m.find_and_correct_bad_oriented_3d_extruded_cells().unwrap(), vec![0]);
        assert!(m.find_and_correct_bad_oriented_3d_extruded_cells().unwrap().is_empty());
    }

    #[test]
    fn test_tetra_and_pyramid_repair() {
        let mut m = mesh_3d(&[
            (GeometricType::Tetra4, vec![0, 1, 3, 4]),
            (GeometricType::Tetra4, vec![0, 3, 1, 4]),
            (GeometricType::Pyra5, vec![0, 1, 2, 3, 4]),
        ]);
        let params = OrientationParams::default();
        assert_eq!(m.find_and_correct_bad_oriented_3d_cells(&params).unwrap(), vec![0, 2]);
        assert_eq!(m.cell(0).unwrap().nodes, &[0, 3, 1, 4]);
        assert_eq!(m.cell(2).unwrap().nodes, &[0, 3, 2, 1, 4]);
        assert!(m.find_and_correct_bad_oriented_3d_cells(&params).unwrap().is_empty());
    }

    #[test]
    fn test_polyhedron_with_one_flipped_face() {
        let c = cube_coords();
        let params = OrientationParams::default();
        let mut faces = CUBE_FACES;
        faces[3] = [1, 5, 6, 2];
        let mut nodes = polyhedron_nodes(&faces);
        assert!(!is_polyhedron_well_oriented(&nodes, &c, &params).unwrap());
        try_to_correct_polyhedron_orientation(0, &mut nodes, &c, &params).unwrap();
        assert!(is_polyhedron_well_oriented(&nodes, &c, &params).unwrap());
        approx::assert_relative_eq!(polyhedron_signed_volume(&nodes, &c).unwrap(), 1.0);
    }

    #[test]
    fn test_inverted_polyhedron_is_flipped() {
        let c = cube_coords();
        let params = OrientationParams::default();
        let mut faces = CUBE_FACES;
        for face in &mut faces {
            face[1..].reverse();
        }
        let mut m = mesh_3d(&[(GeometricType::Polyhedron, polyhedron_nodes(&faces))]);
        assert_eq!(m.are_polyhedrons_not_correctly_oriented(&params).unwrap(), vec![0]);
        assert_eq!(m.orient_correctly_polyhedrons(&params).unwrap(), vec![0]);
        assert_eq!(m.cell(0).unwrap().nodes, polyhedron_nodes(&CUBE_FACES).as_slice());
        assert!(m.are_polyhedrons_not_correctly_oriented(&params).unwrap().is_empty());
    }

    #[test]
    fn test_failed_repair_leaves_cells_untouched() {
        let params = OrientationParams::default();
        // cube with its top face reversed, plus a triangle touching nothing
        let mut faces = CUBE_FACES;
        faces[1] = [7, 6, 5, 4];
        let mut poly = polyhedron_nodes(&faces);
        poly.extend([FACE_SEPARATOR, 8, 9, 10]);

        let mut xyz = cube_coords().into_vec();
        xyz.extend([5.0, 5.0, 5.0, 6.0, 5.0, 5.0, 5.0, 6.0, 5.0]);
        let coords = Coords::new(xyz, 3).unwrap();
        let mut m = UMesh::new(3);
        m.set_coords(coords.clone());
        m.allocate_cells(2);
        m.insert_next_cell(GeometricType::Tetra4, &[0, 1, 3, 4]).unwrap();
        m.insert_next_cell(GeometricType::Polyhedron, &poly).unwrap();
        let before = m.connectivity().unwrap().clone();

        assert!(matches!(
            m.find_and_correct_bad_oriented_3d_cells(&params),
            Err(MeshError::IrreparableGeometry { cell: 1, .. })
        ));
        assert_eq!(m.connectivity().unwrap(), &before);
        assert!(matches!(
            m.orient_correctly_polyhedrons(&params),
            Err(MeshError::IrreparableGeometry { cell: 1, .. })
        ));
        assert_eq!(m.connectivity().unwrap(), &before);

        let mut nodes = poly.clone();
        assert!(try_to_correct_polyhedron_orientation(1, &mut nodes, &coords, &params).is_err());
        assert_eq!(nodes, poly);
    }

    #[test]
    fn test_flat_cells_are_left_alone() {
        let c = cube_coords();
        assert!(is_tetra_well_oriented(&[0, 1, 2, 3], &c).unwrap());
        assert!(is_pyramid_well_oriented(&[0, 1, 2, 3, 2], &c).unwrap());
        assert!(
            is_3d_extruded_static_cell_well_oriented(
                GeometricType::Hexa8,
                &[0, 1, 2, 3, 0, 1, 2, 3],
                &c
            )
            .unwrap()
        );

        let mut m = mesh_3d(&[
            (GeometricType::Tetra4, vec![0, 1, 2, 3]),
            (GeometricType::Penta6, vec![0, 1, 2, 0, 1, 2]),
        ]);
        let params = OrientationParams::default();
        assert!(m.find_and_correct_bad_oriented_3d_cells(&params).unwrap().is_empty());
        assert!(m.find_and_correct_bad_oriented_3d_extruded_cells().unwrap().is_empty());
        assert_eq!(m.cell(0).unwrap().nodes, &[0, 1, 2, 3]);
    }

    #[test]
    fn test_disconnected_faces_are_irreparable() {
        let c = cube_coords();
        let params = OrientationParams::default();
        let mut nodes = polyhedron_nodes(&[[0, 1, 2, 3], [4, 5, 6, 7]]);
        assert!(matches!(
            try_to_correct_polyhedron_orientation(7, &mut nodes, &c, &params),
            Err(MeshError::IrreparableGeometry { cell: 7, .. })
        ));
    }
}
