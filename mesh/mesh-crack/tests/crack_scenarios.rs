//! Cracks inside a block of hexahedra.
//!
//! Run with: cargo test -p mesh-crack

use approx::assert_relative_eq;
use mesh_crack::{CrackParams, crack_along, open_crack};
use mesh_types::{Coords, GeometricType};
use mesh_unstructured::{DescendingNumbering, UMesh};

// =============================================================================
// Test Mesh Generation
// =============================================================================

/// Node of the 3 x 3 x 3 grid at `(i, j, k)`.
fn node(i: i64, j: i64, k: i64) -> i64 {
    k * 9 + j * 3 + i
}

/// Cell of the 2 x 2 x 2 block at `(i, j, k)`.
fn cell(i: usize, j: usize, k: usize) -> usize {
    k * 4 + j * 2 + i
}

/// Eight unit hexahedra, well oriented, and all of their faces.
fn hexa_block() -> (UMesh, UMesh) {
    let mut xyz = Vec::new();
    for k in 0..3 {
        for j in 0..3 {
            for i in 0..3 {
                xyz.extend([f64::from(i), f64::from(j), f64::from(k)]);
            }
        }
    }
    let mut m0 = UMesh::new(3);
    m0.set_coords(Coords::new(xyz, 3).unwrap());
    m0.allocate_cells(8);
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..2 {
                let nodes = [
                    node(i, j, k),
                    node(i, j + 1, k),
                    node(i + 1, j + 1, k),
                    node(i + 1, j, k),
                    node(i, j, k + 1),
                    node(i, j + 1, k + 1),
                    node(i + 1, j + 1, k + 1),
                    node(i + 1, j, k + 1),
                ];
                m0.insert_next_cell(GeometricType::Hexa8, &nodes).unwrap();
            }
        }
    }
    m0.finish_inserting_cells();
    let m1 = m0
        .build_descending_connectivity(1, DescendingNumbering::Plain)
        .unwrap()
        .mesh;
    (m0, m1)
}

/// Faces in the plane x = 1 between y = 0 and y = 1: half of the block's
/// inner cross section.
fn half_cut(m1: &UMesh) -> Vec<usize> {
    let coords = m1.coords().unwrap().read();
    (0..m1.number_of_cells().unwrap())
        .filter(|&f| {
            m1.cell(f).unwrap().node_ids().all(|n| {
                let p = coords.node(usize::try_from(n).unwrap());
                p[0] == 1.0 && p[1] <= 1.0
            })
        })
        .collect()
}

// =============================================================================
// Half Cut
// =============================================================================

#[test]
fn half_cut_doubles_the_group() {
    let (mut m0, mut m1) = hexa_block();
    let faces = m1.number_of_cells().unwrap();
    let group = half_cut(&m1);
    assert_eq!(group.len(), 2);

    let outcome = crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();

    assert_eq!(outcome.duplicated_faces.len(), 2);
    assert_eq!(outcome.group_after().len(), 4);
    assert_eq!(m1.number_of_cells().unwrap(), faces + 2);
    for &(original, copy) in &outcome.duplicated_faces {
        assert!(copy >= faces);
        assert_ne!(m1.cell(original).unwrap().nodes, m1.cell(copy).unwrap().nodes);
    }
}

#[test]
fn half_cut_splits_only_the_free_edge() {
    let (mut m0, mut m1) = hexa_block();
    let group = half_cut(&m1);
    let outcome = crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();

    // nodes on the outer edge of the cut split, the ones on the inner
    // edge stay shared
    let split: Vec<i64> = outcome.added_nodes.keys().copied().collect();
    assert_eq!(split, vec![node(1, 0, 0), node(1, 0, 1), node(1, 0, 2)]);
    assert_eq!(m0.number_of_nodes().unwrap(), 30);
    assert_eq!(outcome.number_of_added_nodes(), 3);
    assert_eq!(
        outcome.cell_old_to_new_nodes.keys().copied().collect::<Vec<_>>(),
        vec![cell(1, 0, 0), cell(1, 0, 1)]
    );
    m0.check_consistency().unwrap();
    for v in m0.measure_field(false).unwrap() {
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn half_cut_disconnects_broken_pairs() {
    let (mut m0, mut m1) = hexa_block();
    let group = half_cut(&m1);
    crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();

    let neighbors = m0.compute_neighbors_of_cells().unwrap();
    let around = |c: usize| -> Vec<usize> {
        neighbors
            .group(c)
            .iter()
            .map(|&n| usize::try_from(n).unwrap())
            .collect()
    };
    for k in 0..2 {
        assert!(!around(cell(0, 0, k)).contains(&cell(1, 0, k)));
        assert!(around(cell(0, 1, k)).contains(&cell(1, 1, k)));
        assert!(around(cell(0, 0, k)).contains(&cell(0, 1, k)));
        assert!(around(cell(1, 0, k)).contains(&cell(1, 1, k)));
    }
    assert!(around(cell(1, 0, 0)).contains(&cell(1, 0, 1)));

    // both sides of the cut are now skin
    assert_eq!(m0.compute_skin().unwrap().number_of_cells().unwrap(), 28);
}

#[test]
fn faces_next_to_the_cut_follow_their_cell() {
    let (mut m0, mut m1) = hexa_block();
    let group = half_cut(&m1);
    let outcome = crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();

    // every face of m1 must still be a face of some cell
    let d = m0
        .build_descending_connectivity(1, DescendingNumbering::Plain)
        .unwrap();
    let (all, _) = d
        .mesh
        .are_cells_included_in(&m1, mesh_unstructured::CellComparePolicy::Nodal)
        .unwrap();
    assert!(all);

    let moved = outcome.added_nodes[&node(1, 0, 1)]
        .first()
        .copied()
        .unwrap();
    let uses_moved = (0..m1.number_of_cells().unwrap())
        .filter(|&f| m1.cell(f).unwrap().nodes.contains(&moved))
        .count();
    // two cut copies, two faces on y = 0, one face between the cracked cells
    assert_eq!(uses_moved, 5);
}

// =============================================================================
// Cross Cuts
// =============================================================================

/// Faces of `m1` meeting the vertical line x = y = 1 between `z0` and `z1`.
fn around_center_line(m1: &UMesh, z0: f64, z1: f64) -> Vec<usize> {
    m1.get_cells_in_bounding_box(&[1.0, 1.0, 1.0, 1.0, z0, z1], 0.01)
        .unwrap()
}

fn cell_neighbors(m0: &UMesh) -> Vec<Vec<usize>> {
    let neighbors = m0.compute_neighbors_of_cells().unwrap();
    (0..m0.number_of_cells().unwrap())
        .map(|c| {
            neighbors
                .group(c)
                .iter()
                .map(|&n| usize::try_from(n).unwrap())
                .collect()
        })
        .collect()
}

fn assert_faces_still_bound(m0: &UMesh, m1: &UMesh) {
    m0.check_consistency().unwrap();
    let d = m0
        .build_descending_connectivity(1, DescendingNumbering::Plain)
        .unwrap();
    let (all, _) = d
        .mesh
        .are_cells_included_in(m1, mesh_unstructured::CellComparePolicy::Nodal)
        .unwrap();
    assert!(all);
    for v in m0.measure_field(false).unwrap() {
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn half_cross_cut_separates_the_bottom_layer() {
    let (mut m0, mut m1) = hexa_block();
    let group = around_center_line(&m1, 0.1, 0.9);
    assert_eq!(group.len(), 4);

    let outcome = crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();

    assert_eq!(outcome.group_after().len(), 8);
    assert_eq!(m0.number_of_nodes().unwrap(), 34);
    // the center node of the bottom face is shared by four separated cells
    assert_eq!(outcome.added_nodes[&node(1, 1, 0)].len(), 3);
    for n in [node(1, 0, 0), node(0, 1, 0), node(2, 1, 0), node(1, 2, 0)] {
        assert_eq!(outcome.added_nodes[&n].len(), 1);
    }
    // the middle nodes stay whole since the top layer holds the cells together
    assert!(!outcome.added_nodes.contains_key(&node(1, 1, 1)));
    assert_faces_still_bound(&m0, &m1);

    let around = cell_neighbors(&m0);
    for (a, b) in [
        (cell(0, 0, 0), cell(1, 0, 0)),
        (cell(0, 0, 0), cell(0, 1, 0)),
        (cell(1, 0, 0), cell(1, 1, 0)),
        (cell(0, 1, 0), cell(1, 1, 0)),
    ] {
        assert!(!around[a].contains(&b));
        assert!(around[a + 4].contains(&(b + 4)));
    }
    for c in 0..4 {
        assert!(around[c].contains(&(c + 4)));
    }
}

#[test]
fn full_cut_frees_every_cell() {
    let (mut m0, mut m1) = hexa_block();
    let group = around_center_line(&m1, 0.1, 1.9);
    assert_eq!(group.len(), 12);

    let outcome = crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();

    assert_eq!(outcome.group_after().len(), 24);
    assert_eq!(m0.number_of_nodes().unwrap(), 64);
    assert_eq!(outcome.number_of_added_nodes(), 64 - 27);
    assert_faces_still_bound(&m0, &m1);

    assert!(cell_neighbors(&m0).iter().all(Vec::is_empty));
    assert_eq!(m0.partition_by_spread_zone().unwrap().len(), 8);
    assert_eq!(m0.compute_skin().unwrap().number_of_cells().unwrap(), 48);
}

// =============================================================================
// Opening
// =============================================================================

#[test]
fn opening_moves_new_nodes_into_their_cells() {
    let (mut m0, mut m1) = hexa_block();
    let group = half_cut(&m1);
    let outcome = crack_along(&mut m0, &mut m1, &group, &CrackParams::default()).unwrap();
    let moved = outcome.added_nodes[&node(1, 0, 1)]
        .first()
        .copied()
        .unwrap();

    open_crack(&m0, &outcome, 0.5).unwrap();

    let coords = m0.coords().unwrap().read();
    let p = coords.node(usize::try_from(moved).unwrap());
    // pulled toward the centers of both cells it belongs to
    assert_relative_eq!(p[0], 1.5, epsilon = 1e-12);
    assert_relative_eq!(p[1], 0.5, epsilon = 1e-12);
    assert_relative_eq!(p[2], 1.0, epsilon = 1e-12);
    let original = coords.node(usize::try_from(node(1, 0, 1)).unwrap());
    assert_eq!(original, &[1.0, 0.0, 1.0]);
}
