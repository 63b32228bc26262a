//! Benchmarks for mesh-unstructured operations.
//!
//! Run with: cargo bench -p mesh-unstructured
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-unstructured -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-unstructured -- --baseline main

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_types::{Coords, GeometricType};
use mesh_unstructured::{CellLocator, DescendingNumbering, LocatorParams, SplittingPolicy, UMesh};

// =============================================================================
// Test Mesh Generation
// =============================================================================

/// Block of `n`^3 unit hexahedra, well oriented.
fn create_hexa_block(n: usize) -> UMesh {
    let side = n + 1;
    let id = |i: usize, j: usize, k: usize| (k * side * side + j * side + i) as i64;

    let mut xyz = Vec::with_capacity(side * side * side * 3);
    for k in 0..side {
        for j in 0..side {
            for i in 0..side {
                xyz.extend([i as f64, j as f64, k as f64]);
            }
        }
    }

    let mut mesh = UMesh::new(3);
    mesh.set_coords(Coords::new(xyz, 3).unwrap());
    mesh.allocate_cells(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let nodes = [
                    id(i, j, k),
                    id(i, j + 1, k),
                    id(i + 1, j + 1, k),
                    id(i + 1, j, k),
                    id(i, j, k + 1),
                    id(i, j + 1, k + 1),
                    id(i + 1, j + 1, k + 1),
                    id(i + 1, j, k + 1),
                ];
                mesh.insert_next_cell(GeometricType::Hexa8, &nodes).unwrap();
            }
        }
    }
    mesh.finish_inserting_cells();
    mesh
}

// =============================================================================
// Connectivity Benchmarks
// =============================================================================

fn bench_descending(c: &mut Criterion) {
    let mut group = c.benchmark_group("Descending");
    group.sample_size(20);

    for n in [4_usize, 8, 16] {
        let mesh = create_hexa_block(n);
        group.throughput(Throughput::Elements((n * n * n) as u64));

        group.bench_with_input(BenchmarkId::new("faces", n), &mesh, |b, mesh| {
            b.iter(|| {
                mesh.build_descending_connectivity(1, DescendingNumbering::OrientationSensitive)
            });
        });
        group.bench_with_input(BenchmarkId::new("edges", n), &mesh, |b, mesh| {
            b.iter(|| black_box(mesh).explode_3d_mesh_to_1d());
        });
        group.bench_with_input(BenchmarkId::new("cell_neighbors", n), &mesh, |b, mesh| {
            b.iter(|| black_box(mesh).compute_neighbors_of_cells());
        });
    }

    group.finish();
}

fn bench_tetrahedrize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tetrahedrize");

    let mesh = create_hexa_block(8);
    for (name, policy) in [
        ("planar_face_5", SplittingPolicy::PlanarFace5),
        ("general_24", SplittingPolicy::General24),
    ] {
        group.bench_with_input(BenchmarkId::new(name, 512), &mesh, |b, mesh| {
            b.iter(|| {
                let mut m = mesh.deep_copy();
                m.tetrahedrize(black_box(policy))
            });
        });
    }

    group.finish();
}

fn bench_locator(c: &mut Criterion) {
    let mut group = c.benchmark_group("Locator");

    let mesh = create_hexa_block(16);
    group.bench_function("build_4096", |b| {
        b.iter(|| CellLocator::new(black_box(&mesh), &LocatorParams::default()));
    });

    let locator = CellLocator::new(&mesh, &LocatorParams::default()).unwrap();
    group.bench_function("locate_4096", |b| {
        b.iter(|| locator.cells_containing_point(black_box(&[7.3, 2.6, 11.1]), 1e-12));
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_descending, bench_tetrahedrize, bench_locator);
criterion_main!(benches);
