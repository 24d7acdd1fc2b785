use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use anchorage_3d::depth::DepthSnapshot;
use rand::Rng;
use std::hint::black_box;

fn random_cloud(num_points: usize) -> Vec<[f64; 3]> {
    let mut rng = rand::rng();
    (0..num_points)
        .map(|_| {
            [
                rng.random_range(-2.0..2.0),
                rng.random_range(-1.5..1.5),
                rng.random_range(0.5..4.0),
            ]
        })
        .collect()
}

fn bench_snapshot_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_snapshot_build");

    for num_points in [1_000, 10_000, 60_000] {
        let points = random_cloud(num_points);
        group.bench_with_input(
            BenchmarkId::from_parameter(num_points),
            &points,
            |b, points| {
                b.iter(|| black_box(DepthSnapshot::new(0.0, points.clone())));
            },
        );
    }
    group.finish();
}

fn bench_snapshot_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_snapshot_query");

    let snapshot = DepthSnapshot::new(0.0, random_cloud(60_000));
    let query = [0.1, -0.2, 2.0];

    group.bench_function(BenchmarkId::new("nearest", ""), |b| {
        b.iter(|| black_box(snapshot.nearest(&query)));
    });

    group.bench_function(BenchmarkId::new("within", "5cm"), |b| {
        b.iter(|| black_box(snapshot.within(&query, 0.05)));
    });
    group.finish();
}

criterion_group!(benches, bench_snapshot_build, bench_snapshot_queries);
criterion_main!(benches);
