//! Cover and refinement benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use morsedb::*;

fn uniform<T: Tree>(bounds: RectGeo, depth: usize) -> TreeGrid<T> {
    let mut grid = TreeGrid::new(bounds);
    for _ in 0..depth {
        grid.subdivide().expect("uniform subdivision succeeds");
    }
    grid
}

fn benchmark_cover(c: &mut Criterion) {
    let bounds = RectGeo::new(vec![0.0, 0.0], vec![320.0, 224.0]);
    let query = RectGeo::new(vec![40.0, 30.0], vec![55.5, 41.25]);
    let mut group = c.benchmark_group("cover_rect");
    for depth in [10usize, 14, 18] {
        let pointer: PointerGrid = uniform(bounds.clone(), depth);
        let succinct: SuccinctGrid = uniform(bounds.clone(), depth);
        group.bench_with_input(BenchmarkId::new("pointer", depth), &query, |b, query| {
            b.iter(|| black_box(pointer.cover_rect(query)));
        });
        group.bench_with_input(BenchmarkId::new("succinct", depth), &query, |b, query| {
            b.iter(|| black_box(succinct.cover_rect(query)));
        });
    }
    group.finish();

    let succinct: SuccinctGrid = uniform(bounds, 16);
    c.bench_function("coarse_cover_depth16", |b| {
        b.iter(|| black_box(succinct.coarse_cover(&query)));
    });
}

fn benchmark_refinement(c: &mut Criterion) {
    let map = LeslieMap::from_parameter_box(&RectGeo::new(vec![23.0, 23.0], vec![23.1, 23.1]));
    let bounds = RectGeo::new(vec![0.0, 0.0], vec![320.0, 224.0]);
    let config = MorseConfig::new(8, 11, 2_000).expect("valid depths");

    let mut group = c.benchmark_group("leslie_8_11");
    group.sample_size(10);
    group.bench_function("succinct", |b| {
        b.iter(|| {
            let graph = compute_morse_graph(SuccinctGrid::new(bounds.clone()), &map, &config)
                .expect("refinement succeeds");
            black_box(graph.num_vertices())
        });
    });
    group.bench_function("pointer", |b| {
        b.iter(|| {
            let graph = compute_morse_graph(PointerGrid::new(bounds.clone()), &map, &config)
                .expect("refinement succeeds");
            black_box(graph.num_vertices())
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_cover, benchmark_refinement);
criterion_main!(benches);
