//! Criterion microbenches for surface distance.
//!
//! - Full vertex-by-vertex Dijkstra on icospheres, sequential and on a
//!   four-thread pool.
//! - Graph construction (direct + indirect edges) alone.

use brainspin::distance::{get_surface_distance, DistanceOpts};
use brainspin::mesh::{icosphere, make_surf_graph};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_distance");
    group.sample_size(10);
    let mesh = icosphere(2);
    for n_proc in [1usize, 4] {
        let opts = DistanceOpts {
            n_proc,
            ..Default::default()
        };
        group.bench_function(BenchmarkId::new("icosphere2", n_proc), |b| {
            b.iter(|| {
                let _ = get_surface_distance(&mesh, &opts);
            })
        });
    }
    group.finish();
}

fn bench_graph(c: &mut Criterion) {
    let mesh = icosphere(3);
    c.bench_function("make_surf_graph/icosphere3", |b| {
        b.iter(|| {
            let _ = make_surf_graph(&mesh, None);
        })
    });
}

criterion_group!(benches, bench_distance, bench_graph);
criterion_main!(benches);
