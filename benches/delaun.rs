// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Triangulation benchmarks.
//!
//! Run with: cargo bench --bench delaun

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use delaun2d::{Delaun, Point2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_cloud(n: usize, seed: u64) -> Vec<Point2<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Point2::new(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0)))
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for n in [100usize, 1_000, 10_000] {
        let points = random_cloud(n, 7);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| Delaun::from_points(black_box(points)))
        });
    }
    group.finish();
}

fn bench_use_edge(c: &mut Criterion) {
    let points = random_cloud(2_000, 11);
    let Ok(base) = Delaun::from_points(&points) else {
        return;
    };

    // pairs of far apart vertices, so every constraint cuts many triangles
    let pairs: Vec<(usize, usize)> = (0..16).map(|i| (i * 3, 1_999 - i * 5)).collect();

    c.bench_function("use_edge/16_long", |b| {
        b.iter_batched(
            || base.clone(),
            |mut d| {
                for &(a, z) in &pairs {
                    black_box(d.use_edge(a, z));
                }
                d
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_build, bench_use_edge);
criterion_main!(benches);
