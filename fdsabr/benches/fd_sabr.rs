use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fdsabr::prelude::*;
use std::hint::black_box;

fn reference() -> ModelParameters {
    ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0)
        .expect("reference parameters should be valid")
}

fn bench_build_density(c: &mut Criterion) {
    let params = reference();
    let mut group = c.benchmark_group("build_density");
    for &n in &[100_usize, 400, 1600] {
        let settings = FdSabrSettings::default().with_grid_size(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &settings, |b, settings| {
            b.iter(|| {
                let s = build_density(black_box(params), black_box(*settings))
                    .expect("density solve should succeed");
                black_box(s.total_mass())
            })
        });
    }
    group.finish();
}

fn bench_smile_extraction(c: &mut Criterion) {
    let solution = build_density(reference(), FdSabrSettings::default())
        .expect("density solve should succeed");
    let strikes: Vec<f64> = (0..50).map(|i| 0.01 + 0.002 * i as f64).collect();

    c.bench_function("price_call_50_strikes", |b| {
        b.iter(|| {
            let total: f64 = strikes.iter().map(|&k| solution.price_call(black_box(k))).sum();
            black_box(total)
        })
    });
    c.bench_function("lognormal_smile_50_strikes", |b| {
        b.iter(|| {
            black_box(solution.volatility(black_box(&strikes), VolatilityType::ShiftedLognormal))
        })
    });
}

criterion_group!(benches, bench_build_density, bench_smile_extraction);
criterion_main!(benches);
