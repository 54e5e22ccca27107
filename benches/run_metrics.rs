use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sched_analyzer::{compute_run_metrics, Dimension, ExperimentId, ExperimentRun, MetricsEngine, Scheduler};

fn synthetic_run(value: u64, requests: usize, seed: u64) -> ExperimentRun {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut clock = 0i64;
    let rows: Vec<(i64, i64, i64)> = (0..requests)
        .map(|_| {
            clock += rng.gen_range(10_000..1_000_000);
            let start = clock + rng.gen_range(0..5_000_000);
            let finish = start + rng.gen_range(100_000..20_000_000);
            (clock, start, finish)
        })
        .collect();
    let id = ExperimentId::swept(Scheduler::Fcfs, Dimension::Clients, value).unwrap();
    ExperimentRun::from_raw(id, rows).unwrap()
}

fn bench_single_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_run_metrics");
    for requests in [100usize, 10_000, 100_000] {
        let run = synthetic_run(1, requests, 7);
        group.bench_with_input(BenchmarkId::from_parameter(requests), &run, |b, run| {
            b.iter(|| compute_run_metrics(black_box(run)))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let runs: Vec<ExperimentRun> = (1..=32).map(|v| synthetic_run(v, 5_000, v)).collect();
    let refs: Vec<&ExperimentRun> = runs.iter().collect();

    let mut group = c.benchmark_group("compute_batch");
    group.bench_function("sequential", |b| {
        b.iter(|| refs.iter().map(|r| compute_run_metrics(r)).collect::<Vec<_>>())
    });
    group.bench_function("rayon", |b| {
        let engine = MetricsEngine::new();
        b.iter(|| engine.compute_batch(black_box(&refs)))
    });
    group.finish();
}

criterion_group!(benches, bench_single_run, bench_batch);
criterion_main!(benches);
