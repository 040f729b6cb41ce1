//! Benchmarks for the seismic detection pipeline.
//!
//! Run with: cargo bench -p quakewatch-core --bench detector_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use quakewatch_core::bandpass::SignalConditioner;
use quakewatch_core::sta_lta::sta_lta;
use quakewatch_core::synthetic::{event_batch, quiet_batch, SyntheticConfig};
use quakewatch_core::{DetectionEngine, DetectorConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn batch_config(seconds: f64) -> SyntheticConfig {
    SyntheticConfig {
        duration_seconds: seconds,
        ..Default::default()
    }
}

// ============================================================================
// Bandpass Conditioning Benchmarks
// ============================================================================

fn bench_bandpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("bandpass");

    let config = DetectorConfig::default();
    let conditioner = SignalConditioner::new(&config).unwrap();

    for seconds in [10.0, 30.0, 60.0].iter() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = quiet_batch(&batch_config(*seconds), &mut rng);
        let n = batch.accel_z.len();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(
            BenchmarkId::new("condition", format!("{seconds}s")),
            &batch.accel_z,
            |b, signal| b.iter(|| conditioner.condition(black_box(signal))),
        );
    }

    group.finish();
}

// ============================================================================
// STA/LTA Benchmarks
// ============================================================================

fn bench_sta_lta(c: &mut Criterion) {
    let mut group = c.benchmark_group("sta_lta");

    let config = DetectorConfig::default();
    let sta = config.sta_samples();
    let lta = config.lta_samples();

    for seconds in [10.0, 30.0, 60.0].iter() {
        let mut rng = StdRng::seed_from_u64(2);
        let batch = event_batch(&batch_config(*seconds), &mut rng);
        let n = batch.accel_x.len();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(
            BenchmarkId::new("ratio", format!("{seconds}s")),
            &batch.accel_x,
            |b, signal| b.iter(|| sta_lta(black_box(signal), sta, lta)),
        );
    }

    group.finish();
}

// ============================================================================
// Full Pipeline Benchmarks
// ============================================================================

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");

    let mut rng = StdRng::seed_from_u64(3);
    let quiet = quiet_batch(&batch_config(10.0), &mut rng);
    let event = event_batch(
        &SyntheticConfig {
            event_magnitude: 0.06,
            ..Default::default()
        },
        &mut rng,
    );

    let mut engine = DetectionEngine::new(DetectorConfig::default()).unwrap();
    group.throughput(Throughput::Elements(quiet.accel_x.len() as u64));
    group.bench_function("quiet_batch", |b| {
        b.iter(|| engine.process(black_box(&quiet)))
    });
    group.bench_function("event_batch", |b| {
        b.iter(|| engine.process(black_box(&event)))
    });

    group.finish();
}

criterion_group!(
    name = pipeline_benches;
    config = Criterion::default();
    targets = bench_bandpass, bench_sta_lta, bench_process
);

criterion_main!(pipeline_benches);
