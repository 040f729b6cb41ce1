//! Feed synthetic quiet and event batches through the detector.
//!
//! Run with: cargo run --example detect_demo -p quakewatch-core

use quakewatch_core::observe::{init_logging, LogConfig};
use quakewatch_core::synthetic::{event_batch, quiet_batch, SyntheticConfig};
use quakewatch_core::{DetectionEngine, DetectionResult, DetectorConfig, LogSink};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn print_verdict(label: &str, result: &DetectionResult) {
    println!("--- {label} ---");
    println!("  detected:      {}", result.detected);
    println!("  severity:      {}", result.severity);
    println!("  confidence:    {}/3", result.confidence_score);
    println!(
        "  pga magnitude: {:.4} g (x={:.4} y={:.4} z={:.4})",
        result.metrics.pga_magnitude,
        result.metrics.pga_x,
        result.metrics.pga_y,
        result.metrics.pga_z
    );
    println!("  max STA/LTA:   {:.2}", result.metrics.max_sta_lta);
    println!(
        "  criteria:      pga={} sta_lta={} duration={}\n",
        result.criteria.pga, result.criteria.sta_lta, result.criteria.duration
    );
}

fn main() {
    init_logging(&LogConfig::default());

    let mut engine = DetectionEngine::with_sink(DetectorConfig::default(), Box::new(LogSink))
        .expect("default configuration is valid");
    let mut rng = StdRng::seed_from_u64(42);

    println!("Seismic detector demo: 10 s batches at 104 Hz\n");

    let quiet = quiet_batch(&SyntheticConfig::default(), &mut rng);
    let (result, _) = engine.process(&quiet);
    print_verdict("quiet sensor", &result);

    let moderate = event_batch(&SyntheticConfig::default(), &mut rng);
    let (result, _) = engine.process(&moderate);
    print_verdict("moderate event (0.03 g)", &result);

    let strong = event_batch(
        &SyntheticConfig {
            event_magnitude: 0.06,
            ..Default::default()
        },
        &mut rng,
    );
    let (result, _) = engine.process(&strong);
    print_verdict("strong event (0.06 g)", &result);

    let stats = engine.stats();
    println!(
        "Totals: {} detections, last at {:?}",
        stats.total_detections, stats.last_detection_time
    );
}
