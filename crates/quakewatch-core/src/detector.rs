//! Detection engine tying the processing stages together.
//!
//! One [`DetectionEngine`] owns a validated configuration, the designed
//! bandpass stage, and a running tally of detections. Each call to
//! [`DetectionEngine::process`] takes one triaxial batch through the
//! full pipeline:
//!
//! ```text
//! SampleBatch -> bandpass (per axis) -> STA/LTA (per axis)
//!             -> criteria evaluation -> verdict + severity
//! ```
//!
//! `process` never returns an error. A malformed batch is folded into a
//! non-detected result carrying the failure message, so a stream of
//! batches from a flaky sensor keeps flowing through the same call
//! site. Detections are counted, timestamped, and handed to the
//! configured [`EventSink`].
//!
//! Batches should span at least one LTA window (several are better);
//! shorter batches still produce a verdict but the ratio stage has no
//! quiet background to compare against, so its output is dominated by
//! window clipping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::bandpass::SignalConditioner;
use crate::config::DetectorConfig;
use crate::criteria::{self, Criteria, Metrics};
use crate::event_sink::{DetectionEvent, EventSink, NullSink};
use crate::sta_lta::{max_ratio, sta_lta};
use crate::types::{DetectorError, DetectorResult, SampleBatch, Severity};

/// Threshold set a verdict was produced against.
///
/// Echoed into every [`DetectionResult`] so a serialized verdict is
/// interpretable without the configuration that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Detection threshold on combined peak acceleration, in g.
    pub pga_threshold: f64,
    /// Confirmation level that forces HIGH severity, in g.
    pub pga_confirmation: f64,
    /// Trigger level for the STA/LTA ratio.
    pub sta_lta_threshold: f64,
    /// Minimum sustained shaking time, in seconds.
    pub min_duration_seconds: f64,
}

impl From<&DetectorConfig> for Thresholds {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            pga_threshold: config.pga_threshold,
            pga_confirmation: config.pga_confirmation,
            sta_lta_threshold: config.sta_lta_threshold,
            min_duration_seconds: config.min_duration_seconds,
        }
    }
}

/// Verdict for one processed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// True when all three criteria passed.
    pub detected: bool,
    /// Severity classification, driven by peak acceleration.
    pub severity: Severity,
    /// Number of criteria that passed, between 0 and 3.
    pub confidence_score: u8,
    /// Per-criterion outcomes.
    pub criteria: Criteria,
    /// Scalar measurements the criteria were judged on.
    pub metrics: Metrics,
    /// Thresholds in force when the batch was processed.
    pub thresholds: Thresholds,
    /// When the batch was processed.
    pub timestamp: DateTime<Utc>,
    /// Set when the batch was rejected before analysis.
    pub error: Option<String>,
}

/// Intermediate series produced while processing one batch.
///
/// Returned alongside the verdict so callers can plot or persist the
/// conditioned signals and ratio traces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedSignals {
    pub filtered_x: Vec<f64>,
    pub filtered_y: Vec<f64>,
    pub filtered_z: Vec<f64>,
    pub ratio_x: Vec<f64>,
    pub ratio_y: Vec<f64>,
    pub ratio_z: Vec<f64>,
}

/// Running totals for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorStats {
    /// Batches that produced a positive verdict since construction.
    pub total_detections: u64,
    /// Timestamp of the most recent positive verdict.
    pub last_detection_time: Option<DateTime<Utc>>,
    /// Thresholds currently in force.
    pub thresholds: Thresholds,
}

/// Seismic event detector over triaxial accelerometer batches.
///
/// One engine serves one logical sensor stream. Processing takes
/// `&mut self`, so sharing an engine across threads means wrapping it
/// in a mutex; the detection tally is not synchronized internally.
pub struct DetectionEngine {
    config: DetectorConfig,
    conditioner: SignalConditioner,
    sink: Box<dyn EventSink>,
    detection_count: u64,
    last_detection_time: Option<DateTime<Utc>>,
}

impl DetectionEngine {
    /// Build an engine that keeps its detections to itself.
    ///
    /// Validates the configuration and designs the bandpass stage up
    /// front, so a bad band placement fails here rather than on the
    /// first batch.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        Self::with_sink(config, Box::new(NullSink))
    }

    /// Build an engine that forwards each detection to `sink`.
    pub fn with_sink(config: DetectorConfig, sink: Box<dyn EventSink>) -> DetectorResult<Self> {
        config
            .validate()
            .map_err(|e| DetectorError::InvalidConfig(e.to_string()))?;
        let conditioner = SignalConditioner::new(&config)?;
        info!(
            pga_threshold = config.pga_threshold,
            pga_confirmation = config.pga_confirmation,
            sta_lta_threshold = config.sta_lta_threshold,
            min_duration_seconds = config.min_duration_seconds,
            sample_rate = config.sample_rate,
            "detection engine initialized"
        );
        Ok(Self {
            config,
            conditioner,
            sink,
            detection_count: 0,
            last_detection_time: None,
        })
    }

    /// Run one batch through the full pipeline and return the verdict
    /// with the intermediate series.
    ///
    /// Infallible: a batch that fails validation yields a non-detected
    /// result with [`DetectionResult::error`] set and leaves the
    /// detection tally untouched.
    pub fn process(&mut self, batch: &SampleBatch) -> (DetectionResult, DerivedSignals) {
        if let Err(err) = batch.validate() {
            warn!(error = %err, "rejecting malformed batch");
            return (self.error_result(err.to_string()), DerivedSignals::default());
        }

        let filtered_x = self.conditioner.condition(&batch.accel_x);
        let filtered_y = self.conditioner.condition(&batch.accel_y);
        let filtered_z = self.conditioner.condition(&batch.accel_z);

        let sta = self.config.sta_samples();
        let lta = self.config.lta_samples();
        let ratio_x = sta_lta(&filtered_x, sta, lta);
        let ratio_y = sta_lta(&filtered_y, sta, lta);
        let ratio_z = sta_lta(&filtered_z, sta, lta);
        let peak_ratio = max_ratio(&ratio_x)
            .max(max_ratio(&ratio_y))
            .max(max_ratio(&ratio_z));

        let (metrics, criteria) = criteria::evaluate(
            &self.config,
            &filtered_x,
            &filtered_y,
            &filtered_z,
            peak_ratio,
            batch,
        );

        let detected = criteria.all_passed();
        let severity = if metrics.pga_magnitude > self.config.pga_confirmation {
            Severity::High
        } else if detected {
            Severity::Medium
        } else {
            Severity::Low
        };

        let result = DetectionResult {
            detected,
            severity,
            confidence_score: criteria.passed_count(),
            criteria,
            metrics,
            thresholds: Thresholds::from(&self.config),
            timestamp: Utc::now(),
            error: None,
        };
        let signals = DerivedSignals {
            filtered_x,
            filtered_y,
            filtered_z,
            ratio_x,
            ratio_y,
            ratio_z,
        };

        if detected {
            self.handle_detection(&result, &signals);
        } else {
            debug!(
                confidence = result.confidence_score,
                pga_magnitude = metrics.pga_magnitude,
                max_sta_lta = metrics.max_sta_lta,
                "batch below detection criteria"
            );
        }
        (result, signals)
    }

    /// Running totals since this engine was built.
    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            total_detections: self.detection_count,
            last_detection_time: self.last_detection_time,
            thresholds: Thresholds::from(&self.config),
        }
    }

    /// Configuration this engine was built with.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    fn handle_detection(&mut self, result: &DetectionResult, signals: &DerivedSignals) {
        self.detection_count += 1;
        self.last_detection_time = Some(result.timestamp);
        warn!(
            severity = %result.severity,
            confidence = result.confidence_score,
            pga_magnitude = result.metrics.pga_magnitude,
            max_sta_lta = result.metrics.max_sta_lta,
            "seismic event detected"
        );
        let event = DetectionEvent { result, signals };
        if let Err(err) = self.sink.on_detection(&event) {
            error!(error = %err, "event sink failed");
        }
    }

    fn error_result(&self, message: String) -> DetectionResult {
        DetectionResult {
            detected: false,
            severity: Severity::Low,
            confidence_score: 0,
            criteria: Criteria::none(),
            metrics: Metrics::zeroed(),
            thresholds: Thresholds::from(&self.config),
            timestamp: Utc::now(),
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{event_batch, quiet_batch, SyntheticConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;
    use std::sync::{Arc, Mutex};

    fn engine() -> DetectionEngine {
        DetectionEngine::new(DetectorConfig::default()).unwrap()
    }

    struct RecordingSink {
        seen: Arc<Mutex<Vec<(Severity, u8)>>>,
    }

    impl EventSink for RecordingSink {
        fn on_detection(&mut self, event: &DetectionEvent<'_>) -> DetectorResult<()> {
            self.seen
                .lock()
                .unwrap()
                .push((event.result.severity, event.result.confidence_score));
            Ok(())
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn on_detection(&mut self, _event: &DetectionEvent<'_>) -> DetectorResult<()> {
            Err(DetectorError::Sink("disk full".to_string()))
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = DetectorConfig {
            low_cut_freq: 8.0,
            high_cut_freq: 2.0,
            ..Default::default()
        };
        assert!(DetectionEngine::new(config).is_err());
    }

    #[test]
    fn test_quiet_batch_not_detected() {
        let mut engine = engine();
        let mut rng = StdRng::seed_from_u64(11);
        let batch = quiet_batch(&SyntheticConfig::default(), &mut rng);

        let (result, signals) = engine.process(&batch);
        assert!(!result.detected);
        assert!(result.error.is_none());
        assert_eq!(result.severity, Severity::Low);
        // Gravity keeps the raw magnitude near 1 g, so the duration
        // criterion passes even on a quiet batch. Peak acceleration of
        // filtered noise sits far below 0.02 g.
        assert!(result.criteria.duration);
        assert!(!result.criteria.pga);
        assert!(result.confidence_score <= 2);
        assert!(result.metrics.pga_magnitude < 0.01);
        assert_eq!(signals.filtered_x.len(), batch.accel_x.len());
        assert_eq!(signals.ratio_x.len(), batch.accel_x.len());
        assert_eq!(engine.stats().total_detections, 0);
        assert!(engine.stats().last_detection_time.is_none());
    }

    #[test]
    fn test_event_batch_detected_high_severity() {
        let mut engine = engine();
        let mut rng = StdRng::seed_from_u64(11);
        let config = SyntheticConfig {
            event_magnitude: 0.06,
            ..Default::default()
        };
        let batch = event_batch(&config, &mut rng);

        let (result, _) = engine.process(&batch);
        assert!(result.detected);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.confidence_score, 3);
        assert!(result.criteria.all_passed());
        assert!(
            result.metrics.pga_magnitude > 0.05,
            "combined peak {} should exceed the confirmation level",
            result.metrics.pga_magnitude
        );
        assert!(result.metrics.max_sta_lta > 2.5);

        let stats = engine.stats();
        assert_eq!(stats.total_detections, 1);
        assert_eq!(stats.last_detection_time, Some(result.timestamp));
    }

    #[test]
    fn test_moderate_event_medium_severity() {
        let mut engine = engine();
        let mut rng = StdRng::seed_from_u64(3);
        let config = SyntheticConfig {
            event_magnitude: 0.03,
            ..Default::default()
        };
        let batch = event_batch(&config, &mut rng);

        let (result, _) = engine.process(&batch);
        assert!(result.detected);
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.metrics.pga_magnitude > 0.02);
        assert!(result.metrics.pga_magnitude < 0.05);
    }

    #[test]
    fn test_high_severity_without_detection() {
        // A strong sine with no onset: peak acceleration crosses the
        // confirmation level but the ratio never fires, so the verdict
        // is HIGH severity on a non-detected batch.
        let mut engine = engine();
        let n = 1040;
        let x: Vec<f64> = (0..n)
            .map(|i| 0.06 * (2.0 * PI * 2.0 * i as f64 / 104.0).sin())
            .collect();
        let batch = SampleBatch::new(x, vec![0.0; n], vec![1.0; n]);

        let (result, _) = engine.process(&batch);
        assert!(!result.detected);
        assert_eq!(result.severity, Severity::High);
        assert!(result.criteria.pga);
        assert!(result.criteria.duration, "gravity keeps raw magnitude above threshold");
        assert!(!result.criteria.sta_lta, "stationary amplitude has no onset");
        assert_eq!(result.confidence_score, 2);
        assert_eq!(engine.stats().total_detections, 0);
    }

    #[test]
    fn test_short_burst_fails_duration() {
        // Without gravity, a 0.1 s burst is the only time the raw
        // magnitude crosses the threshold. Filter ringing stretches the
        // filtered envelope but must not count toward duration.
        let mut engine = engine();
        let n = 1040;
        let mut x = vec![0.0; n];
        for (k, slot) in x.iter_mut().skip(520).take(10).enumerate() {
            *slot = 0.5 * (2.0 * PI * 3.0 * k as f64 / 104.0).sin();
        }
        let batch = SampleBatch::new(x, vec![0.0; n], vec![0.0; n]);

        let (result, _) = engine.process(&batch);
        assert!(!result.detected);
        assert!(!result.criteria.duration, "0.1 s of shaking is below the 0.5 s minimum");
        assert!(result.criteria.pga);
        // The burst peak clears the confirmation level, so severity is
        // HIGH even though the composite verdict failed.
        assert_eq!(result.severity, Severity::High);
        assert_eq!(engine.stats().total_detections, 0);
    }

    #[test]
    fn test_constant_batch_not_detected() {
        // A motionless sensor: pure gravity on z. The bandpass removes
        // the constant offset, so peak filtered acceleration is
        // numerical residue and the amplitude criterion cannot pass.
        let mut engine = engine();
        let n = 1040;
        let batch = SampleBatch::new(vec![0.0; n], vec![0.0; n], vec![1.0; n]);

        let (result, _) = engine.process(&batch);
        assert!(!result.detected);
        assert!(!result.criteria.pga);
        assert!(result.metrics.pga_magnitude < 1e-9);
        assert_eq!(result.severity, Severity::Low);
        assert_eq!(engine.stats().total_detections, 0);
    }

    #[test]
    fn test_malformed_batch_folds_into_result() {
        let mut engine = engine();
        let batch = SampleBatch::new(vec![0.0; 10], vec![0.0; 9], vec![0.0; 10]);

        let (result, signals) = engine.process(&batch);
        assert!(!result.detected);
        assert!(result.error.is_some());
        assert_eq!(result.confidence_score, 0);
        assert_eq!(result.severity, Severity::Low);
        assert_eq!(result.metrics, Metrics::zeroed());
        assert!(signals.filtered_x.is_empty());
        assert_eq!(engine.stats().total_detections, 0);
    }

    #[test]
    fn test_empty_batch_folds_into_result() {
        let mut engine = engine();
        let (result, _) = engine.process(&SampleBatch::new(vec![], vec![], vec![]));
        assert!(!result.detected);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_short_batch_survives_filter_fallback() {
        // Ten samples is below the padding the zero-phase filter needs,
        // so conditioning falls back to the raw signal. The pipeline
        // still completes with a sane verdict.
        let mut engine = engine();
        let batch = SampleBatch::new(vec![0.0; 10], vec![0.0; 10], vec![1.0; 10]);

        let (result, _) = engine.process(&batch);
        assert!(result.error.is_none());
        assert!(!result.detected, "0.096 s of shaking is below the duration minimum");
        assert_eq!(result.severity, Severity::High);
        assert!(result.metrics.pga_magnitude > 0.5);
    }

    #[test]
    fn test_process_is_repeatable() {
        let mut engine = engine();
        let mut rng = StdRng::seed_from_u64(42);
        let batch = event_batch(
            &SyntheticConfig {
                event_magnitude: 0.06,
                ..Default::default()
            },
            &mut rng,
        );

        let (first, first_signals) = engine.process(&batch);
        let (second, second_signals) = engine.process(&batch);
        assert_eq!(first.detected, second.detected);
        assert_eq!(first.confidence_score, second.confidence_score);
        assert_eq!(first.criteria, second.criteria);
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first_signals, second_signals);
        assert_eq!(engine.stats().total_detections, 2);
    }

    #[test]
    fn test_sink_receives_detections_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink { seen: seen.clone() };
        let mut engine =
            DetectionEngine::with_sink(DetectorConfig::default(), Box::new(sink)).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let quiet = quiet_batch(&SyntheticConfig::default(), &mut rng);
        engine.process(&quiet);
        assert!(seen.lock().unwrap().is_empty());

        let event = event_batch(
            &SyntheticConfig {
                event_magnitude: 0.06,
                ..Default::default()
            },
            &mut rng,
        );
        engine.process(&event);
        let recorded = seen.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], (Severity::High, 3));
    }

    #[test]
    fn test_sink_failure_does_not_poison_engine() {
        let mut engine =
            DetectionEngine::with_sink(DetectorConfig::default(), Box::new(FailingSink)).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let batch = event_batch(
            &SyntheticConfig {
                event_magnitude: 0.06,
                ..Default::default()
            },
            &mut rng,
        );

        let (result, _) = engine.process(&batch);
        assert!(result.detected);
        assert!(result.error.is_none());
        assert_eq!(engine.stats().total_detections, 1);
    }

    #[test]
    fn test_result_serializes_round_trip() {
        let mut engine = engine();
        let mut rng = StdRng::seed_from_u64(11);
        let batch = quiet_batch(&SyntheticConfig::default(), &mut rng);

        let (result, _) = engine.process(&batch);
        let yaml = serde_yaml::to_string(&result).unwrap();
        let back: DetectionResult = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_stats_echo_thresholds() {
        let config = DetectorConfig {
            pga_threshold: 0.03,
            ..Default::default()
        };
        let engine = DetectionEngine::new(config).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.thresholds.pga_threshold, 0.03);
        assert_eq!(stats.thresholds.sta_lta_threshold, 2.5);
        assert_eq!(stats.total_detections, 0);
    }
}
