//! # Seismic Event Detection Library
//!
//! This crate analyzes batches of triaxial accelerometer samples and
//! decides whether the ground is shaking. It targets low-cost MEMS
//! sensors such as phone or IoT accelerometers sampling near 100 Hz,
//! where gravity, sensor noise, and human activity all have to be
//! separated from genuine seismic arrivals.
//!
//! ## Overview
//!
//! Detection combines three independent lines of evidence:
//!
//! - **Bandpass conditioning**: a zero-phase Butterworth filter keeps
//!   the 0.5 to 5 Hz band where earthquake energy concentrates,
//!   removing the gravity offset and high-frequency sensor noise
//! - **STA/LTA ratio**: the classic short-term over long-term average
//!   picker that fires on a sudden onset of energy
//! - **Criteria fusion**: peak ground acceleration, ratio trigger, and
//!   sustained shaking duration must all agree before an event is
//!   declared, with severity graded by peak acceleration
//!
//! ## Signal Flow
//!
//! ```text
//! SampleBatch → Bandpass (per axis) → STA/LTA (per axis) ─┐
//!      │                 │                                 │
//!      └── raw magnitude ─┴── PGA ──→ Criteria → Verdict + Severity
//! ```
//!
//! ## Example
//!
//! ```rust
//! use quakewatch_core::{DetectionEngine, DetectorConfig};
//! use quakewatch_core::synthetic::{quiet_batch, SyntheticConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut engine = DetectionEngine::new(DetectorConfig::default()).unwrap();
//!
//! // Ten seconds of a sensor sitting still: gravity on z, noise on all axes.
//! let mut rng = StdRng::seed_from_u64(1);
//! let batch = quiet_batch(&SyntheticConfig::default(), &mut rng);
//!
//! let (result, _signals) = engine.process(&batch);
//! assert!(!result.detected);
//! ```

pub mod bandpass;
pub mod config;
pub mod criteria;
pub mod detector;
pub mod event_sink;
pub mod observe;
pub mod sta_lta;
pub mod synthetic;
pub mod types;

// Re-export main types
pub use config::{ConfigError, DetectorConfig};
pub use criteria::{Criteria, Metrics};
pub use detector::{DerivedSignals, DetectionEngine, DetectionResult, DetectorStats, Thresholds};
pub use event_sink::{DetectionEvent, EventSink, LogSink, NullSink, YamlSink};
pub use types::{DetectorError, DetectorResult, Sample, SampleBatch, Severity};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bandpass::SignalConditioner;
    pub use crate::config::DetectorConfig;
    pub use crate::criteria::{Criteria, Metrics};
    pub use crate::detector::{DetectionEngine, DetectionResult, DetectorStats};
    pub use crate::event_sink::{EventSink, LogSink, NullSink, YamlSink};
    pub use crate::sta_lta::{max_ratio, sta_lta};
    pub use crate::types::{DetectorError, DetectorResult, SampleBatch, Severity};
}
