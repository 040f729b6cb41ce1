//! Detection criteria evaluated over one conditioned batch.
//!
//! Three independent checks feed the verdict:
//!
//! - **Peak ground acceleration**: the Euclidean combination of the
//!   per-axis peaks of the bandpass-filtered signals must exceed
//!   `pga_threshold`.
//! - **STA/LTA ratio**: the largest short-term to long-term average
//!   ratio across the three axes must exceed `sta_lta_threshold`.
//! - **Shaking duration**: the raw (unfiltered) acceleration magnitude
//!   must stay above `pga_threshold` for at least
//!   `min_duration_seconds` in total.
//!
//! Duration is deliberately measured on the raw magnitude. The bandpass
//! stage rings after an impulsive arrival, and that ringing would
//! stretch the apparent shaking time well past what the sensor saw.

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::types::SampleBatch;

/// Scalar measurements extracted from one batch.
///
/// `pga_*` values come from the filtered signals and are expressed in g.
/// `duration_ok` mirrors [`Criteria::duration`] so that a serialized
/// metrics block is self-contained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Peak absolute filtered acceleration on the x axis, in g.
    pub pga_x: f64,
    /// Peak absolute filtered acceleration on the y axis, in g.
    pub pga_y: f64,
    /// Peak absolute filtered acceleration on the z axis, in g.
    pub pga_z: f64,
    /// Euclidean combination of the three per-axis peaks, in g.
    pub pga_magnitude: f64,
    /// Largest STA/LTA ratio observed on any axis.
    pub max_sta_lta: f64,
    /// Whether the sustained-shaking check passed.
    pub duration_ok: bool,
}

impl Metrics {
    /// All-zero metrics, used when a batch is rejected before analysis.
    pub fn zeroed() -> Self {
        Self {
            pga_x: 0.0,
            pga_y: 0.0,
            pga_z: 0.0,
            pga_magnitude: 0.0,
            max_sta_lta: 0.0,
            duration_ok: false,
        }
    }
}

/// Outcome of the three detection checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    /// Combined peak acceleration exceeded `pga_threshold`.
    pub pga: bool,
    /// Maximum STA/LTA ratio exceeded `sta_lta_threshold`.
    pub sta_lta: bool,
    /// Raw magnitude stayed above `pga_threshold` for at least
    /// `min_duration_seconds`.
    pub duration: bool,
}

impl Criteria {
    /// Number of checks that passed, between 0 and 3.
    pub fn passed_count(&self) -> u8 {
        u8::from(self.pga) + u8::from(self.sta_lta) + u8::from(self.duration)
    }

    /// True when every check passed.
    pub fn all_passed(&self) -> bool {
        self.pga && self.sta_lta && self.duration
    }

    pub fn none() -> Self {
        Self {
            pga: false,
            sta_lta: false,
            duration: false,
        }
    }
}

/// Peak absolute value of a signal, 0.0 for an empty slice.
pub fn peak_ground_acceleration(signal: &[f64]) -> f64 {
    signal.iter().fold(0.0_f64, |peak, &x| peak.max(x.abs()))
}

/// Total time the acceleration magnitude spends strictly above
/// `threshold`, in seconds.
///
/// Counts samples rather than looking for one contiguous run, so
/// intermittent strong shaking accumulates.
pub fn shaking_duration_seconds(magnitude: &[f64], threshold: f64, sample_rate: f64) -> f64 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    let above = magnitude.iter().filter(|&&m| m > threshold).count();
    above as f64 / sample_rate
}

/// Evaluate all three criteria for one batch.
///
/// `filtered_*` are the bandpass-conditioned axes, `max_sta_lta` is the
/// largest ratio observed across the three axes, and `raw` is the
/// original batch the duration check runs against.
pub fn evaluate(
    config: &DetectorConfig,
    filtered_x: &[f64],
    filtered_y: &[f64],
    filtered_z: &[f64],
    max_sta_lta: f64,
    raw: &SampleBatch,
) -> (Metrics, Criteria) {
    let pga_x = peak_ground_acceleration(filtered_x);
    let pga_y = peak_ground_acceleration(filtered_y);
    let pga_z = peak_ground_acceleration(filtered_z);
    let pga_magnitude = (pga_x * pga_x + pga_y * pga_y + pga_z * pga_z).sqrt();

    let magnitude = raw.magnitude();
    let duration =
        shaking_duration_seconds(&magnitude, config.pga_threshold, config.sample_rate);

    let criteria = Criteria {
        pga: pga_magnitude > config.pga_threshold,
        sta_lta: max_sta_lta > config.sta_lta_threshold,
        duration: duration >= config.min_duration_seconds,
    };
    let metrics = Metrics {
        pga_x,
        pga_y,
        pga_z,
        pga_magnitude,
        max_sta_lta,
        duration_ok: criteria.duration,
    };
    (metrics, criteria)
}
