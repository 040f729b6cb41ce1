//! Synthetic accelerometer batches for tests, benches, and demos.
//!
//! Batches mimic a resting triaxial MEMS sensor: zero-mean Gaussian
//! noise on x and y, the same noise riding on 1 g of gravity on z. An
//! optional seismic event is a 2 Hz sinusoid with an exponentially
//! decaying envelope, strongest on x and progressively weaker on y
//! and z.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::types::SampleBatch;

/// Dominant frequency of the injected event, in Hz.
pub const EVENT_FREQUENCY_HZ: f64 = 2.0;

/// Length of the injected event, in seconds.
pub const EVENT_DURATION_SECONDS: f64 = 3.0;

/// Shape of a generated batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Total batch length in seconds.
    pub duration_seconds: f64,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Offset of the event onset from the start of the batch, in
    /// seconds. Ignored by [`quiet_batch`].
    pub event_start_seconds: f64,
    /// Peak amplitude of the event on the x axis, in g.
    pub event_magnitude: f64,
    /// Standard deviation of the sensor noise, in g.
    pub noise_sigma: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 10.0,
            sample_rate: 104.0,
            event_start_seconds: 5.0,
            event_magnitude: 0.03,
            noise_sigma: 0.001,
        }
    }
}

impl SyntheticConfig {
    fn num_samples(&self) -> usize {
        (self.duration_seconds * self.sample_rate) as usize
    }
}

/// Background noise only: a sensor sitting still on a desk.
pub fn quiet_batch(config: &SyntheticConfig, rng: &mut impl Rng) -> SampleBatch {
    let n = config.num_samples();
    let sigma = config.noise_sigma.max(0.0);
    let noise = Normal::new(0.0, sigma).unwrap();

    let accel_x: Vec<f64> = (0..n).map(|_| noise.sample(rng)).collect();
    let accel_y: Vec<f64> = (0..n).map(|_| noise.sample(rng)).collect();
    let accel_z: Vec<f64> = (0..n).map(|_| 1.0 + noise.sample(rng)).collect();
    SampleBatch::new(accel_x, accel_y, accel_z)
}

/// Background noise with a decaying 2 Hz event injected at
/// `event_start_seconds`.
///
/// The event rides on x at full amplitude, on y at 0.8x, and on z at
/// 0.6x. An event that would run past the end of the batch is cut
/// short rather than wrapped.
pub fn event_batch(config: &SyntheticConfig, rng: &mut impl Rng) -> SampleBatch {
    let mut batch = quiet_batch(config, rng);
    let n = batch.accel_x.len();

    let start = (config.event_start_seconds * config.sample_rate) as usize;
    let event_len = (EVENT_DURATION_SECONDS * config.sample_rate) as usize;
    if event_len < 2 || start >= n {
        return batch;
    }
    let count = event_len.min(n - start);

    // Inclusive time grid over the full event, matching the envelope
    // even when the batch truncates the tail.
    let step = EVENT_DURATION_SECONDS / (event_len - 1) as f64;
    for k in 0..count {
        let t = k as f64 * step;
        let s = config.event_magnitude
            * (2.0 * std::f64::consts::PI * EVENT_FREQUENCY_HZ * t).sin()
            * (-t / 2.0).exp();
        batch.accel_x[start + k] += s;
        batch.accel_y[start + k] += 0.8 * s;
        batch.accel_z[start + k] += 0.6 * s;
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn max_abs(values: &[f64]) -> f64 {
        values.iter().fold(0.0_f64, |m, &v| m.max(v.abs()))
    }

    #[test]
    fn test_quiet_batch_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = quiet_batch(&SyntheticConfig::default(), &mut rng);
        assert_eq!(batch.accel_x.len(), 1040);
        assert_eq!(batch.accel_y.len(), 1040);
        assert_eq!(batch.accel_z.len(), 1040);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_quiet_batch_statistics() {
        let mut rng = StdRng::seed_from_u64(2);
        let batch = quiet_batch(&SyntheticConfig::default(), &mut rng);
        assert!(mean(&batch.accel_x).abs() < 0.001);
        assert!((mean(&batch.accel_z) - 1.0).abs() < 0.001);
        assert!(max_abs(&batch.accel_x) < 0.01, "noise should stay near 1 mg");
    }

    #[test]
    fn test_event_batch_peak_and_placement() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = SyntheticConfig::default();
        let batch = event_batch(&config, &mut rng);
        let start = (config.event_start_seconds * config.sample_rate) as usize;

        let before = max_abs(&batch.accel_x[..start]);
        let during = max_abs(&batch.accel_x[start..]);
        assert!(before < 0.01, "no event energy before onset, saw {before}");
        assert!(during > 0.02, "event peak should approach 0.03 g, saw {during}");
    }

    #[test]
    fn test_event_batch_axis_damping() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = SyntheticConfig::default();
        let batch = event_batch(&config, &mut rng);
        let start = (config.event_start_seconds * config.sample_rate) as usize;

        let peak_x = max_abs(&batch.accel_x[start..]);
        let peak_y = max_abs(&batch.accel_y[start..]);
        let z_swing: Vec<f64> = batch.accel_z[start..].iter().map(|v| v - 1.0).collect();
        let peak_z = max_abs(&z_swing);
        assert!(peak_x > peak_y, "y rides at 0.8x");
        assert!(peak_y > peak_z, "z rides at 0.6x");
        assert!(peak_z > 0.01);
    }

    #[test]
    fn test_same_seed_same_batch() {
        let config = SyntheticConfig::default();
        let a = event_batch(&config, &mut StdRng::seed_from_u64(9));
        let b = event_batch(&config, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.accel_x, b.accel_x);
        assert_eq!(a.accel_y, b.accel_y);
        assert_eq!(a.accel_z, b.accel_z);
    }

    #[test]
    fn test_event_truncated_at_batch_end() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = SyntheticConfig {
            event_start_seconds: 9.0,
            ..Default::default()
        };
        let batch = event_batch(&config, &mut rng);
        assert_eq!(batch.accel_x.len(), 1040);
        let start = 9 * 104;
        assert!(max_abs(&batch.accel_x[start..]) > 0.02);
    }

    #[test]
    fn test_event_start_past_end_leaves_noise() {
        let mut rng = StdRng::seed_from_u64(6);
        let config = SyntheticConfig {
            event_start_seconds: 20.0,
            ..Default::default()
        };
        let batch = event_batch(&config, &mut rng);
        assert!(max_abs(&batch.accel_x) < 0.01);
    }

    #[test]
    fn test_zero_sigma_is_noiseless() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = SyntheticConfig {
            noise_sigma: 0.0,
            ..Default::default()
        };
        let batch = quiet_batch(&config, &mut rng);
        assert!(batch.accel_x.iter().all(|&v| v == 0.0));
        assert!(batch.accel_z.iter().all(|&v| v == 1.0));
    }
}
