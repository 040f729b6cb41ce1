//! Zero-phase Butterworth bandpass conditioning for accelerometer signals.
//!
//! Isolates seismic-frequency content before the ratio and amplitude stages:
//! - **Butterworth design**: analog prototype poles, bilinear transform with
//!   frequency pre-warping, cascade of biquad sections
//! - **Bandpass as cascade**: lowpass sections at the upper cutoff followed by
//!   highpass sections at the lower cutoff, `order` poles per edge
//! - **Zero-phase application**: forward pass then backward pass over an
//!   odd-reflection edge extension, so event onsets keep their timing
//! - **Graceful fallback**: on design or length failure the raw signal is
//!   passed through unchanged and a warning is logged
//!
//! # Example
//!
//! ```
//! use quakewatch_core::bandpass::SignalConditioner;
//! use quakewatch_core::config::DetectorConfig;
//!
//! let conditioner = SignalConditioner::new(&DetectorConfig::default()).unwrap();
//! let signal: Vec<f64> = (0..208).map(|i| (i as f64 * 0.1).sin()).collect();
//! let filtered = conditioner.condition(&signal);
//! assert_eq!(filtered.len(), signal.len());
//! ```

use crate::config::DetectorConfig;
use crate::types::{DetectorError, DetectorResult, Sample};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Band edge a biquad section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    Lowpass,
    Highpass,
}

/// A single biquad (second-order section) filter.
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
///
/// Using Direct Form II Transposed for better numerical properties.
#[derive(Debug, Clone)]
struct Biquad {
    /// Numerator coefficients [b0, b1, b2]
    b: [f64; 3],
    /// Denominator coefficients [a1, a2] (a0 is normalized to 1)
    a: [f64; 2],
    /// State variables for Direct Form II Transposed
    state: [f64; 2],
}

impl Biquad {
    fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self {
            b,
            a,
            state: [0.0; 2],
        }
    }

    /// Process a single real sample using Direct Form II Transposed.
    fn process(&mut self, input: f64) -> f64 {
        let output = self.b[0] * input + self.state[0];
        self.state[0] = self.b[1] * input - self.a[0] * output + self.state[1];
        self.state[1] = self.b[2] * input - self.a[1] * output;
        output
    }

    /// Set the state to steady state for a constant input, returning the
    /// section's steady output.
    ///
    /// Priming each pass this way means a DC-offset signal (gravity on the
    /// z-axis) produces no startup transient that would leak into peak
    /// amplitude measurements.
    fn prime_dc(&mut self, input: f64) -> f64 {
        let num = self.b[0] + self.b[1] + self.b[2];
        let den = 1.0 + self.a[0] + self.a[1];
        let output = if den.abs() > 1e-12 {
            input * num / den
        } else {
            0.0
        };
        self.state[1] = self.b[2] * input - self.a[1] * output;
        self.state[0] = self.b[1] * input - self.a[0] * output + self.state[1];
        output
    }

    /// Check if this biquad is stable (poles inside unit circle).
    fn is_stable(&self) -> bool {
        // For a second-order section with denominator 1 + a1*z^-1 + a2*z^-2,
        // stability requires:
        // |a2| < 1
        // |a1| < 1 + a2
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }
}

/// Zero-phase Butterworth bandpass conditioner.
///
/// Designed once from a [`DetectorConfig`] and applied per axis per batch.
/// Application is non-causal (forward-backward), so the filtered output has
/// no group delay relative to the raw signal.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    /// Cascade of biquad sections (lowpass edge first, then highpass edge).
    sections: Vec<Biquad>,
    /// Filter order per band edge.
    order: usize,
    /// Edge extension length per side for the zero-phase passes.
    pad_len: usize,
}

impl SignalConditioner {
    /// Build a conditioner from a detector configuration.
    pub fn new(config: &DetectorConfig) -> DetectorResult<Self> {
        Self::design(
            config.low_cut_freq,
            config.high_cut_freq,
            config.filter_order,
            config.sample_rate,
        )
    }

    /// Design a Butterworth bandpass conditioner.
    ///
    /// # Arguments
    /// * `low_hz` - Lower cutoff frequency in Hz
    /// * `high_hz` - Upper cutoff frequency in Hz
    /// * `order` - Filter order per band edge (total poles = 2 * order)
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// The designed conditioner, or [`DetectorError::FilterDesign`] when the
    /// cutoffs do not satisfy `0 < low < high < sample_rate / 2` or the order
    /// is outside 1-20.
    pub fn design(
        low_hz: f64,
        high_hz: f64,
        order: usize,
        sample_rate: f64,
    ) -> DetectorResult<Self> {
        if sample_rate <= 0.0 {
            return Err(DetectorError::FilterDesign(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if order == 0 || order > 20 {
            return Err(DetectorError::FilterDesign(format!(
                "order must be 1-20, got {order}"
            )));
        }
        let nyquist = sample_rate / 2.0;
        if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
            return Err(DetectorError::FilterDesign(format!(
                "cutoffs must satisfy 0 < low < high < nyquist, got low={low_hz}, high={high_hz}, nyquist={nyquist}"
            )));
        }

        // Bandpass = lowpass cascade at the upper edge + highpass cascade at
        // the lower edge.
        let mut sections = design_butterworth(order, high_hz, sample_rate, Response::Lowpass);
        sections.extend(design_butterworth(
            order,
            low_hz,
            sample_rate,
            Response::Highpass,
        ));

        if !sections.iter().all(Biquad::is_stable) {
            return Err(DetectorError::FilterDesign(format!(
                "designed sections are unstable for low={low_hz}, high={high_hz}, fs={sample_rate}"
            )));
        }

        Ok(Self {
            sections,
            order,
            pad_len: 3 * (2 * order + 1),
        })
    }

    /// Number of biquad sections in the cascade.
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Filter order per band edge.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Minimum signal length the zero-phase passes can handle.
    pub fn min_signal_len(&self) -> usize {
        self.pad_len + 1
    }

    /// Apply the filter with zero phase distortion.
    ///
    /// On failure (signal shorter than the edge extension) the raw signal is
    /// returned unchanged and a warning is logged; conditioning degrades
    /// accuracy rather than availability.
    pub fn condition(&self, signal: &[Sample]) -> Vec<Sample> {
        match self.try_condition(signal) {
            Ok(filtered) => filtered,
            Err(err) => {
                tracing::warn!(error = %err, "bandpass conditioning failed, passing raw signal through");
                signal.to_vec()
            }
        }
    }

    /// Fallible zero-phase application.
    ///
    /// # Returns
    /// The filtered signal (same length as input), or
    /// [`DetectorError::SignalTooShort`] when the signal cannot support the
    /// odd-reflection edge extension.
    pub fn try_condition(&self, signal: &[Sample]) -> DetectorResult<Vec<Sample>> {
        let n = signal.len();
        if n < self.min_signal_len() {
            return Err(DetectorError::SignalTooShort {
                needed: self.min_signal_len(),
                actual: n,
            });
        }

        let mut work = extend_odd(signal, self.pad_len);
        let mut sections = self.sections.clone();

        // Forward pass, then backward pass over the reversed output. Each
        // pass starts primed to steady state for its first sample.
        run_cascade(&mut sections, &mut work);
        work.reverse();
        run_cascade(&mut sections, &mut work);
        work.reverse();

        Ok(work[self.pad_len..self.pad_len + n].to_vec())
    }

    /// Get the frequency response at a given frequency.
    ///
    /// # Arguments
    /// * `freq_hz` - Frequency in Hz
    /// * `sample_rate` - Sample rate in Hz
    pub fn frequency_response(&self, freq_hz: f64, sample_rate: f64) -> Complex64 {
        let omega = 2.0 * PI * freq_hz / sample_rate;
        let z_inv = Complex64::new(omega.cos(), -omega.sin());
        let z_inv2 = z_inv * z_inv;

        let mut response = Complex64::new(1.0, 0.0);

        for section in &self.sections {
            let num = Complex64::new(section.b[0], 0.0)
                + Complex64::new(section.b[1], 0.0) * z_inv
                + Complex64::new(section.b[2], 0.0) * z_inv2;
            let den = Complex64::new(1.0, 0.0)
                + Complex64::new(section.a[0], 0.0) * z_inv
                + Complex64::new(section.a[1], 0.0) * z_inv2;
            response *= num / den;
        }

        response
    }

    /// Get the magnitude response in dB at a given frequency.
    ///
    /// This is the single-pass response; the zero-phase application squares
    /// the magnitude (doubles the dB attenuation).
    pub fn magnitude_response_db(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        20.0 * self.frequency_response(freq_hz, sample_rate).norm().log10()
    }
}

/// Apply a zero-phase Butterworth bandpass to a signal.
///
/// Convenience wrapper over [`SignalConditioner`]: on any design or length
/// failure the raw signal is returned unchanged and a warning is logged.
///
/// # Arguments
/// * `signal` - Input signal
/// * `low_hz` - Lower cutoff frequency in Hz
/// * `high_hz` - Upper cutoff frequency in Hz
/// * `order` - Filter order per band edge
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
/// Filtered signal of the same length as input.
pub fn bandpass_filter(
    signal: &[Sample],
    low_hz: f64,
    high_hz: f64,
    order: usize,
    sample_rate: f64,
) -> Vec<Sample> {
    match SignalConditioner::design(low_hz, high_hz, order, sample_rate) {
        Ok(conditioner) => conditioner.condition(signal),
        Err(err) => {
            tracing::warn!(error = %err, "bandpass design failed, passing raw signal through");
            signal.to_vec()
        }
    }
}

// --- Internal helper functions ---

/// Extend a signal by odd reflection about its endpoints.
///
/// The extension continues the signal without a step at either boundary, so
/// the filter passes run over settled data before reaching the real samples.
/// Requires `signal.len() > pad`.
fn extend_odd(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut ext = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        ext.push(2.0 * first - signal[i]);
    }
    ext.extend_from_slice(signal);
    for i in 1..=pad {
        ext.push(2.0 * last - signal[n - 1 - i]);
    }
    ext
}

/// Run the section cascade over `data` in place, primed to steady state for
/// the first sample.
fn run_cascade(sections: &mut [Biquad], data: &mut [f64]) {
    if data.is_empty() {
        return;
    }
    let mut dc = data[0];
    for section in sections.iter_mut() {
        dc = section.prime_dc(dc);
    }
    for value in data.iter_mut() {
        let mut acc = *value;
        for section in sections.iter_mut() {
            acc = section.process(acc);
        }
        *value = acc;
    }
}

/// Design Butterworth filter sections using the bilinear transform.
fn design_butterworth(
    order: usize,
    cutoff_hz: f64,
    sample_rate: f64,
    response: Response,
) -> Vec<Biquad> {
    // Pre-warp the cutoff frequency
    let wc = prewarp(cutoff_hz, sample_rate);

    // Analog prototype poles on the s-plane unit circle
    let poles = butterworth_poles(order);

    poles_to_biquads(&poles, wc, sample_rate, response)
}

/// Pre-warp frequency for bilinear transform.
fn prewarp(freq_hz: f64, sample_rate: f64) -> f64 {
    2.0 * sample_rate * (PI * freq_hz / sample_rate).tan()
}

/// Calculate Butterworth analog prototype poles.
fn butterworth_poles(order: usize) -> Vec<Complex64> {
    let mut poles = Vec::with_capacity(order);
    for k in 0..order {
        let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
        poles.push(Complex64::new(theta.cos(), theta.sin()));
    }
    poles
}

/// Convert analog prototype poles to digital biquad sections via bilinear transform.
fn poles_to_biquads(
    poles: &[Complex64],
    wc: f64,
    sample_rate: f64,
    response: Response,
) -> Vec<Biquad> {
    let k = 2.0 * sample_rate;
    let mut sections = Vec::new();

    // Pair poles by conjugate symmetry: each upper-half-plane pole
    // stands in for itself and its mirror, a real pole stands alone.
    // Odd orders place the real pole mid-list, so positional pairing
    // is not an option here.
    for &pole in poles {
        if pole.im > 1e-10 {
            // Complex conjugate pair - create second-order section
            let p = pole * wc;
            let (b, a) = bilinear_2pole(p, k, response);
            sections.push(Biquad::new(b, a));
        } else if pole.im.abs() <= 1e-10 {
            // Real pole - create first-order section
            let p = pole.re * wc;
            let (b, a) = bilinear_1pole(p, k, response);
            sections.push(Biquad::new(b, a));
        }
        // Lower-half-plane poles are the mirrors already accounted for
    }

    sections
}

/// Bilinear transform for a single real pole.
fn bilinear_1pole(p: f64, k: f64, response: Response) -> ([f64; 3], [f64; 2]) {
    let alpha = k - p;
    let beta = k + p;

    match response {
        Response::Lowpass => {
            let b0 = -p / alpha;
            let b1 = -p / alpha;
            let a1 = -beta / alpha;
            ([b0, b1, 0.0], [a1, 0.0])
        }
        Response::Highpass => {
            let b0 = k / alpha;
            let b1 = -k / alpha;
            let a1 = -beta / alpha;
            ([b0, b1, 0.0], [a1, 0.0])
        }
    }
}

/// Bilinear transform for a complex conjugate pole pair.
fn bilinear_2pole(p: Complex64, k: f64, response: Response) -> ([f64; 3], [f64; 2]) {
    let p_re = p.re;
    let p_im = p.im;
    let p_mag_sq = p_re * p_re + p_im * p_im;

    let k2 = k * k;
    let d = k2 - 2.0 * k * p_re + p_mag_sq;

    let a1 = 2.0 * (p_mag_sq - k2) / d;
    let a2 = (k2 + 2.0 * k * p_re + p_mag_sq) / d;

    match response {
        Response::Lowpass => {
            // Analog: H(s) = |p|^2 / (s^2 - 2*sigma*s + |p|^2)
            let b0 = p_mag_sq / d;
            let b1 = 2.0 * p_mag_sq / d;
            let b2 = p_mag_sq / d;
            ([b0, b1, b2], [a1, a2])
        }
        Response::Highpass => {
            let b0 = k2 / d;
            let b1 = -2.0 * k2 / d;
            let b2 = k2 / d;
            ([b0, b1, b2], [a1, a2])
        }
    }
}
