//! STA/LTA ratio computation for onset detection.
//!
//! The short-term average over long-term average ratio is a classic
//! seismological onset statistic: a sudden increase in signal amplitude
//! drives the short window up faster than the long window, producing a ratio
//! peak near the event onset.
//!
//! Both averages are centered moving averages of the absolute signal with
//! implicit zero padding at the batch boundaries ("same-length" convolution).
//! The running sum is always divided by the full window width, so within
//! half a window of either end the averages are systematically attenuated
//! and the ratio there is not a trustworthy onset statistic. Callers should
//! supply batches of at least one LTA window (ideally several) so the region
//! of interest sits clear of the edges.

/// Floor applied to the long-term average before division.
///
/// Keeps the ratio finite over silent stretches where the LTA would
/// otherwise collapse to zero.
pub const LTA_FLOOR: f64 = 1e-10;

/// Centered same-length moving average with implicit zero padding.
///
/// Output index `i` averages `values[i + h - window + 1 ..= i + h]` where
/// `h = (window - 1) / 2`, clipping the range to the signal bounds while
/// still dividing by the full `window`.
///
/// # Arguments
/// * `values` - Input values (typically absolute amplitudes)
/// * `window` - Averaging window length in samples
///
/// # Returns
/// A vector the same length as `values`, or empty when `values` is empty or
/// `window` is zero.
pub fn moving_average_same(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 || window == 0 {
        return Vec::new();
    }

    // prefix[i] holds the sum of values[..i]
    let mut prefix = Vec::with_capacity(n + 1);
    let mut acc = 0.0;
    prefix.push(0.0);
    for &v in values {
        acc += v;
        prefix.push(acc);
    }

    let half = (window - 1) / 2;
    let width = window as f64;
    (0..n)
        .map(|i| {
            let lo = (i + half).saturating_sub(window - 1);
            let hi = (i + half).min(n - 1);
            (prefix[hi + 1] - prefix[lo]) / width
        })
        .collect()
}

/// Computes the STA/LTA ratio series for a signal.
///
/// At every sample the ratio of the short-term to long-term centered moving
/// average of `|signal|` is taken, with the long-term average floored at
/// [`LTA_FLOOR`] to avoid division by zero over silence.
///
/// # Arguments
/// * `signal` - Input trace (filtered axis data)
/// * `sta_window` - Short-term window length in samples
/// * `lta_window` - Long-term window length in samples (must exceed `sta_window`)
///
/// # Returns
/// A vector of non-negative ratios the same length as `signal`, or empty for
/// an empty signal, a zero window, or `sta_window >= lta_window`.
pub fn sta_lta(signal: &[f64], sta_window: usize, lta_window: usize) -> Vec<f64> {
    if signal.is_empty() || sta_window == 0 || lta_window == 0 || sta_window >= lta_window {
        return Vec::new();
    }

    let abs: Vec<f64> = signal.iter().map(|x| x.abs()).collect();
    let sta = moving_average_same(&abs, sta_window);
    let lta = moving_average_same(&abs, lta_window);

    sta.iter()
        .zip(lta.iter())
        .map(|(s, l)| s / l.max(LTA_FLOOR))
        .collect()
}

/// Returns the maximum value of a ratio series, or 0.0 when empty.
pub fn max_ratio(ratio: &[f64]) -> f64 {
    ratio.iter().fold(0.0_f64, |m, &r| m.max(r))
}
