//! Core types shared across the detection pipeline.
//!
//! Defines the triaxial [`SampleBatch`] that enters the pipeline, the
//! [`Severity`] tiers reported in verdicts, and the [`DetectorError`] taxonomy
//! with its [`DetectorResult`] alias.

use serde::{Deserialize, Serialize};

/// A single acceleration sample in units of g.
pub type Sample = f64;

/// Result type for detector operations.
pub type DetectorResult<T> = Result<T, DetectorError>;

/// Error type for detector operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectorError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bandpass filter design failed for the given parameters.
    #[error("filter design failed: {0}")]
    FilterDesign(String),

    /// Signal is shorter than the edge padding the zero-phase filter needs.
    #[error("signal too short for zero-phase filtering: need at least {needed} samples, got {actual}")]
    SignalTooShort { needed: usize, actual: usize },

    /// Batch axes have different lengths.
    #[error("batch axes have mismatched lengths: x={x}, y={y}, z={z}")]
    AxisLengthMismatch { x: usize, y: usize, z: usize },

    /// Batch contains no samples.
    #[error("batch is empty")]
    EmptyBatch,

    /// An event sink failed to persist a detection.
    #[error("event sink failed: {0}")]
    Sink(String),
}

/// Severity tier of a detection verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// No event, or only partial evidence.
    Low,
    /// All detection criteria passed.
    Medium,
    /// Peak ground acceleration exceeded the confirmation threshold.
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// A batch of triaxial accelerometer samples, one reading per axis per instant.
///
/// All three axes must have the same length and carry values in units of g.
/// Samples are assumed uniformly spaced at the configured sample rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleBatch {
    /// X-axis acceleration in g.
    pub accel_x: Vec<Sample>,
    /// Y-axis acceleration in g.
    pub accel_y: Vec<Sample>,
    /// Z-axis acceleration in g.
    pub accel_z: Vec<Sample>,
}

impl SampleBatch {
    /// Creates a batch from per-axis sample vectors.
    pub fn new(accel_x: Vec<Sample>, accel_y: Vec<Sample>, accel_z: Vec<Sample>) -> Self {
        Self {
            accel_x,
            accel_y,
            accel_z,
        }
    }

    /// Number of samples per axis (the x-axis length).
    pub fn len(&self) -> usize {
        self.accel_x.len()
    }

    /// Returns true if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.accel_x.is_empty()
    }

    /// Checks that the batch is non-empty and all axes have equal length.
    pub fn validate(&self) -> DetectorResult<()> {
        let (x, y, z) = (
            self.accel_x.len(),
            self.accel_y.len(),
            self.accel_z.len(),
        );
        if x != y || y != z {
            return Err(DetectorError::AxisLengthMismatch { x, y, z });
        }
        if x == 0 {
            return Err(DetectorError::EmptyBatch);
        }
        Ok(())
    }

    /// Instantaneous acceleration magnitude sqrt(x^2 + y^2 + z^2) per sample,
    /// computed from the raw (unfiltered) axes.
    pub fn magnitude(&self) -> Vec<Sample> {
        let n = self.len().min(self.accel_y.len()).min(self.accel_z.len());
        (0..n)
            .map(|i| {
                let (x, y, z) = (self.accel_x[i], self.accel_y[i], self.accel_z[i]);
                (x * x + y * y + z * z).sqrt()
            })
            .collect()
    }
}
