//! Destinations for positive verdicts.
//!
//! The engine hands every detection to one [`EventSink`]. Sink failures
//! are reported back as errors but the engine only logs them, so a full
//! disk never stops detection itself.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use crate::detector::{DerivedSignals, DetectionResult};
use crate::types::{DetectorError, DetectorResult};

/// One detection, borrowed from the engine for the duration of the
/// callback.
#[derive(Debug)]
pub struct DetectionEvent<'a> {
    /// The positive verdict.
    pub result: &'a DetectionResult,
    /// Conditioned signals and ratio traces for the detected batch.
    pub signals: &'a DerivedSignals,
}

/// Receives each positive verdict as it happens.
pub trait EventSink: Send {
    fn on_detection(&mut self, event: &DetectionEvent<'_>) -> DetectorResult<()>;
}

/// Discards detections. The default sink.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_detection(&mut self, _event: &DetectionEvent<'_>) -> DetectorResult<()> {
        Ok(())
    }
}

/// Logs each detection at INFO with its headline numbers.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_detection(&mut self, event: &DetectionEvent<'_>) -> DetectorResult<()> {
        let result = event.result;
        info!(
            severity = %result.severity,
            confidence = result.confidence_score,
            pga_magnitude = result.metrics.pga_magnitude,
            max_sta_lta = result.metrics.max_sta_lta,
            timestamp = %result.timestamp,
            "detection event"
        );
        Ok(())
    }
}

/// Writes each verdict to its own YAML file under a directory.
///
/// Files are named `detection_<UTC timestamp>.yaml` with millisecond
/// resolution, so bursts of detections within one second do not
/// overwrite each other. The directory is created on first use.
#[derive(Debug)]
pub struct YamlSink {
    dir: PathBuf,
}

impl YamlSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this sink writes into.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl EventSink for YamlSink {
    fn on_detection(&mut self, event: &DetectionEvent<'_>) -> DetectorResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DetectorError::Sink(format!("create {}: {e}", self.dir.display())))?;
        let name = format!(
            "detection_{}.yaml",
            Utc::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let path = self.dir.join(name);
        let yaml = serde_yaml::to_string(event.result)
            .map_err(|e| DetectorError::Sink(format!("serialize verdict: {e}")))?;
        fs::write(&path, yaml)
            .map_err(|e| DetectorError::Sink(format!("write {}: {e}", path.display())))?;
        info!(path = %path.display(), "detection artifact written");
        Ok(())
    }
}
