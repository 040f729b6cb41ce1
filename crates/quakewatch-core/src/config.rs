//! # Configuration System
//!
//! YAML-based configuration for the detection pipeline, covering filter
//! design, STA/LTA windows, and the detection thresholds.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `QUAKEWATCH_CONFIG` environment variable
//! 2. `./quakewatch.yaml` (current directory)
//! 3. `~/.config/quakewatch/config.yaml` (user config)
//! 4. `/etc/quakewatch/config.yaml` (system config)
//!
//! Individual parameters can also be overridden through `QUAKEWATCH_*`
//! environment variables (see [`DetectorConfig::with_env_overrides`]).
//!
//! ## Example Configuration
//!
//! ```yaml
//! pga_threshold: 0.02
//! pga_confirmation: 0.05
//! sta_lta_threshold: 2.5
//! min_duration_seconds: 0.5
//! low_cut_freq: 0.5
//! high_cut_freq: 5.0
//! filter_order: 4
//! sta_window_seconds: 1.0
//! lta_window_seconds: 10.0
//! sample_rate: 104.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Error type for configuration operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("config not found: {0}")]
    NotFound(String),
    /// Failed to read configuration file.
    #[error("failed to read config: {0}")]
    Read(String),
    /// Failed to write configuration file.
    #[error("failed to write config: {0}")]
    Write(String),
    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Detection pipeline configuration.
///
/// All thresholds and accelerations are in units of g, frequencies in Hz,
/// windows and durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// PGA magnitude above which the amplitude criterion passes, in g.
    pub pga_threshold: f64,
    /// PGA magnitude above which severity is forced to HIGH, in g.
    pub pga_confirmation: f64,
    /// Peak STA/LTA ratio above which the ratio criterion passes.
    pub sta_lta_threshold: f64,
    /// Minimum sustained shaking duration for the duration criterion, in seconds.
    pub min_duration_seconds: f64,
    /// Lower bandpass cutoff frequency in Hz.
    pub low_cut_freq: f64,
    /// Upper bandpass cutoff frequency in Hz.
    pub high_cut_freq: f64,
    /// Butterworth filter order per band edge.
    pub filter_order: usize,
    /// Short-term averaging window duration in seconds.
    pub sta_window_seconds: f64,
    /// Long-term averaging window duration in seconds.
    pub lta_window_seconds: f64,
    /// Sample rate of incoming batches in Hz.
    pub sample_rate: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pga_threshold: 0.02,
            pga_confirmation: 0.05,
            sta_lta_threshold: 2.5,
            min_duration_seconds: 0.5,
            low_cut_freq: 0.5,
            high_cut_freq: 5.0,
            filter_order: 4,
            sta_window_seconds: 1.0,
            lta_window_seconds: 10.0,
            sample_rate: 104.0,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `QUAKEWATCH_CONFIG` environment variable
    /// 2. `./quakewatch.yaml`
    /// 3. `~/.config/quakewatch/config.yaml`
    /// 4. `/etc/quakewatch/config.yaml`
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("QUAKEWATCH_CONFIG") {
            let path = Path::new(&path);
            if path.exists() {
                return Self::load_from(path);
            }
            tracing::warn!(
                path = %path.display(),
                "QUAKEWATCH_CONFIG points to a missing file, falling back to search paths"
            );
        }

        let paths = Self::config_search_paths();
        for path in &paths {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.display().to_string())
            } else {
                ConfigError::Read(format!("{}: {}", path.display(), e))
            }
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::Write(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./quakewatch.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "quakewatch") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/quakewatch/config.yaml"));

        paths
    }

    /// Apply `QUAKEWATCH_*` environment variable overrides to this config.
    ///
    /// Recognized variables: `QUAKEWATCH_PGA_THRESHOLD`,
    /// `QUAKEWATCH_PGA_CONFIRMATION`, `QUAKEWATCH_STA_LTA_THRESHOLD`,
    /// `QUAKEWATCH_MIN_DURATION`, `QUAKEWATCH_LOW_CUT`, `QUAKEWATCH_HIGH_CUT`,
    /// `QUAKEWATCH_FILTER_ORDER`, `QUAKEWATCH_STA_WINDOW`,
    /// `QUAKEWATCH_LTA_WINDOW`, `QUAKEWATCH_SAMPLE_RATE`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        env_f64("QUAKEWATCH_PGA_THRESHOLD", &mut self.pga_threshold);
        env_f64("QUAKEWATCH_PGA_CONFIRMATION", &mut self.pga_confirmation);
        env_f64("QUAKEWATCH_STA_LTA_THRESHOLD", &mut self.sta_lta_threshold);
        env_f64("QUAKEWATCH_MIN_DURATION", &mut self.min_duration_seconds);
        env_f64("QUAKEWATCH_LOW_CUT", &mut self.low_cut_freq);
        env_f64("QUAKEWATCH_HIGH_CUT", &mut self.high_cut_freq);
        env_usize("QUAKEWATCH_FILTER_ORDER", &mut self.filter_order);
        env_f64("QUAKEWATCH_STA_WINDOW", &mut self.sta_window_seconds);
        env_f64("QUAKEWATCH_LTA_WINDOW", &mut self.lta_window_seconds);
        env_f64("QUAKEWATCH_SAMPLE_RATE", &mut self.sample_rate);
        self
    }

    /// Returns the Nyquist frequency (half the sample rate) in Hz.
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Returns the STA window length in samples.
    pub fn sta_samples(&self) -> usize {
        (self.sta_window_seconds * self.sample_rate).round() as usize
    }

    /// Returns the LTA window length in samples.
    pub fn lta_samples(&self) -> usize {
        (self.lta_window_seconds * self.sample_rate).round() as usize
    }

    /// Validate the configuration.
    ///
    /// Enforces positivity of all parameters and the band placement
    /// invariant `low_cut_freq < high_cut_freq < sample_rate / 2`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "sample_rate must be positive".to_string(),
            ));
        }
        if self.filter_order == 0 || self.filter_order > 20 {
            return Err(ConfigError::Validation(
                "filter_order must be 1-20".to_string(),
            ));
        }
        for (name, value) in [
            ("pga_threshold", self.pga_threshold),
            ("pga_confirmation", self.pga_confirmation),
            ("sta_lta_threshold", self.sta_lta_threshold),
            ("min_duration_seconds", self.min_duration_seconds),
            ("low_cut_freq", self.low_cut_freq),
            ("sta_window_seconds", self.sta_window_seconds),
            ("lta_window_seconds", self.lta_window_seconds),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be positive",
                    name
                )));
            }
        }
        if self.low_cut_freq >= self.high_cut_freq {
            return Err(ConfigError::Validation(format!(
                "low_cut_freq ({}) must be below high_cut_freq ({})",
                self.low_cut_freq, self.high_cut_freq
            )));
        }
        if self.high_cut_freq >= self.nyquist() {
            return Err(ConfigError::Validation(format!(
                "high_cut_freq ({}) must be below the Nyquist frequency ({})",
                self.high_cut_freq,
                self.nyquist()
            )));
        }
        if self.sta_window_seconds >= self.lta_window_seconds {
            return Err(ConfigError::Validation(format!(
                "sta_window_seconds ({}) must be below lta_window_seconds ({})",
                self.sta_window_seconds, self.lta_window_seconds
            )));
        }
        if self.sta_samples() == 0 {
            return Err(ConfigError::Validation(format!(
                "sta_window_seconds ({}) rounds to zero samples at {} Hz",
                self.sta_window_seconds, self.sample_rate
            )));
        }
        if self.lta_samples() <= self.sta_samples() {
            return Err(ConfigError::Validation(
                "lta window must exceed the sta window in samples".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

fn env_f64(name: &str, target: &mut f64) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse::<f64>() {
            Ok(v) => *target = v,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "ignoring unparseable config override")
            }
        }
    }
}

fn env_usize(name: &str, target: &mut usize) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse::<usize>() {
            Ok(v) => *target = v,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "ignoring unparseable config override")
            }
        }
    }
}
