//! Corrector configuration
//!
//! ```json
//! {
//!   "table": "passes/noaa19-2024-05-01.txt",
//!   "sample_rate": 48000.0,
//!   "t0": 1714563000.0
//! }
//! ```
//!
//! `t0` is the absolute time of the first sample and is only used until the
//! stream delivers its first `rx_time` tag. It defaults to zero.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{validate_sample_rate, DopplerError, DopplerResult};

/// Construction parameters for a [`DopplerCorrector`](crate::correction::DopplerCorrector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectorConfig {
    /// Doppler table file
    pub table: PathBuf,
    /// Sample rate (Hz)
    pub sample_rate: f64,
    /// Initial absolute time (s)
    #[serde(default)]
    pub t0: f64,
}

impl CorrectorConfig {
    pub fn new(table: impl Into<PathBuf>, sample_rate: f64, t0: f64) -> Self {
        Self {
            table: table.into(),
            sample_rate,
            t0,
        }
    }

    /// Parse from a JSON string.
    pub fn from_json(text: &str) -> DopplerResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    ///
    /// A relative `table` path is resolved against the config file's
    /// directory.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DopplerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        if config.table.is_relative() {
            if let Some(dir) = path.parent() {
                config.table = dir.join(&config.table);
            }
        }
        Ok(config)
    }

    /// Check the numeric parameters.
    pub fn validate(&self) -> DopplerResult<()> {
        validate_sample_rate(self.sample_rate)?;
        if !self.t0.is_finite() {
            return Err(DopplerError::invalid(format!("t0 must be finite, got {}", self.t0)));
        }
        Ok(())
    }
}
