//! Core types for Doppler correction
//!
//! Sample aliases shared by every block in the crate, plus the error taxonomy
//! raised while building a corrector.
//!
//! All errors are construction-time errors. Once a [`DopplerCorrector`] exists
//! the per-sample path cannot fail: times outside the table are answered with
//! a held frequency and backward time jumps are tolerated, both of which are
//! reported through `tracing` and the metrics counters rather than as errors.
//!
//! [`DopplerCorrector`]: crate::correction::DopplerCorrector

use num_complex::Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// Result type for corrector construction
pub type DopplerResult<T> = Result<T, DopplerError>;

/// Errors that can occur while loading a Doppler table or building a corrector
#[derive(Debug, thiserror::Error)]
pub enum DopplerError {
    #[error("format error in Doppler table at record {record}: {reason} ({token:?})")]
    Format {
        /// 1-based record number
        record: usize,
        /// Offending token, empty when the record is truncated
        token: String,
        reason: String,
    },

    #[error("Doppler table contains no records")]
    EmptyTable,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(String),
}

impl DopplerError {
    pub(crate) fn format(record: usize, token: impl Into<String>, reason: impl Into<String>) -> Self {
        DopplerError::Format {
            record,
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DopplerError::InvalidConfiguration(msg.into())
    }
}

impl From<serde_json::Error> for DopplerError {
    fn from(err: serde_json::Error) -> Self {
        DopplerError::Config(err.to_string())
    }
}

/// Check that a sample rate is usable as a divisor.
pub(crate) fn validate_sample_rate(sample_rate: f64) -> DopplerResult<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(DopplerError::invalid(format!(
            "sample rate must be positive and finite, got {sample_rate}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_format_error_display() {
        let err = DopplerError::format(3, "abc", "invalid time");
        let msg = err.to_string();
        assert!(msg.contains("record 3"));
        assert!(msg.contains("abc"));
        assert!(msg.contains("invalid time"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DopplerError = io_err.into();
        assert!(matches!(err, DopplerError::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_sample_rate_validation() {
        assert!(validate_sample_rate(48000.0).is_ok());
        assert!(matches!(
            validate_sample_rate(0.0),
            Err(DopplerError::InvalidConfiguration(_))
        ));
        assert!(validate_sample_rate(-1.0).is_err());
        assert!(validate_sample_rate(f64::NAN).is_err());
        assert!(validate_sample_rate(f64::INFINITY).is_err());
    }
}
