//! # Satellite Doppler Correction
//!
//! Removes the predictable Doppler shift of a satellite pass from a complex
//! baseband stream. The shift is taken from a precomputed table of
//! `(time, frequency)` pairs (typically generated from orbital elements), and
//! each sample is counter-rotated by an oscillator whose frequency tracks the
//! table as the stream's absolute time advances.
//!
//! ## Signal Flow
//!
//! ```text
//! IQ in ─► DopplerCorrector ─► IQ out (Doppler removed, same length)
//!               ▲      ▲
//!               │      └── rx_time tags (absolute time anchors)
//!               └── DopplerTable (time → rad/sample, linear interpolation)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::prelude::*;
//! use num_complex::Complex64;
//!
//! let table = DopplerTable::parse(
//!     "1700000000.0 8712.4\n1700000010.0 8650.0\n",
//!     48_000.0,
//! )
//! .unwrap();
//! let mut corrector = DopplerCorrector::new(table, 48_000.0, 1_700_000_000.0).unwrap();
//!
//! let mut tags = TagStore::new();
//! tags.add(0, keys::RX_TIME, TagValue::time(1_700_000_000, 0.5));
//!
//! let input = vec![Complex64::new(1.0, 0.0); 4096];
//! let output = corrector.process_tagged(&input, &tags);
//! assert_eq!(output.len(), input.len());
//! ```

pub mod config;
pub mod correction;
pub mod doppler_table;
pub mod file_source_sink;
pub mod observe;
pub mod phase;
pub mod stream_tags;
pub mod types;

pub use config::CorrectorConfig;
pub use correction::{DopplerCorrector, TimeAnchor, TimeAnchorEvent};
pub use doppler_table::{Coverage, DopplerTable, Lookup};
pub use types::{DopplerError, DopplerResult, IQSample};

/// Commonly used items.
pub mod prelude {
    pub use crate::config::CorrectorConfig;
    pub use crate::correction::{DopplerCorrector, TimeAnchor, TimeAnchorEvent};
    pub use crate::doppler_table::{Coverage, DopplerTable};
    pub use crate::file_source_sink::{IqFileFormat, IqReader, IqWriter};
    pub use crate::stream_tags::{keys, StreamTag, TagStore, TagValue};
    pub use crate::types::{DopplerError, DopplerResult, IQSample};
}
