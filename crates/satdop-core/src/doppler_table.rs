//! # Doppler Table
//!
//! Time-indexed table of Doppler correction frequencies, as produced by an
//! orbit propagator for one satellite pass.
//!
//! ## File Format
//!
//! Plain text, one `time_seconds frequency_hz` record per pair of
//! whitespace-separated fields. No header, no comments:
//!
//! ```text
//! 1700000000.0   8712.4
//! 1700000001.0   8705.9
//! 1700000002.0   8699.3
//! ```
//!
//! Frequencies are converted to radians per sample at load time
//! (`2π·f/fs`), so lookups on the hot path never divide by the sample rate.
//!
//! ## Lookup Policy
//!
//! ```text
//!   freq
//!    ^        held                      interpolated                 held
//!    |  ----------------*--------------*-----------*----------------------
//!    |               times[0]       times[1]    times[n-1]
//!    +---------------------------------------------------------------> t
//! ```
//!
//! A cursor remembers the last table segment used and only ever moves
//! forward, so a stream of increasing times walks the table in O(1) amortised
//! per sample. Times earlier than the cursor are answered with the cursor's
//! own value instead of seeking backwards.
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::doppler_table::DopplerTable;
//! use std::f64::consts::PI;
//!
//! let mut table = DopplerTable::parse("0.0 0.0\n1.0 10.0\n", 1000.0).unwrap();
//! let f = table.query_frequency(0.5);
//! assert!((f - 2.0 * PI * 5.0 / 1000.0).abs() < 1e-12);
//! ```

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::types::{validate_sample_rate, DopplerError, DopplerResult};

/// Where a queried time falls relative to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Before the first entry; first frequency held.
    BeforeStart,
    /// Between two entries; linearly interpolated.
    Interpolated,
    /// At or past the last entry; last frequency held.
    PastEnd,
    /// Earlier than the cursor's entry after time moved backwards; the
    /// cursor's frequency is held until time catches up.
    Stale,
}

/// Result of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup {
    /// Angular frequency (radians/sample)
    pub freq: f64,
    pub coverage: Coverage,
}

/// Parsed Doppler table with a forward-only lookup cursor.
#[derive(Debug, Clone)]
pub struct DopplerTable {
    /// Absolute times (seconds), non-decreasing
    times: Vec<f64>,
    /// Angular frequency (radians/sample), index-aligned with `times`
    freqs: Vec<f64>,
    /// Sample rate used for the Hz → rad/sample conversion
    sample_rate: f64,
    /// Last entry not greater than the most recent query time
    cursor: usize,
}

impl DopplerTable {
    /// Build a table from `(time_s, frequency_hz)` pairs.
    pub fn from_entries(entries: &[(f64, f64)], sample_rate: f64) -> DopplerResult<Self> {
        validate_sample_rate(sample_rate)?;
        let mut times = Vec::with_capacity(entries.len());
        let mut freqs = Vec::with_capacity(entries.len());
        for (i, &(time, freq_hz)) in entries.iter().enumerate() {
            let record = i + 1;
            if !time.is_finite() {
                return Err(DopplerError::format(record, time.to_string(), "time is not finite"));
            }
            if !freq_hz.is_finite() {
                return Err(DopplerError::format(
                    record,
                    freq_hz.to_string(),
                    "frequency is not finite",
                ));
            }
            if let Some(&prev) = times.last() {
                if time < prev {
                    return Err(DopplerError::format(
                        record,
                        time.to_string(),
                        format!("time decreases (previous record at {prev})"),
                    ));
                }
            }
            times.push(time);
            freqs.push(2.0 * PI * freq_hz / sample_rate);
        }
        if times.is_empty() {
            return Err(DopplerError::EmptyTable);
        }
        debug!(
            entries = times.len(),
            start = times[0],
            end = times[times.len() - 1],
            "loaded Doppler table"
        );
        Ok(Self {
            times,
            freqs,
            sample_rate,
            cursor: 0,
        })
    }

    /// Parse table text.
    pub fn parse(text: &str, sample_rate: f64) -> DopplerResult<Self> {
        let mut entries = Vec::new();
        let mut tokens = text.split_whitespace();
        while let Some(time_tok) = tokens.next() {
            let record = entries.len() + 1;
            let time = parse_field(time_tok, record, "time")?;
            let freq_tok = tokens
                .next()
                .ok_or_else(|| DopplerError::format(record, "", "missing frequency field"))?;
            let freq = parse_field(freq_tok, record, "frequency")?;
            entries.push((time, freq));
        }
        Self::from_entries(&entries, sample_rate)
    }

    /// Read and parse a whole table from a reader.
    pub fn from_reader<R: BufRead>(mut reader: R, sample_rate: f64) -> DopplerResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text, sample_rate)
    }

    /// Open, read and parse a table file.
    pub fn from_file<P: AsRef<Path>>(path: P, sample_rate: f64) -> DopplerResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading Doppler table");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), sample_rate)
    }

    /// Frequency (radians/sample) at absolute time `t`, advancing the cursor.
    #[inline]
    pub fn query_frequency(&mut self, t: f64) -> f64 {
        self.lookup(t).freq
    }

    /// Frequency at absolute time `t` together with its coverage class.
    pub fn lookup(&mut self, t: f64) -> Lookup {
        let last = self.times.len() - 1;
        while self.cursor < last && self.times[self.cursor + 1] <= t {
            self.cursor += 1;
        }
        let c = self.cursor;

        if t < self.times[c] {
            let coverage = if c == 0 {
                Coverage::BeforeStart
            } else {
                Coverage::Stale
            };
            return Lookup {
                freq: self.freqs[c],
                coverage,
            };
        }
        if c == last {
            return Lookup {
                freq: self.freqs[c],
                coverage: Coverage::PastEnd,
            };
        }

        let alpha = (t - self.times[c]) / (self.times[c + 1] - self.times[c]);
        Lookup {
            freq: (1.0 - alpha) * self.freqs[c] + alpha * self.freqs[c + 1],
            coverage: Coverage::Interpolated,
        }
    }

    /// Convert an angular frequency (radians/sample) back to Hz.
    pub fn to_hz(&self, freq_rad: f64) -> f64 {
        freq_rad * self.sample_rate / (2.0 * PI)
    }

    /// Rewind the cursor to the first entry.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Current cursor index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Table times (seconds).
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Table frequencies (radians/sample).
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    /// Sample rate the frequencies were normalised with.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Time span `(first, last)` covered by the table.
    pub fn span(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false; an empty table cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

fn parse_field(token: &str, record: usize, field: &str) -> DopplerResult<f64> {
    let value: f64 = token
        .parse()
        .map_err(|_| DopplerError::format(record, token, format!("invalid {field}")))?;
    if !value.is_finite() {
        return Err(DopplerError::format(record, token, format!("{field} is not finite")));
    }
    Ok(value)
}
