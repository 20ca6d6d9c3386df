//! # Corrector Metrics
//!
//! Lock-free counters and gauges describing what a corrector has been doing:
//! samples corrected, time anchors applied, and how many samples fell outside
//! the Doppler table or hit a stale cursor after time moved backwards.
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::observe::CorrectorMetrics;
//!
//! let metrics = CorrectorMetrics::new();
//! metrics.samples.inc_by(1024);
//! metrics.anchors.inc();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.samples, 1024);
//! println!("{}", metrics.to_prometheus());
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A simple atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// An atomic floating-point gauge, stored as raw `f64` bits.
#[derive(Debug, Default)]
pub struct Gauge {
    bits: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Metrics for one corrector instance.
#[derive(Debug, Default)]
pub struct CorrectorMetrics {
    /// Samples corrected
    pub samples: Counter,
    /// Buffers processed
    pub buffers: Counter,
    /// Time anchors applied
    pub anchors: Counter,
    /// Tags that looked like time anchors but could not be used
    pub anchors_rejected: Counter,
    /// Samples before the table's first entry (frequency held)
    pub held_before: Counter,
    /// Samples at or past the table's last entry (frequency held)
    pub held_after: Counter,
    /// Samples answered from a stale cursor after time moved backwards
    pub stale_lookups: Counter,
    /// Anchors that moved absolute time backwards
    pub backward_jumps: Counter,
    /// `rx_rate` tags disagreeing with the configured sample rate
    pub rate_mismatches: Counter,
    /// Most recent correction frequency (Hz)
    pub doppler_hz: Gauge,
    /// Absolute time of the most recent sample (s)
    pub stream_time_s: Gauge,
}

impl CorrectorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples: self.samples.get(),
            buffers: self.buffers.get(),
            anchors: self.anchors.get(),
            anchors_rejected: self.anchors_rejected.get(),
            held_before: self.held_before.get(),
            held_after: self.held_after.get(),
            stale_lookups: self.stale_lookups.get(),
            backward_jumps: self.backward_jumps.get(),
            rate_mismatches: self.rate_mismatches.get(),
            doppler_hz: self.doppler_hz.get(),
            stream_time_s: self.stream_time_s.get(),
        }
    }

    /// Reset every counter and gauge to zero.
    pub fn reset(&self) {
        self.samples.reset();
        self.buffers.reset();
        self.anchors.reset();
        self.anchors_rejected.reset();
        self.held_before.reset();
        self.held_after.reset();
        self.stale_lookups.reset();
        self.backward_jumps.reset();
        self.rate_mismatches.reset();
        self.doppler_hz.set(0.0);
        self.stream_time_s.set(0.0);
    }

    /// Export in Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut output = String::new();
        let mut metric = |name: &str, kind: &str, help: &str, value: String| {
            output.push_str(&format!("# HELP satdop_{name} {help}\n"));
            output.push_str(&format!("# TYPE satdop_{name} {kind}\n"));
            output.push_str(&format!("satdop_{name} {value}\n"));
        };

        metric("samples_total", "counter", "Samples corrected", s.samples.to_string());
        metric("buffers_total", "counter", "Buffers processed", s.buffers.to_string());
        metric("anchors_total", "counter", "Time anchors applied", s.anchors.to_string());
        metric(
            "anchors_rejected_total",
            "counter",
            "Unusable time anchor tags",
            s.anchors_rejected.to_string(),
        );
        metric(
            "held_before_total",
            "counter",
            "Samples before table coverage",
            s.held_before.to_string(),
        );
        metric(
            "held_after_total",
            "counter",
            "Samples past table coverage",
            s.held_after.to_string(),
        );
        metric(
            "stale_lookups_total",
            "counter",
            "Samples looked up from a stale cursor",
            s.stale_lookups.to_string(),
        );
        metric(
            "backward_jumps_total",
            "counter",
            "Anchors moving time backwards",
            s.backward_jumps.to_string(),
        );
        metric(
            "rate_mismatches_total",
            "counter",
            "rx_rate tags disagreeing with the sample rate",
            s.rate_mismatches.to_string(),
        );
        metric("doppler_hz", "gauge", "Current correction frequency", s.doppler_hz.to_string());
        metric(
            "stream_time_seconds",
            "gauge",
            "Absolute time of the latest sample",
            s.stream_time_s.to_string(),
        );

        output
    }
}

/// A point-in-time copy of [`CorrectorMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub samples: u64,
    pub buffers: u64,
    pub anchors: u64,
    pub anchors_rejected: u64,
    pub held_before: u64,
    pub held_after: u64,
    pub stale_lookups: u64,
    pub backward_jumps: u64,
    pub rate_mismatches: u64,
    pub doppler_hz: f64,
    pub stream_time_s: f64,
}

impl MetricsSnapshot {
    /// Fraction of samples corrected with a held (not interpolated) frequency.
    pub fn held_fraction(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            (self.held_before + self.held_after + self.stale_lookups) as f64 / self.samples as f64
        }
    }
}
