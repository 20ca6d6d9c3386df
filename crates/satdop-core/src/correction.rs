//! # Table-Driven Doppler Correction
//!
//! Removes a known, time-varying Doppler offset from a complex baseband
//! stream. Every sample is mapped to absolute time, the correction frequency
//! at that time is read from a [`DopplerTable`], integrated into a wrapped
//! phase, and the sample is multiplied by `exp(-j·phase)`.
//!
//! ## Time Keeping
//!
//! Absolute time comes from a running anchor `(t0, sample_index0)`:
//!
//! ```text
//! t[n] = t0 + (n - sample_index0) / fs
//! ```
//!
//! The anchor starts at the configured `t0` for sample 0 and is replaced by
//! every time-anchor event the receiver embeds in the stream (`rx_time` tags).
//! An event at sample `k` affects samples `k` and later, never earlier ones.
//!
//! ## Signal Flow
//!
//! ```text
//!  rx_time events ──► anchor ──► t[n] ──► table ──► f[n] ──► Σ, wrap ──► φ[n]
//!                                                                        │
//!  x[n] ──────────────────────────────────────────────────► × ◄── e^{-jφ[n]}
//!                                                           │
//!                                                           ▼
//!                                                         y[n]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::correction::{DopplerCorrector, TimeAnchorEvent};
//! use satdop_core::doppler_table::DopplerTable;
//! use num_complex::Complex64;
//!
//! let table = DopplerTable::parse("0.0 0.0\n1.0 10.0\n", 1000.0).unwrap();
//! let mut corrector = DopplerCorrector::new(table, 1000.0, 0.0).unwrap();
//!
//! let input = vec![Complex64::new(1.0, 0.0); 500];
//! let first = corrector.process(&input, &[]);
//! assert_eq!(first.len(), 500);
//!
//! // Receiver re-established time at the start of the next buffer.
//! let anchor = TimeAnchorEvent::new(0, 0, 0.75);
//! let second = corrector.process(&input, &[anchor]);
//! assert_eq!(second.len(), 500);
//! ```

use tracing::{debug, info, warn};

use crate::config::CorrectorConfig;
use crate::doppler_table::{Coverage, DopplerTable};
use crate::observe::CorrectorMetrics;
use crate::phase::PhaseAccumulator;
use crate::stream_tags::{keys, StreamTag, TagStore};
use crate::types::{validate_sample_rate, DopplerError, DopplerResult, IQSample};

/// Mapping from global sample index to absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAnchor {
    /// Absolute time (s) of `sample_index0`
    pub t0: f64,
    /// Global sample index at which `t0` applies
    pub sample_index0: u64,
}

impl TimeAnchor {
    pub fn new(t0: f64, sample_index0: u64) -> Self {
        Self { t0, sample_index0 }
    }

    /// Absolute time of `sample_index`.
    #[inline]
    pub fn time_at(&self, sample_index: u64, sample_rate: f64) -> f64 {
        // Signed distance; an anchor may lie after the sample it is applied to.
        let delta = sample_index.wrapping_sub(self.sample_index0) as i64;
        self.t0 + delta as f64 / sample_rate
    }
}

/// A time anchor delivered with a buffer, positioned by offset within it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAnchorEvent {
    /// Sample offset within the buffer
    pub offset: usize,
    /// Whole seconds of absolute time
    pub seconds: u64,
    /// Fractional seconds
    pub fraction: f64,
}

impl TimeAnchorEvent {
    pub fn new(offset: usize, seconds: u64, fraction: f64) -> Self {
        Self {
            offset,
            seconds,
            fraction,
        }
    }

    /// Convert an `rx_time` tag with an absolute offset into an event
    /// relative to a buffer starting at `buffer_start`.
    ///
    /// Returns `None` for other keys, non-time values and tags before the
    /// buffer.
    pub fn from_tag(tag: &StreamTag, buffer_start: u64) -> Option<Self> {
        if tag.key != keys::RX_TIME || tag.offset < buffer_start {
            return None;
        }
        let (seconds, fraction) = tag.value.as_time()?;
        let offset = usize::try_from(tag.offset - buffer_start).ok()?;
        Some(Self::new(offset, seconds, fraction))
    }

    /// Absolute time in seconds.
    pub fn time(&self) -> f64 {
        self.seconds as f64 + self.fraction
    }
}

/// An anchor waiting to be applied at an absolute sample index.
#[derive(Debug, Clone, Copy)]
struct PendingAnchor {
    index: u64,
    t0: f64,
}

/// Per-buffer coverage tally, flushed into the metrics once per buffer.
#[derive(Debug, Default)]
struct CoverageTally {
    before: u64,
    after: u64,
    stale: u64,
}

impl CoverageTally {
    #[inline]
    fn record(&mut self, coverage: Coverage) {
        match coverage {
            Coverage::Interpolated => {}
            Coverage::BeforeStart => self.before += 1,
            Coverage::PastEnd => self.after += 1,
            Coverage::Stale => self.stale += 1,
        }
    }
}

/// Streaming Doppler corrector for one sample stream.
///
/// Owns the table cursor, the time anchor and the phase accumulator. All
/// three persist across calls, so buffers must be presented in stream order.
#[derive(Debug)]
pub struct DopplerCorrector {
    table: DopplerTable,
    sample_rate: f64,
    /// Construction-time `t0`, restored by [`reset`](Self::reset)
    initial_t0: f64,
    anchor: TimeAnchor,
    phase: PhaseAccumulator,
    /// Samples consumed so far; start index of the next buffer
    samples_processed: u64,
    /// Anchors delivered ahead of the samples they refer to
    pending: Vec<PendingAnchor>,
    last_coverage: Option<Coverage>,
    metrics: CorrectorMetrics,
}

impl DopplerCorrector {
    /// Create a corrector from a loaded table.
    ///
    /// `t0` is the absolute time of sample 0, used until the first anchor.
    pub fn new(table: DopplerTable, sample_rate: f64, t0: f64) -> DopplerResult<Self> {
        validate_sample_rate(sample_rate)?;
        if !t0.is_finite() {
            return Err(DopplerError::invalid(format!("t0 must be finite, got {t0}")));
        }
        let table_rate = table.sample_rate();
        if (table_rate - sample_rate).abs() > 1e-9 * sample_rate {
            return Err(DopplerError::invalid(format!(
                "table normalised for {table_rate} Hz but corrector runs at {sample_rate} Hz"
            )));
        }

        let (start, end) = table.span();
        debug!(
            sample_rate,
            t0,
            entries = table.len(),
            start,
            end,
            "created Doppler corrector"
        );

        Ok(Self {
            table,
            sample_rate,
            initial_t0: t0,
            anchor: TimeAnchor::new(t0, 0),
            phase: PhaseAccumulator::new(),
            samples_processed: 0,
            pending: Vec::new(),
            last_coverage: None,
            metrics: CorrectorMetrics::new(),
        })
    }

    /// Load the table file and create a corrector.
    pub fn from_file<P: AsRef<std::path::Path>>(
        path: P,
        sample_rate: f64,
        t0: f64,
    ) -> DopplerResult<Self> {
        validate_sample_rate(sample_rate)?;
        let table = DopplerTable::from_file(path, sample_rate)?;
        Self::new(table, sample_rate, t0)
    }

    /// Create a corrector from a configuration.
    pub fn from_config(config: &CorrectorConfig) -> DopplerResult<Self> {
        config.validate()?;
        Self::from_file(&config.table, config.sample_rate, config.t0)
    }

    /// Correct one buffer whose first sample has global index `start`.
    ///
    /// `events` may be unordered; they are applied in ascending offset order,
    /// and events sharing an offset in the order given (the last one wins).
    /// Events at or beyond `input.len()` are kept and applied once the
    /// stream reaches them.
    pub fn process_buffer(
        &mut self,
        input: &[IQSample],
        events: &[TimeAnchorEvent],
        start: u64,
    ) -> Vec<IQSample> {
        let mut output = input.to_vec();
        self.run(&mut output, events, start);
        output
    }

    /// Correct the next buffer of the stream.
    pub fn process(&mut self, input: &[IQSample], events: &[TimeAnchorEvent]) -> Vec<IQSample> {
        self.process_buffer(input, events, self.samples_processed)
    }

    /// Correct the next buffer of the stream in place.
    pub fn process_in_place(&mut self, samples: &mut [IQSample], events: &[TimeAnchorEvent]) {
        self.run(samples, events, self.samples_processed);
    }

    /// Correct the next buffer, taking anchors from `rx_time` tags.
    ///
    /// Tag offsets are absolute sample indices; only tags inside this buffer
    /// are consulted. `rx_rate` tags are checked against the corrector's
    /// sample rate.
    pub fn process_tagged(&mut self, input: &[IQSample], tags: &TagStore) -> Vec<IQSample> {
        let start = self.samples_processed;
        let end = start + input.len() as u64;

        let mut events = Vec::new();
        for tag in tags.range_key(start, end, keys::RX_TIME) {
            match TimeAnchorEvent::from_tag(tag, start) {
                Some(event) => events.push(event),
                None => {
                    debug!(%tag, "ignoring rx_time tag without a time value");
                    self.metrics.anchors_rejected.inc();
                }
            }
        }
        for tag in tags.range_key(start, end, keys::RX_RATE) {
            self.check_rate_tag(tag);
        }
        self.process_buffer(input, &events, start)
    }

    /// Log and count an `rx_rate` tag that disagrees with the configured
    /// rate. Correction keeps the configured rate.
    fn check_rate_tag(&self, tag: &StreamTag) {
        let matches = tag
            .value
            .as_float()
            .is_some_and(|rate| (rate - self.sample_rate).abs() <= 1e-9 * self.sample_rate);
        if !matches {
            warn!(
                %tag,
                sample_rate = self.sample_rate,
                "rx_rate tag disagrees with corrector sample rate"
            );
            self.metrics.rate_mismatches.inc();
        }
    }

    fn run(&mut self, samples: &mut [IQSample], events: &[TimeAnchorEvent], start: u64) {
        let end = start + samples.len() as u64;
        let due = self.collect_anchors(events, start, end);

        let mut tally = CoverageTally::default();
        let mut next = 0;
        let mut last_freq = 0.0;
        let mut last_t = self.anchor.time_at(start, self.sample_rate);

        for (j, sample) in samples.iter_mut().enumerate() {
            let index = start + j as u64;
            while next < due.len() && due[next].index <= index {
                self.apply_anchor(due[next]);
                next += 1;
            }

            let t = self.anchor.time_at(index, self.sample_rate);
            let lookup = self.table.lookup(t);
            if self.last_coverage != Some(lookup.coverage) {
                self.coverage_changed(lookup.coverage, t);
            }
            tally.record(lookup.coverage);

            self.phase.advance(lookup.freq);
            *sample *= self.phase.oscillator();

            last_freq = lookup.freq;
            last_t = t;
        }

        // Anchors at an index past the last sample of an empty buffer.
        for &anchor in &due[next..] {
            self.apply_anchor(anchor);
        }

        self.samples_processed = end;
        self.metrics.samples.inc_by(samples.len() as u64);
        self.metrics.buffers.inc();
        self.metrics.held_before.inc_by(tally.before);
        self.metrics.held_after.inc_by(tally.after);
        self.metrics.stale_lookups.inc_by(tally.stale);
        if !samples.is_empty() {
            self.metrics.doppler_hz.set(self.table.to_hz(last_freq));
            self.metrics.stream_time_s.set(last_t);
        }
    }

    /// Merge earlier pending anchors with this buffer's events. Anchors due
    /// before `end` are returned sorted by index; the rest stay pending.
    fn collect_anchors(
        &mut self,
        events: &[TimeAnchorEvent],
        start: u64,
        end: u64,
    ) -> Vec<PendingAnchor> {
        let mut due = Vec::new();
        if self.pending.is_empty() && events.is_empty() {
            return due;
        }

        self.pending.retain(|p| {
            if p.index < end {
                due.push(*p);
                false
            } else {
                true
            }
        });

        for event in events {
            let t0 = event.time();
            if !t0.is_finite() {
                warn!(offset = event.offset, "ignoring time anchor with non-finite time");
                self.metrics.anchors_rejected.inc();
                continue;
            }
            let anchor = PendingAnchor {
                index: start + event.offset as u64,
                t0,
            };
            if anchor.index < end {
                due.push(anchor);
            } else {
                self.pending.push(anchor);
            }
        }

        // Stable: equal indices keep delivery order.
        due.sort_by_key(|p| p.index);
        self.pending.sort_by_key(|p| p.index);
        due
    }

    fn apply_anchor(&mut self, anchor: PendingAnchor) {
        let previous = self.anchor.time_at(anchor.index, self.sample_rate);
        if anchor.t0 < previous - 0.5 / self.sample_rate {
            warn!(
                previous,
                t0 = anchor.t0,
                sample = anchor.index,
                "time anchor moves time backwards; Doppler table cursor is not rewound"
            );
            self.metrics.backward_jumps.inc();
        }
        info!("set time {} at sample {}", anchor.t0, anchor.index);
        self.anchor = TimeAnchor::new(anchor.t0, anchor.index);
        self.metrics.anchors.inc();
    }

    #[cold]
    fn coverage_changed(&mut self, coverage: Coverage, t: f64) {
        let (start, end) = self.table.span();
        match coverage {
            Coverage::BeforeStart => {
                debug!(t, start, "before Doppler table coverage, holding first frequency")
            }
            Coverage::PastEnd => {
                debug!(t, end, "past Doppler table coverage, holding last frequency")
            }
            Coverage::Stale => warn!(
                t,
                cursor_time = self.table.times()[self.table.cursor()],
                "time is behind the Doppler table cursor, holding cursor frequency"
            ),
            Coverage::Interpolated => debug!(t, "within Doppler table coverage"),
        }
        self.last_coverage = Some(coverage);
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        self.anchor = TimeAnchor::new(self.initial_t0, 0);
        self.phase.reset();
        self.table.reset_cursor();
        self.samples_processed = 0;
        self.pending.clear();
        self.last_coverage = None;
        self.metrics.reset();
    }

    /// Current oscillator phase (radians).
    pub fn phase(&self) -> f64 {
        self.phase.phase()
    }

    /// Current time anchor.
    pub fn anchor(&self) -> TimeAnchor {
        self.anchor
    }

    /// Absolute time of the next sample to be processed.
    pub fn current_time(&self) -> f64 {
        self.anchor.time_at(self.samples_processed, self.sample_rate)
    }

    /// Samples consumed so far.
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    /// Anchors received for samples not yet processed.
    pub fn pending_anchors(&self) -> usize {
        self.pending.len()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn table(&self) -> &DopplerTable {
        &self.table
    }

    pub fn metrics(&self) -> &CorrectorMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::wrap_angle;
    use crate::stream_tags::TagValue;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    const FS: f64 = 1000.0;

    fn rad(hz: f64) -> f64 {
        2.0 * PI * hz / FS
    }

    fn corrector(entries: &[(f64, f64)], t0: f64) -> DopplerCorrector {
        let table = DopplerTable::from_entries(entries, FS).unwrap();
        DopplerCorrector::new(table, FS, t0).unwrap()
    }

    fn ones(n: usize) -> Vec<IQSample> {
        vec![Complex64::new(1.0, 0.0); n]
    }

    fn test_signal(n: usize) -> Vec<IQSample> {
        (0..n)
            .map(|i| Complex64::from_polar(0.5 + 0.001 * (i % 17) as f64, 0.37 * i as f64))
            .collect()
    }

    /// Per-sample phase step of the oscillator seen through a unit input.
    fn steps(output: &[IQSample]) -> Vec<f64> {
        output
            .windows(2)
            .map(|w| wrap_angle(w[1].arg() - w[0].arg()))
            .collect()
    }

    #[test]
    fn test_zero_table_is_identity() {
        let mut c = corrector(&[(0.0, 0.0), (10.0, 0.0)], 0.0);
        let input = test_signal(2048);
        let output = c.process(&input, &[]);
        assert_eq!(output, input);
        assert_eq!(c.phase(), 0.0);
    }

    #[test]
    fn test_output_length_matches_input() {
        let mut c = corrector(&[(0.0, 100.0)], 0.0);
        assert_eq!(c.process(&ones(0), &[]).len(), 0);
        assert_eq!(c.process(&ones(1), &[]).len(), 1);
        assert_eq!(c.process(&ones(4097), &[]).len(), 4097);
        assert_eq!(c.samples_processed(), 4098);
    }

    #[test]
    fn test_constant_offset_removed() {
        // A tone at +100 Hz corrected with a +100 Hz table lands at DC.
        let mut c = corrector(&[(0.0, 100.0)], 0.0);
        let input: Vec<IQSample> = (1..=1000)
            .map(|n| Complex64::cis(rad(100.0) * n as f64))
            .collect();
        let output = c.process(&input, &[]);
        for y in &output {
            assert!((y - Complex64::new(1.0, 0.0)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_ramp_scenario() {
        let mut c = corrector(&[(0.0, 0.0), (1.0, 10.0)], 0.0);
        let input = ones(1000);
        let output = c.process(&input, &[]);

        assert_eq!(output[0], input[0]);

        let mut phase = 0.0;
        for (j, y) in output.iter().enumerate() {
            phase += rad(10.0 * j as f64 / 1000.0);
            assert!((y.norm() - 1.0).abs() < 1e-12);
            assert!((y - Complex64::cis(-phase)).norm() < 1e-9, "sample {j}");
        }

        let last_step = steps(&output)[998];
        assert!((last_step + rad(9.99)).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_override_at_offset() {
        // Step table: 10 Hz until t = 10 s, 50 Hz after.
        let mut c = corrector(&[(0.0, 10.0), (10.0, 10.0), (10.0, 50.0), (20.0, 50.0)], 0.0);
        let k = 100;
        let output = c.process(&ones(300), &[TimeAnchorEvent::new(k, 15, 0.0)]);

        let d = steps(&output);
        // d[j - 1] is the step taken at sample j.
        for j in 1..k {
            assert!((d[j - 1] + rad(10.0)).abs() < 1e-9, "sample {j}");
        }
        for j in k..300 {
            assert!((d[j - 1] + rad(50.0)).abs() < 1e-9, "sample {j}");
        }
        assert_eq!(c.anchor(), TimeAnchor::new(15.0, k as u64));
    }

    #[test]
    fn test_last_event_at_same_offset_wins() {
        let mut c = corrector(&[(0.0, 0.0), (100.0, 100.0)], 0.0);
        let events = [
            TimeAnchorEvent::new(10, 20, 0.0),
            TimeAnchorEvent::new(5, 90, 0.0),
            TimeAnchorEvent::new(10, 50, 0.5),
        ];
        c.process(&ones(20), &events);
        assert_eq!(c.anchor(), TimeAnchor::new(50.5, 10));
        assert_eq!(c.metrics().snapshot().anchors, 3);
    }

    #[test]
    fn test_time_follows_anchor() {
        let mut c = corrector(&[(0.0, 0.0)], 1000.0);
        c.process(&ones(500), &[]);
        assert!((c.current_time() - 1000.5).abs() < 1e-12);

        c.process(&ones(250), &[TimeAnchorEvent::new(50, 2000, 0.25)]);
        // Anchor at global index 550; 200 samples later.
        assert!((c.current_time() - (2000.25 + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_event_beyond_buffer_is_deferred() {
        let mut c = corrector(&[(0.0, 0.0)], 0.0);
        c.process(&ones(100), &[TimeAnchorEvent::new(150, 7, 0.0)]);
        assert_eq!(c.pending_anchors(), 1);
        assert_eq!(c.anchor(), TimeAnchor::new(0.0, 0));

        c.process(&ones(100), &[]);
        assert_eq!(c.pending_anchors(), 0);
        assert_eq!(c.anchor(), TimeAnchor::new(7.0, 150));
    }

    #[test]
    fn test_buffer_split_invariance() {
        let entries = [(0.0, -300.0), (2.0, 250.0), (4.0, 40.0), (9.0, 120.0)];
        let input = test_signal(6000);

        let mut tags = TagStore::new();
        tags.add(1234, keys::RX_TIME, TagValue::time(3, 0.125));
        tags.add(4000, keys::RX_TIME, TagValue::time(7, 0.5));

        let mut whole = corrector(&entries, 0.5);
        let reference = whole.process_tagged(&input, &tags);

        for chunk in [1usize, 7, 333, 1024, 4001] {
            let mut split = corrector(&entries, 0.5);
            let mut output = Vec::with_capacity(input.len());
            for block in input.chunks(chunk) {
                output.extend(split.process_tagged(block, &tags));
            }
            assert_eq!(output, reference, "chunk size {chunk}");
            assert_eq!(split.anchor(), whole.anchor());
            assert_eq!(split.phase(), whole.phase());
        }
    }

    #[test]
    fn test_in_place_matches_process() {
        let entries = [(0.0, 10.0), (1.0, 30.0)];
        let input = test_signal(777);
        let events = [TimeAnchorEvent::new(300, 0, 0.9)];

        let mut a = corrector(&entries, 0.0);
        let expected = a.process(&input, &events);

        let mut b = corrector(&entries, 0.0);
        let mut samples = input.clone();
        b.process_in_place(&mut samples, &events);
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_explicit_buffer_start() {
        let entries = [(0.0, 0.0), (10.0, 100.0)];
        let mut c = corrector(&entries, 0.0);
        // Host reports the buffer as starting at sample 5000 (t = 5 s).
        let out = c.process_buffer(&ones(2), &[], 5000);
        assert!((steps(&out)[0] + rad(50.01)).abs() < 1e-9);
        assert_eq!(c.samples_processed(), 5002);
    }

    #[test]
    fn test_backward_anchor_keeps_cursor() {
        let entries = [(0.0, 0.0), (1.0, 100.0), (2.0, 100.0), (3.0, 0.0)];
        let mut c = corrector(&entries, 1.5);
        c.process(&ones(10), &[]);
        assert_eq!(c.table().cursor(), 1);

        // Jump back to t = 0.2: the cursor stays, frequency is held at 100 Hz.
        let out = c.process(&ones(10), &[TimeAnchorEvent::new(0, 0, 0.2)]);
        for step in steps(&out) {
            assert!((step + rad(100.0)).abs() < 1e-9);
        }
        let s = c.metrics().snapshot();
        assert_eq!(s.backward_jumps, 1);
        assert_eq!(s.stale_lookups, 10);
        assert_eq!(c.table().cursor(), 1);
    }

    #[test]
    fn test_hold_metrics() {
        let mut c = corrector(&[(1.0, 10.0), (2.0, 20.0)], 0.0);
        // 0.0 .. 2.999 s: 1000 before, 1000 interpolated, 1000 after.
        c.process(&ones(3000), &[]);
        let s = c.metrics().snapshot();
        assert_eq!(s.samples, 3000);
        assert_eq!(s.buffers, 1);
        assert_eq!(s.held_before, 1000);
        assert_eq!(s.held_after, 1000);
        assert_eq!(s.stale_lookups, 0);
        assert!((s.doppler_hz - 20.0).abs() < 1e-9);
        assert!((s.stream_time_s - 2.999).abs() < 1e-12);
    }

    #[test]
    fn test_non_time_rx_time_tag_rejected() {
        let mut c = corrector(&[(0.0, 0.0)], 0.0);
        let mut tags = TagStore::new();
        tags.add(3, keys::RX_TIME, TagValue::Float(12.0));
        tags.add(4, keys::RX_RATE, TagValue::Float(FS));
        c.process_tagged(&ones(10), &tags);
        let s = c.metrics().snapshot();
        assert_eq!(s.anchors, 0);
        assert_eq!(s.anchors_rejected, 1);
        assert_eq!(s.rate_mismatches, 0);
    }

    #[test]
    fn test_rx_rate_mismatch_is_reported() {
        let mut c = corrector(&[(0.0, 0.0), (10.0, 100.0)], 0.0);
        let input = test_signal(50);
        let mut tags = TagStore::new();
        tags.add(5, keys::RX_RATE, TagValue::Float(2.0 * FS));
        tags.add(20, keys::RX_RATE, TagValue::time(1, 0.0));
        tags.add(70, keys::RX_RATE, TagValue::Float(3.0 * FS));

        let output = c.process_tagged(&input, &tags);
        assert_eq!(c.metrics().snapshot().rate_mismatches, 2);

        // Correction still runs at the configured rate.
        let mut plain = corrector(&[(0.0, 0.0), (10.0, 100.0)], 0.0);
        assert_eq!(output, plain.process(&input, &[]));

        c.process_tagged(&input, &tags);
        assert_eq!(c.metrics().snapshot().rate_mismatches, 3);
    }

    #[test]
    fn test_non_finite_event_rejected() {
        let mut c = corrector(&[(0.0, 0.0)], 0.0);
        c.process(&ones(10), &[TimeAnchorEvent::new(2, 1, f64::NAN)]);
        assert_eq!(c.anchor(), TimeAnchor::new(0.0, 0));
        assert_eq!(c.metrics().snapshot().anchors_rejected, 1);
    }

    #[test]
    fn test_from_tag() {
        let tag = StreamTag::new(1500, keys::RX_TIME, TagValue::time(10, 0.5));
        let event = TimeAnchorEvent::from_tag(&tag, 1000).unwrap();
        assert_eq!(event, TimeAnchorEvent::new(500, 10, 0.5));
        assert_eq!(event.time(), 10.5);

        assert!(TimeAnchorEvent::from_tag(&tag, 2000).is_none());
        let other = StreamTag::new(1500, keys::RX_RATE, TagValue::Float(FS));
        assert!(TimeAnchorEvent::from_tag(&other, 1000).is_none());
    }

    #[test]
    fn test_reset() {
        let entries = [(0.0, 0.0), (1.0, 40.0)];
        let input = test_signal(900);
        let mut c = corrector(&entries, 0.0);
        let first = c.process(&input, &[TimeAnchorEvent::new(10, 0, 0.3)]);
        c.reset();
        assert_eq!(c.samples_processed(), 0);
        assert_eq!(c.phase(), 0.0);
        assert_eq!(c.metrics().snapshot().samples, 0);
        let second = c.process(&input, &[TimeAnchorEvent::new(10, 0, 0.3)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_construction_errors() {
        let table = DopplerTable::from_entries(&[(0.0, 1.0)], FS).unwrap();
        assert!(matches!(
            DopplerCorrector::new(table.clone(), 2000.0, 0.0),
            Err(DopplerError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            DopplerCorrector::new(table.clone(), 0.0, 0.0),
            Err(DopplerError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            DopplerCorrector::new(table, FS, f64::INFINITY),
            Err(DopplerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_time_anchor_before_index() {
        let anchor = TimeAnchor::new(100.0, 1000);
        assert!((anchor.time_at(500, FS) - 99.5).abs() < 1e-12);
        assert!((anchor.time_at(1500, FS) - 100.5).abs() < 1e-12);
    }

    #[test]
    fn test_corrector_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DopplerCorrector>();
    }
}
