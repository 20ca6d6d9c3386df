//! Stream Tags: Metadata Alongside Sample Streams
//!
//! Tags are key-value metadata attached to absolute sample offsets. The
//! corrector consumes `rx_time` tags, which a receiver emits whenever it
//! (re)establishes absolute time for a sample, e.g. after an overflow.
//!
//! | Key       | Value              | Meaning                               |
//! |-----------|--------------------|---------------------------------------|
//! | `rx_time` | `Time`             | Absolute time of the tagged sample    |
//! | `rx_rate` | `Float`            | Sample rate (Hz), checked, not obeyed |
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::stream_tags::{keys, TagStore, TagValue};
//!
//! let mut tags = TagStore::new();
//! tags.add(0, keys::RX_TIME, TagValue::time(1_700_000_000, 0.25));
//! tags.add(48_000, keys::RX_TIME, TagValue::time(1_700_000_001, 0.25));
//!
//! let first_block = tags.range(0, 4096);
//! assert_eq!(first_block.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Typed metadata attached to a sample offset.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Float(f64),
    /// Absolute time as whole seconds plus a fractional part.
    Time { seconds: u64, fraction: f64 },
}

impl TagValue {
    /// Build a time value.
    pub fn time(seconds: u64, fraction: f64) -> Self {
        TagValue::Time { seconds, fraction }
    }

    /// Try to get as `(seconds, fraction)`.
    pub fn as_time(&self) -> Option<(u64, f64)> {
        match self {
            TagValue::Time { seconds, fraction } => Some((*seconds, *fraction)),
            _ => None,
        }
    }

    /// Try to get as float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Float(v) => write!(f, "{v:.6}"),
            TagValue::Time { seconds, fraction } => write!(f, "({seconds}, {fraction:.9})"),
        }
    }
}

/// A single stream tag: key-value pair at an absolute sample offset.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTag {
    /// Absolute sample offset where the tag applies.
    pub offset: u64,
    pub key: String,
    pub value: TagValue,
}

impl StreamTag {
    pub fn new(offset: u64, key: impl Into<String>, value: TagValue) -> Self {
        Self {
            offset,
            key: key.into(),
            value,
        }
    }
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}: {} = {}", self.offset, self.key, self.value)
    }
}

/// Ordered collection of stream tags.
///
/// Tags sharing an offset keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    /// Tags indexed by (offset, sequence) for stable ordering.
    tags: BTreeMap<(u64, u64), StreamTag>,
    seq: u64,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag at the given absolute sample offset.
    pub fn add(&mut self, offset: u64, key: impl Into<String>, value: TagValue) {
        self.add_tag(StreamTag::new(offset, key, value));
    }

    /// Add a pre-built tag.
    pub fn add_tag(&mut self, tag: StreamTag) {
        self.tags.insert((tag.offset, self.seq), tag);
        self.seq += 1;
    }

    /// All tags in `[start, end)`, in offset order.
    pub fn range(&self, start: u64, end: u64) -> Vec<&StreamTag> {
        if end <= start {
            return Vec::new();
        }
        self.tags
            .range((start, 0)..(end, 0))
            .map(|(_, tag)| tag)
            .collect()
    }

    /// Tags in `[start, end)` with the given key.
    pub fn range_key(&self, start: u64, end: u64, key: &str) -> Vec<&StreamTag> {
        self.range(start, end)
            .into_iter()
            .filter(|tag| tag.key == key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.seq = 0;
    }

    /// Drop every tag before `offset`.
    ///
    /// Hosts call this once a block has been consumed so the store does not
    /// grow without bound on long streams.
    pub fn trim_before(&mut self, offset: u64) {
        self.tags.retain(|&(off, _), _| off >= offset);
        if self.tags.is_empty() {
            self.seq = 0;
        }
    }
}

/// Well-known tag keys.
pub mod keys {
    /// Absolute reception time (`TagValue::Time`).
    pub const RX_TIME: &str = "rx_time";
    /// Sample rate in Hz (`TagValue::Float`).
    pub const RX_RATE: &str = "rx_rate";
}
