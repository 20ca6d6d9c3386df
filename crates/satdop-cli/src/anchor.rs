//! `--anchor OFFSET:TIME` parsing.

use anyhow::{bail, Context, Result};
use satdop_core::stream_tags::{keys, StreamTag, TagValue};

/// Parse `OFFSET:SECONDS[.FRACTION]` into an `rx_time` tag.
///
/// Whole and fractional seconds are split textually so large epoch times
/// keep their sub-sample precision.
pub fn parse_anchor(s: &str) -> Result<StreamTag> {
    let (offset, time) = s
        .split_once(':')
        .with_context(|| format!("anchor {s:?} is not OFFSET:TIME"))?;
    let offset: u64 = offset
        .trim()
        .parse()
        .with_context(|| format!("invalid anchor sample offset {offset:?}"))?;

    let time = time.trim();
    let (whole, frac) = match time.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (time, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("anchor {s:?} has an empty time");
    }
    let seconds: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .with_context(|| format!("invalid anchor seconds {whole:?}"))?
    };
    let fraction: f64 = if frac.is_empty() {
        0.0
    } else {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            bail!("invalid anchor fraction {frac:?}");
        }
        format!("0.{frac}").parse()?
    };

    Ok(StreamTag::new(offset, keys::RX_TIME, TagValue::time(seconds, fraction)))
}
