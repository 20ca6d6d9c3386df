//! Doppler-correct a raw IQ recording using a precomputed Doppler table.
//!
//! # Usage Examples
//!
//! ## Correct a recording whose first sample is at a known epoch
//! ```bash
//! satdop --table pass.txt --sample-rate 48000 --t0 1714563000.0 \
//!     -i pass.cf32 -o corrected.cf32
//! ```
//!
//! ## Re-anchor time mid-recording (e.g. after a receiver overflow)
//! ```bash
//! satdop --table pass.txt --sample-rate 48000 --t0 1714563000.0 \
//!     --anchor 2880000:1714563060.125 -i pass.cf32 -o corrected.cf32
//! ```
//!
//! ## Pipe through stdin/stdout with a JSON config
//! ```bash
//! rtl_sdr -f 137.1M -s 1024000 - | satdop --config noaa19.json --format cu8 \
//!     -i - -o - --output-format cf32 | demod ...
//! ```

mod anchor;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing::{debug, info};

use satdop_core::file_source_sink::{IqFileFormat, IqReader, IqWriter};
use satdop_core::observe::{init_logging, LogConfig, LogFormat, LogLevel};
use satdop_core::stream_tags::{StreamTag, TagStore};
use satdop_core::{CorrectorConfig, DopplerCorrector};

#[derive(Parser, Debug)]
#[command(author, version, about = "Remove table-driven Doppler shift from raw IQ samples", long_about = None)]
struct Args {
    /// Doppler table file (`time_seconds frequency_hz` per record)
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(short, long)]
    sample_rate: Option<f64>,

    /// Absolute time of the first sample, in seconds
    #[arg(long, allow_hyphen_values = true)]
    t0: Option<f64>,

    /// JSON corrector config; explicit flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input IQ file, or "-" for stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Output IQ file, or "-" for stdout
    #[arg(short, long)]
    output: PathBuf,

    /// Input sample format (default: from extension, else cf32)
    #[arg(short, long, value_parser = parse_format)]
    format: Option<IqFileFormat>,

    /// Output sample format (default: from extension, else input format)
    #[arg(long, value_parser = parse_format)]
    output_format: Option<IqFileFormat>,

    /// Samples per processing block
    #[arg(long, default_value_t = 8192)]
    chunk_size: usize,

    /// Time anchor as SAMPLE_OFFSET:SECONDS[.FRACTION] (repeatable)
    #[arg(long = "anchor", value_parser = anchor::parse_anchor)]
    anchors: Vec<StreamTag>,

    /// Print a JSON metrics snapshot to stderr when done
    #[arg(long, default_value_t = false)]
    metrics: bool,

    /// Verbosity level (-v=info, -vv=debug, -vvv=trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log format: pretty, compact or json
    #[arg(long, default_value = "compact", value_parser = parse_log_format)]
    log_format: LogFormat,
}

fn parse_format(s: &str) -> Result<IqFileFormat, String> {
    IqFileFormat::from_name(&s.to_lowercase()).ok_or_else(|| {
        format!("unknown IQ format {s:?} (expected cf64, cf32, ci16, ci8 or cu8)")
    })
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    match s.to_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        "json" => Ok(LogFormat::Json),
        _ => Err(format!("unknown log format {s:?}")),
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Merge `--config` with explicit flags.
fn resolve_config(args: &Args) -> Result<CorrectorConfig> {
    let mut config = match &args.config {
        Some(path) => CorrectorConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let (Some(table), Some(sample_rate)) = (&args.table, args.sample_rate) else {
                bail!("--table and --sample-rate are required without --config");
            };
            CorrectorConfig::new(table, sample_rate, 0.0)
        }
    };
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    if let Some(t0) = args.t0 {
        config.t0 = t0;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_formats(args: &Args) -> (IqFileFormat, IqFileFormat) {
    let input = args
        .format
        .or_else(|| IqFileFormat::from_extension(&args.input))
        .unwrap_or(IqFileFormat::Cf32);
    let output = args
        .output_format
        .or_else(|| IqFileFormat::from_extension(&args.output))
        .unwrap_or(input);
    (input, output)
}

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if is_stdio(path) {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("opening input {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if is_stdio(path) {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(path).with_context(|| format!("creating output {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn run(args: &Args) -> Result<()> {
    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let config = resolve_config(args)?;
    let mut corrector = DopplerCorrector::from_config(&config)
        .with_context(|| format!("loading Doppler table {}", config.table.display()))?;
    let (start, end) = corrector.table().span();
    info!(
        table = %config.table.display(),
        entries = corrector.table().len(),
        start,
        end,
        sample_rate = config.sample_rate,
        t0 = config.t0,
        "Doppler table loaded"
    );

    let mut tags = TagStore::new();
    for tag in &args.anchors {
        tags.add_tag(tag.clone());
    }

    let (in_format, out_format) = resolve_formats(args);
    debug!(input = in_format.name(), output = out_format.name(), "sample formats");
    let mut reader = IqReader::new(open_input(&args.input)?, in_format);
    let mut writer = IqWriter::new(open_output(&args.output)?, out_format);

    loop {
        let block = reader.read(args.chunk_size).context("reading input samples")?;
        if block.is_empty() {
            break;
        }
        let corrected = corrector.process_tagged(&block, &tags);
        writer.write(&corrected).context("writing output samples")?;
        tags.trim_before(corrector.samples_processed());
    }
    writer.flush().context("flushing output")?;

    let snapshot = corrector.metrics().snapshot();
    info!(
        samples = snapshot.samples,
        anchors = snapshot.anchors,
        held = snapshot.held_before + snapshot.held_after,
        "correction complete"
    );
    if args.metrics {
        eprintln!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&LogConfig {
        level: LogLevel::from_verbosity(args.verbose),
        format: args.log_format,
        ..Default::default()
    });

    run(&args)
}
