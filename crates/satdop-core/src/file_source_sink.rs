//! Raw IQ Source/Sink
//!
//! Streaming reader and writer for headerless interleaved IQ recordings, the
//! format ground-station recorders and `file_sink` blocks produce. Samples
//! are little-endian I/Q pairs.
//!
//! | Format | Bytes/sample | Scaling                 |
//! |--------|--------------|-------------------------|
//! | `cf64` | 16           | none                    |
//! | `cf32` | 8            | none                    |
//! | `ci16` | 4            | ±32768 → ±1.0           |
//! | `ci8`  | 2            | ±128 → ±1.0             |
//! | `cu8`  | 2            | offset 128, ±128 → ±1.0 |
//!
//! ## Example
//!
//! ```rust
//! use satdop_core::file_source_sink::{IqReader, IqWriter, IqFileFormat};
//! use num_complex::Complex64;
//!
//! let samples = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, -0.5)];
//! let mut bytes = Vec::new();
//! let mut writer = IqWriter::new(&mut bytes, IqFileFormat::Cf32);
//! writer.write(&samples).unwrap();
//! writer.flush().unwrap();
//! drop(writer);
//!
//! let mut reader = IqReader::new(&bytes[..], IqFileFormat::Cf32);
//! let read_back = reader.read(16).unwrap();
//! assert_eq!(read_back, samples);
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

/// IQ sample format for raw files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IqFileFormat {
    /// Interleaved f64
    Cf64,
    /// Interleaved f32
    Cf32,
    /// Interleaved i16
    Ci16,
    /// Interleaved i8
    Ci8,
    /// Interleaved u8, DC at 128 (RTL-SDR)
    Cu8,
}

impl IqFileFormat {
    /// Bytes per complex sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Cf64 => 16,
            Self::Cf32 => 8,
            Self::Ci16 => 4,
            Self::Ci8 | Self::Cu8 => 2,
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::from_name(&ext)
    }

    /// Parse a format name or one of its common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cf64" | "fc64" => Some(Self::Cf64),
            "cf32" | "fc32" | "iq" | "raw" => Some(Self::Cf32),
            "ci16" | "sc16" | "cs16" => Some(Self::Ci16),
            "ci8" | "cs8" => Some(Self::Ci8),
            "cu8" => Some(Self::Cu8),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cf64 => "cf64",
            Self::Cf32 => "cf32",
            Self::Ci16 => "ci16",
            Self::Ci8 => "ci8",
            Self::Cu8 => "cu8",
        }
    }

    fn decode(&self, b: &[u8]) -> Complex64 {
        match self {
            Self::Cf64 => Complex64::new(
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
                f64::from_le_bytes([b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]]),
            ),
            Self::Cf32 => Complex64::new(
                f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
                f32::from_le_bytes([b[4], b[5], b[6], b[7]]) as f64,
            ),
            Self::Ci16 => Complex64::new(
                i16::from_le_bytes([b[0], b[1]]) as f64 / 32768.0,
                i16::from_le_bytes([b[2], b[3]]) as f64 / 32768.0,
            ),
            Self::Ci8 => Complex64::new(b[0] as i8 as f64 / 128.0, b[1] as i8 as f64 / 128.0),
            Self::Cu8 => Complex64::new(
                (b[0] as f64 - 128.0) / 128.0,
                (b[1] as f64 - 128.0) / 128.0,
            ),
        }
    }

    fn encode(&self, sample: Complex64, out: &mut Vec<u8>) {
        match self {
            Self::Cf64 => {
                out.extend_from_slice(&sample.re.to_le_bytes());
                out.extend_from_slice(&sample.im.to_le_bytes());
            }
            Self::Cf32 => {
                out.extend_from_slice(&(sample.re as f32).to_le_bytes());
                out.extend_from_slice(&(sample.im as f32).to_le_bytes());
            }
            Self::Ci16 => {
                let re = (sample.re * 32767.0).clamp(-32768.0, 32767.0) as i16;
                let im = (sample.im * 32767.0).clamp(-32768.0, 32767.0) as i16;
                out.extend_from_slice(&re.to_le_bytes());
                out.extend_from_slice(&im.to_le_bytes());
            }
            Self::Ci8 => {
                let re = (sample.re * 127.0).clamp(-128.0, 127.0) as i8;
                let im = (sample.im * 127.0).clamp(-128.0, 127.0) as i8;
                out.push(re as u8);
                out.push(im as u8);
            }
            Self::Cu8 => {
                out.push(((sample.re * 128.0) + 128.0).clamp(0.0, 255.0) as u8);
                out.push(((sample.im * 128.0) + 128.0).clamp(0.0, 255.0) as u8);
            }
        }
    }
}

/// Streaming IQ reader.
pub struct IqReader<R: Read> {
    reader: R,
    format: IqFileFormat,
    buf: Vec<u8>,
    samples_read: u64,
}

impl IqReader<BufReader<File>> {
    /// Open a file for reading.
    pub fn open(path: &Path, format: IqFileFormat) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?), format))
    }

    /// Open with the format detected from the extension.
    pub fn auto(path: &Path) -> io::Result<Self> {
        let format = IqFileFormat::from_extension(path)
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "unknown IQ file extension"))?;
        Self::open(path, format)
    }
}

impl<R: Read> IqReader<R> {
    pub fn new(reader: R, format: IqFileFormat) -> Self {
        Self {
            reader,
            format,
            buf: Vec::new(),
            samples_read: 0,
        }
    }

    /// Read up to `n` samples. Returns fewer only at end of input; an empty
    /// vector means the input is exhausted. A trailing partial sample is
    /// discarded.
    pub fn read(&mut self, n: usize) -> io::Result<Vec<Complex64>> {
        let bps = self.format.bytes_per_sample();
        self.buf.resize(n * bps, 0);

        let mut filled = 0;
        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(k) => filled += k,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let samples: Vec<Complex64> = self.buf[..filled]
            .chunks_exact(bps)
            .map(|b| self.format.decode(b))
            .collect();
        self.samples_read += samples.len() as u64;
        Ok(samples)
    }

    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }

    pub fn format(&self) -> IqFileFormat {
        self.format
    }
}

/// Streaming IQ writer.
pub struct IqWriter<W: Write> {
    writer: W,
    format: IqFileFormat,
    buf: Vec<u8>,
    samples_written: u64,
}

impl IqWriter<BufWriter<File>> {
    /// Create a file for writing (truncates existing).
    pub fn create(path: &Path, format: IqFileFormat) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?), format))
    }

    /// Create with the format detected from the extension.
    pub fn auto(path: &Path) -> io::Result<Self> {
        let format = IqFileFormat::from_extension(path)
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "unknown IQ file extension"))?;
        Self::create(path, format)
    }
}

impl<W: Write> IqWriter<W> {
    pub fn new(writer: W, format: IqFileFormat) -> Self {
        Self {
            writer,
            format,
            buf: Vec::new(),
            samples_written: 0,
        }
    }

    /// Write a block of samples.
    pub fn write(&mut self, samples: &[Complex64]) -> io::Result<()> {
        self.buf.clear();
        self.buf.reserve(samples.len() * self.format.bytes_per_sample());
        for &sample in samples {
            self.format.encode(sample, &mut self.buf);
        }
        self.writer.write_all(&self.buf)?;
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and drop.
    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn format(&self) -> IqFileFormat {
        self.format
    }
}
