//! A simple PCM wave file reader and writer

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Display;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// Cap on the decoded sample data (a one-hour 16-bit 48 kHz stereo tape).
const MAX_WAV_DATA_SIZE: usize = 1 << 30;

/// A `fmt ` chunk above this size is not a wave file.
const MAX_FMT_CHUNK_SIZE: u32 = 256;

const PCM_FORMAT_TAG: u16 = 1;

#[derive(Debug)]
pub enum WavError {
    NotAWaveFile,
    NotAPcmWaveFile,
    WaveFileTooLarge,
    NoSamples,
    NoChannels,
    UnsupportedBitDepth(u16),

    InvalidWaveFile,
    InvalidDataChunkSize,

    IoError(io::Error),
}

impl Display for WavError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WavError::NotAWaveFile => write!(f, "not a .wav file"),
            WavError::NotAPcmWaveFile => write!(f, "not a PCM (uncompressed) wave file"),
            WavError::WaveFileTooLarge => write!(f, "wave file is too large"),
            WavError::NoSamples => write!(f, "wave file is empty (no samples)"),
            WavError::NoChannels => write!(f, "wave file has no channels"),
            WavError::UnsupportedBitDepth(bits) => {
                write!(f, "unsupported bit depth: {} (expected 8 or 16)", bits)
            }

            WavError::InvalidWaveFile => write!(f, "invalid wave file"),
            WavError::InvalidDataChunkSize => {
                write!(f, "invalid wave file: invalid data chunk size")
            }

            WavError::IoError(io_error) => io_error.fmt(f),
        }
    }
}

impl From<io::Error> for WavError {
    fn from(e: io::Error) -> Self {
        Self::IoError(e)
    }
}

/// The `fmt ` chunk fields the tape codec needs.
#[derive(Debug, Clone, Copy)]
struct PcmFormat {
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
}

impl PcmFormat {
    /// Parses the 16-byte prefix every `fmt ` chunk revision shares and
    /// validates it against the formats the tape codec accepts.
    fn parse(chunk: &[u8]) -> Result<PcmFormat, WavError> {
        if chunk.len() < 16 {
            return Err(WavError::InvalidWaveFile);
        }
        let word = |o: usize| u16::from_le_bytes([chunk[o], chunk[o + 1]]);

        if word(0) != PCM_FORMAT_TAG {
            return Err(WavError::NotAPcmWaveFile);
        }

        let channels = word(2);
        if channels == 0 {
            return Err(WavError::NoChannels);
        }

        let bit_depth = word(14);
        if bit_depth != 8 && bit_depth != 16 {
            return Err(WavError::UnsupportedBitDepth(bit_depth));
        }

        Ok(PcmFormat {
            sample_rate: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            bit_depth,
            channels,
        })
    }

    fn frame_size(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bit_depth / 8)
    }
}

/// Reads the next `(id, size)` chunk header, or `None` at end of file.
///
/// A header truncated mid-way is an error, not an end of file.
fn next_chunk_header(reader: &mut impl Read) -> Result<Option<([u8; 4], u32)>, WavError> {
    let mut header = [0; 8];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..])? {
            0 if filled == 0 => return Ok(None),
            0 => return Err(WavError::InvalidWaveFile),
            n => filled += n,
        }
    }

    let id = [header[0], header[1], header[2], header[3]];
    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    Ok(Some((id, size)))
}

/// A decoded PCM wave file with a frame-by-frame sample interface.
///
/// Accepts 8-bit unsigned or 16-bit signed samples and any channel count.
/// Each fetched frame is the sum of all channels with the 8-bit midpoint
/// bias removed, so silence reads as zero in both formats.
pub struct PcmReader {
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data: Vec<u8>,
    pos: usize,
}

impl PcmReader {
    pub fn new(reader: &mut (impl Read + Seek)) -> Result<PcmReader, WavError> {
        let mut preamble = [0; 12];
        reader.read_exact(&mut preamble)?;
        if &preamble[0..4] != b"RIFF" || &preamble[8..12] != b"WAVE" {
            return Err(WavError::NotAWaveFile);
        }

        let mut format: Option<PcmFormat> = None;
        let mut data = Vec::new();

        while let Some((id, size)) = next_chunk_header(reader)? {
            match &id {
                b"fmt " => {
                    if format.is_some() || size > MAX_FMT_CHUNK_SIZE {
                        return Err(WavError::InvalidWaveFile);
                    }
                    let mut chunk = vec![0; size as usize];
                    reader.read_exact(&mut chunk)?;
                    format = Some(PcmFormat::parse(&chunk)?);
                }
                b"data" => {
                    // samples are meaningless without a preceding format
                    if format.is_none() {
                        return Err(WavError::InvalidWaveFile);
                    }
                    let size = usize::try_from(size).map_err(|_| WavError::WaveFileTooLarge)?;
                    if data.len().saturating_add(size) > MAX_WAV_DATA_SIZE {
                        return Err(WavError::WaveFileTooLarge);
                    }
                    let start = data.len();
                    data.resize(start + size, 0);
                    reader.read_exact(&mut data[start..])?;
                }
                _ => {
                    // metadata (LIST, id3, ...) is irrelevant here
                    reader.seek(SeekFrom::Current(i64::from(size)))?;
                }
            }

            // chunks are word aligned; an odd size carries a pad byte
            if size % 2 == 1 {
                reader.seek(SeekFrom::Current(1))?;
            }
        }

        let Some(format) = format else {
            return Err(WavError::InvalidWaveFile);
        };
        if data.is_empty() {
            return Err(WavError::NoSamples);
        }
        if data.len() % format.frame_size() != 0 {
            return Err(WavError::InvalidDataChunkSize);
        }

        Ok(PcmReader {
            sample_rate: format.sample_rate,
            bit_depth: format.bit_depth,
            channels: format.channels,
            data,
            pos: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Fetches the next frame, summed across channels and re-biased to
    /// signed.  Returns `None` at the end of the stream.
    pub fn next_frame(&mut self) -> Option<i32> {
        let channels = usize::from(self.channels);

        let mut sum = 0i32;
        match self.bit_depth {
            8 => {
                let frame = self.data.get(self.pos..self.pos + channels)?;
                for &s in frame {
                    sum += i32::from(s) - 128;
                }
                self.pos += channels;
            }
            _ => {
                let frame = self.data.get(self.pos..self.pos + channels * 2)?;
                for c in frame.chunks_exact(2) {
                    sum += i32::from(i16::from_le_bytes([c[0], c[1]]));
                }
                self.pos += channels * 2;
            }
        }
        Some(sum)
    }
}

/// An 8-bit unsigned mono PCM wave file writer.
///
/// The RIFF and data chunk sizes are written as placeholders and patched
/// by [`PcmWriter::finish`].
pub struct PcmWriter<W>
where
    W: Write + Seek,
{
    wr: W,
    sample_rate: u32,
    data_bytes: u64,
}

const WAV_HEADER_SIZE: u32 = 44;
const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;

impl<W> PcmWriter<W>
where
    W: Write + Seek,
{
    pub fn new(mut wr: W, sample_rate: u32) -> io::Result<PcmWriter<W>> {
        wr.write_all(b"RIFF")?;
        wr.write_all(&[0; 4])?;
        wr.write_all(b"WAVE")?;

        wr.write_all(b"fmt ")?;
        wr.write_all(&16u32.to_le_bytes())?;
        wr.write_all(&PCM_FORMAT_TAG.to_le_bytes())?;
        wr.write_all(&1u16.to_le_bytes())?; // channels
        wr.write_all(&sample_rate.to_le_bytes())?;
        wr.write_all(&sample_rate.to_le_bytes())?; // bytes per second
        wr.write_all(&1u16.to_le_bytes())?; // block align
        wr.write_all(&8u16.to_le_bytes())?; // bits per sample

        wr.write_all(b"data")?;
        wr.write_all(&[0; 4])?;

        Ok(PcmWriter {
            wr,
            sample_rate,
            data_bytes: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn write_sample(&mut self, sample: u8) -> io::Result<()> {
        self.wr.write_all(&[sample])?;
        self.data_bytes += 1;
        Ok(())
    }

    /// Patches the chunk sizes and returns the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        let data_size = u32::try_from(self.data_bytes)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "wave file is too large"))?;

        self.wr.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        self.wr
            .write_all(&(WAV_HEADER_SIZE - 8 + data_size).to_le_bytes())?;

        self.wr.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
        self.wr.write_all(&data_size.to_le_bytes())?;

        self.wr.seek(SeekFrom::End(0))?;
        self.wr.flush()?;
        Ok(self.wr)
    }
}
