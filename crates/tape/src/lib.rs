//! A Family BASIC cassette signal codec library

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

mod reader;
mod wav;
mod writer;

use std::fmt::Display;
use std::io;

use serde::Deserialize;

pub use reader::TapeReader;
pub use wav::{PcmReader, PcmWriter, WavError};
pub use writer::TapeWriter;

/// Famicom CPU clock, the time base of the cassette interface.
pub const FAMICOM_CLOCK_HZ: u32 = 1_789_773;

/// Length of the balanced 1-run/0-run announcing an information block.
pub const INFORMATION_BLOCK_RUN: usize = 40;
/// Length of the balanced 1-run/0-run announcing a data block.
pub const DATA_BLOCK_RUN: usize = 20;

/// Demodulation and synthesis parameters of the cassette signal.
///
/// The defaults match a pristine Famicom Data Recorder recording.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TapeEncodingInfo {
    pub cycles_per_byte: u32,
    pub short_pulse_width: u32,
    pub long_pulse_width: u32,
    pub sync_min_pulse_count: usize,
    pub pulse_tolerance: f64,
}

impl Default for TapeEncodingInfo {
    fn default() -> Self {
        TapeEncodingInfo {
            cycles_per_byte: 45,
            short_pulse_width: 20,
            long_pulse_width: 40,
            sync_min_pulse_count: 5000,
            pulse_tolerance: 1.375,
        }
    }
}

impl TapeEncodingInfo {
    /// The tape symbol rate in Hz.
    pub fn tape_frequency(&self) -> f64 {
        f64::from(FAMICOM_CLOCK_HZ) / f64::from(self.cycles_per_byte)
    }

    /// Classifies one demodulated pulse (a full waveform cycle,
    /// `pulse_samples` PCM samples long) as a tape bit.
    pub fn classify_pulse(&self, pulse_samples: u64, sample_rate: u32) -> TapeBit {
        if pulse_samples == 0 {
            return TapeBit::Unknown;
        }

        let width = pulse_samples as f64 * self.tape_frequency() / f64::from(sample_rate);

        let matches = |target: u32| {
            let target = f64::from(target);
            width >= target / self.pulse_tolerance && width <= target * self.pulse_tolerance
        };

        if matches(self.short_pulse_width) {
            TapeBit::Zero
        } else if matches(self.long_pulse_width) {
            TapeBit::One
        } else {
            TapeBit::Unknown
        }
    }
}

/// One demodulated symbol.
///
/// `Unknown` is a pulse outside both tolerance bands.  It is skipped while
/// seeking block sync and is an error inside a framed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeBit {
    Zero,
    One,
    Unknown,
}

impl Display for TapeBit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TapeBit::Zero => write!(f, "0"),
            TapeBit::One => write!(f, "1"),
            TapeBit::Unknown => write!(f, "?"),
        }
    }
}

/// The two record kinds on tape, distinguished only by their sync run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Information,
    Data,
}

impl BlockType {
    pub fn sync_run(self) -> usize {
        match self {
            BlockType::Information => INFORMATION_BLOCK_RUN,
            BlockType::Data => DATA_BLOCK_RUN,
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::Information => write!(f, "information"),
            BlockType::Data => write!(f, "data"),
        }
    }
}

/// Sum of the population counts of every payload byte, truncated to 16 bits.
pub fn data_checksum(data: &[u8]) -> u16 {
    data.iter().fold(0u32, |ck, &b| ck + b.count_ones()) as u16
}

#[derive(Debug)]
pub enum TapeError {
    /// The PCM stream ran out mid-pulse.
    EndOfStream,
    /// A start or framing bit had the wrong value.
    FramingError { expected: TapeBit, actual: TapeBit },
    /// An unclassifiable pulse inside a framed byte.
    UnknownBit,
    /// The 1-run and 0-run of a block-type marker had different lengths.
    BlockTypeMismatch(usize, usize),
    /// A balanced run length that names no known block type.
    UnknownBlockType(usize),
    IoError(io::Error),
}

impl Display for TapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TapeError::EndOfStream => write!(f, "end of stream"),
            TapeError::FramingError { expected, actual } => {
                write!(f, "{} expected, {} actual", expected, actual)
            }
            TapeError::UnknownBit => write!(f, "bit read error"),
            TapeError::BlockTypeMismatch(first, second) => {
                write!(f, "bit count mismatch on block type ({} != {})", first, second)
            }
            TapeError::UnknownBlockType(count) => {
                write!(f, "could not recognize block type ({})", count)
            }
            TapeError::IoError(e) => e.fmt(f),
        }
    }
}

impl From<io::Error> for TapeError {
    fn from(e: io::Error) -> Self {
        Self::IoError(e)
    }
}
