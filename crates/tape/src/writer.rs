//! Cassette signal synthesis

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io::{Seek, Write};

use crate::wav::PcmWriter;
use crate::{data_checksum, TapeBit, TapeEncodingInfo, TapeError};

const HIGH_LEVEL: u8 = 160;
const LOW_LEVEL: u8 = 96;
const SILENCE_LEVEL: u8 = 128;

/// Synthesizes pulses, bits, bytes and sync runs into an 8-bit mono PCM
/// wave file.
///
/// The fractional part of each half-cycle's sample count is carried over
/// to the next pulse so long pulse trains do not drift.  That residue is
/// per-writer state; a writer must not be shared.
pub struct TapeWriter<W>
where
    W: Write + Seek,
{
    pcm: PcmWriter<W>,
    enc: TapeEncodingInfo,
    residue: f64,
}

impl<W> TapeWriter<W>
where
    W: Write + Seek,
{
    pub fn new(writer: W, enc: TapeEncodingInfo, sample_rate: u32) -> std::io::Result<Self> {
        Ok(TapeWriter {
            pcm: PcmWriter::new(writer, sample_rate)?,
            enc,
            residue: 0.0,
        })
    }

    pub fn encoding(&self) -> &TapeEncodingInfo {
        &self.enc
    }

    pub fn write_silence(&mut self, seconds: f64) -> Result<(), TapeError> {
        let samples = (seconds * f64::from(self.pcm.sample_rate())) as u64;
        for _ in 0..samples {
            self.pcm.write_sample(SILENCE_LEVEL)?;
        }
        Ok(())
    }

    /// Emits one full square cycle for a pulse of `width` tape cycles.
    ///
    /// Each half-cycle is `width/2 · sample_rate / tape_frequency` samples,
    /// so a decoded cycle measures the width that was written.
    pub fn write_pulse(&mut self, width: u32) -> Result<(), TapeError> {
        let samples_f = self.residue
            + f64::from(width) / 2.0 * f64::from(self.pcm.sample_rate()) / self.enc.tape_frequency();
        let samples = samples_f as u64;
        self.residue = samples_f - samples as f64;

        for _ in 0..samples {
            self.pcm.write_sample(HIGH_LEVEL)?;
        }
        for _ in 0..samples {
            self.pcm.write_sample(LOW_LEVEL)?;
        }
        Ok(())
    }

    pub fn write_bit(&mut self, bit: TapeBit) -> Result<(), TapeError> {
        match bit {
            TapeBit::Zero => self.write_pulse(self.enc.short_pulse_width),
            TapeBit::One => self.write_pulse(self.enc.long_pulse_width),
            TapeBit::Unknown => Err(TapeError::UnknownBit),
        }
    }

    /// Writes one framed byte: a start bit of 1 then 8 data bits MSB-first.
    pub fn write_byte(&mut self, value: u8) -> Result<(), TapeError> {
        self.write_bit(TapeBit::One)?;
        for i in (0..8).rev() {
            if (value >> i) & 1 == 1 {
                self.write_bit(TapeBit::One)?;
            } else {
                self.write_bit(TapeBit::Zero)?;
            }
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), TapeError> {
        for &v in data {
            self.write_byte(v)?;
        }
        Ok(())
    }

    /// Writes the payload followed by its checksum word, high byte first.
    pub fn write_bytes_with_checksum(&mut self, data: &[u8]) -> Result<(), TapeError> {
        self.write_bytes(data)?;

        let checksum = data_checksum(data);
        self.write_byte((checksum >> 8) as u8)?;
        self.write_byte(checksum as u8)?;
        Ok(())
    }

    /// Writes a block introduction: the 0-bit leader followed by the
    /// balanced 1-run/0-run of `type_run` pulses each.
    pub fn write_sync_run(&mut self, type_run: usize) -> Result<(), TapeError> {
        for _ in 0..self.enc.sync_min_pulse_count * 2 {
            self.write_bit(TapeBit::Zero)?;
        }
        for _ in 0..type_run {
            self.write_bit(TapeBit::One)?;
        }
        for _ in 0..type_run {
            self.write_bit(TapeBit::Zero)?;
        }
        Ok(())
    }

    /// Finalizes the wave file and returns the underlying writer.
    pub fn finish(self) -> std::io::Result<W> {
        self.pcm.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pulse_writer(sample_rate: u32) -> TapeWriter<Cursor<Vec<u8>>> {
        TapeWriter::new(Cursor::new(Vec::new()), TapeEncodingInfo::default(), sample_rate).unwrap()
    }

    #[test]
    fn residue_prevents_drift() {
        // One short half-cycle at 32 kHz is 10 * 32000 / 39772.73 = 8.0457
        // samples.  Truncation with residue carry must total the floor of
        // the exact accumulated value.
        let mut w = pulse_writer(32000);
        for _ in 0..100 {
            w.write_bit(TapeBit::Zero).unwrap();
        }
        let wav = w.finish().unwrap().into_inner();

        let half = 10.0 * 32000.0 / (1_789_773.0 / 45.0);
        let expected = (100.0 * half) as u64;
        assert_eq!(wav.len() as u64 - 44, expected * 2);
    }

    #[test]
    fn pulse_is_high_then_low() {
        let mut w = pulse_writer(32000);
        w.write_bit(TapeBit::Zero).unwrap();
        let wav = w.finish().unwrap().into_inner();

        let samples = &wav[44..];
        assert_eq!(samples.len(), 16);
        assert!(samples[..8].iter().all(|&s| s == HIGH_LEVEL));
        assert!(samples[8..].iter().all(|&s| s == LOW_LEVEL));
    }

    #[test]
    fn silence_is_midpoint() {
        let mut w = pulse_writer(32000);
        w.write_silence(0.25).unwrap();
        let wav = w.finish().unwrap().into_inner();

        let samples = &wav[44..];
        assert_eq!(samples.len(), 8000);
        assert!(samples.iter().all(|&s| s == SILENCE_LEVEL));
    }

    #[test]
    fn unknown_bit_is_rejected() {
        let mut w = pulse_writer(32000);
        assert!(matches!(
            w.write_bit(TapeBit::Unknown),
            Err(TapeError::UnknownBit)
        ));
    }
}
