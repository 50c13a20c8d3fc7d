//! Cassette signal demodulation

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io::{Read, Seek};

use crate::wav::{PcmReader, WavError};
use crate::{
    BlockType, TapeBit, TapeEncodingInfo, TapeError, DATA_BLOCK_RUN, INFORMATION_BLOCK_RUN,
};

/// The block synchronizer's three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// Seeking a long enough run of 0-bits.
    Seeking,
    /// Counting the 1-run of the block-type marker.
    CountingOnes,
    /// Counting the 0-run of the block-type marker.
    CountingZeros,
}

/// Demodulates a PCM recording into pulses, bits, bytes and blocks.
///
/// One pulse is a full waveform cycle, measured in samples between two
/// zero crossings of the same direction.
pub struct TapeReader {
    pcm: PcmReader,
    enc: TapeEncodingInfo,
    pushed_back: Option<TapeBit>,
}

impl TapeReader {
    pub fn new(
        reader: &mut (impl Read + Seek),
        enc: TapeEncodingInfo,
    ) -> Result<TapeReader, WavError> {
        Ok(TapeReader {
            pcm: PcmReader::new(reader)?,
            enc,
            pushed_back: None,
        })
    }

    pub fn encoding(&self) -> &TapeEncodingInfo {
        &self.enc
    }

    /// Measures the next pulse in samples.
    ///
    /// The first frame only initializes the previous-sample state and is
    /// never counted as a crossing.
    fn next_pulse(&mut self) -> Result<u64, TapeError> {
        let mut samples = 0u64;
        let mut crossings = 0u32;
        let mut prev: Option<i32> = None;

        loop {
            let sample = match self.pcm.next_frame() {
                Some(s) => s,
                None => return Err(TapeError::EndOfStream),
            };
            samples += 1;

            if let Some(prev) = prev {
                if (prev < 0) != (sample < 0) {
                    crossings += 1;
                }
            }
            if crossings >= 2 {
                return Ok(samples);
            }

            prev = Some(sample);
        }
    }

    /// Puts one bit back so the next [`TapeReader::next_bit`] returns it.
    ///
    /// The slot holds a single bit; it must be empty.
    pub fn rewind_bit(&mut self, bit: TapeBit) {
        debug_assert!(self.pushed_back.is_none(), "rewind slot already occupied");
        self.pushed_back = Some(bit);
    }

    pub fn next_bit(&mut self) -> Result<TapeBit, TapeError> {
        if let Some(bit) = self.pushed_back.take() {
            return Ok(bit);
        }
        let pulse = self.next_pulse()?;
        Ok(self.enc.classify_pulse(pulse, self.pcm.sample_rate()))
    }

    pub fn verify_bit(&mut self, expected: TapeBit) -> Result<(), TapeError> {
        let actual = self.next_bit()?;
        if actual != expected {
            return Err(TapeError::FramingError { expected, actual });
        }
        Ok(())
    }

    /// Reads one framed byte: a start bit of 1 then 8 data bits MSB-first.
    pub fn next_byte(&mut self) -> Result<u8, TapeError> {
        self.verify_bit(TapeBit::One)?;

        let mut value = 0u8;
        for i in (0..8).rev() {
            match self.next_bit()? {
                TapeBit::Zero => {}
                TapeBit::One => value |= 1 << i,
                TapeBit::Unknown => return Err(TapeError::UnknownBit),
            }
        }
        Ok(value)
    }

    /// Reads the 16-bit checksum word, high byte first.
    fn next_checksum_word(&mut self) -> Result<u16, TapeError> {
        let high = self.next_byte()?;
        let low = self.next_byte()?;
        Ok(u16::from(low) | (u16::from(high) << 8))
    }

    pub fn next_bytes(&mut self, len: usize) -> Result<Vec<u8>, TapeError> {
        let mut buffer = Vec::with_capacity(len);
        for _ in 0..len {
            buffer.push(self.next_byte()?);
        }
        Ok(buffer)
    }

    /// Reads `len` payload bytes followed by the stored checksum word.
    ///
    /// The stored checksum is returned unverified; comparing it against
    /// [`data_checksum`](crate::data_checksum) is the caller's concern.
    pub fn next_bytes_with_checksum(&mut self, len: usize) -> Result<(Vec<u8>, u16), TapeError> {
        let data = self.next_bytes(len)?;
        let checksum = self.next_checksum_word()?;
        Ok((data, checksum))
    }

    /// Seeks forward to the next block and identifies its type.
    ///
    /// A block is introduced by at least `sync_min_pulse_count` 0-bits
    /// followed by a balanced 1-run/0-run whose length encodes the block
    /// type.  Unknown bits are skipped.  The bit that ends the 0-run (the
    /// start bit of the first byte) is pushed back for the caller.
    pub fn sync_to_block(&mut self) -> Result<BlockType, TapeError> {
        let mut state = SyncState::Seeking;
        let mut current = TapeBit::Unknown;
        let mut run_len = 0usize;
        let mut first = 0usize;

        loop {
            let bit = self.next_bit()?;
            if bit == TapeBit::Unknown {
                continue;
            }

            if bit == current {
                run_len += 1;
                continue;
            }
            self.rewind_bit(bit);

            match state {
                SyncState::Seeking => {
                    if current == TapeBit::Zero && run_len >= self.enc.sync_min_pulse_count {
                        state = SyncState::CountingOnes;
                    }
                }
                SyncState::CountingOnes => {
                    first = run_len;
                    state = SyncState::CountingZeros;
                }
                SyncState::CountingZeros => {
                    let second = run_len;
                    return if first != second {
                        Err(TapeError::BlockTypeMismatch(first, second))
                    } else if first == INFORMATION_BLOCK_RUN {
                        Ok(BlockType::Information)
                    } else if first == DATA_BLOCK_RUN {
                        Ok(BlockType::Data)
                    } else {
                        Err(TapeError::UnknownBlockType(first))
                    };
                }
            }

            run_len = 0;
            current = bit;
        }
    }
}
