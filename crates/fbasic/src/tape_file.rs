//! Assembling tape files from information and data blocks

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Display;
use std::io::{Seek, Write};

use tape::{data_checksum, BlockType, TapeBit, TapeError, TapeReader, TapeWriter};

use crate::data::{FileInfo, TapeFile, FILE_INFO_SIZE};
use crate::errors::FileReadError;

/// Silence written before and after a recording.
pub const SILENCE_PADDING_SECONDS: f64 = 0.25;

/// A stored checksum that does not match the payload.
///
/// Reported as a warning so degraded tapes can still be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumMismatch {
    pub block: BlockType,
    pub stored: u16,
    pub computed: u16,
}

impl Display for ChecksumMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "block {} has invalid checksum {} != {}",
            self.block, self.stored, self.computed
        )
    }
}

/// One tape file decoded from the stream, with any checksum warnings.
#[derive(Debug)]
pub struct DecodedFile {
    pub file: TapeFile,
    pub warnings: Vec<ChecksumMismatch>,
}

fn check_checksum(
    data: &[u8],
    block: BlockType,
    stored: u16,
    warnings: &mut Vec<ChecksumMismatch>,
) {
    let computed = data_checksum(data);
    if computed != stored {
        warnings.push(ChecksumMismatch {
            block,
            stored,
            computed,
        });
    }
}

/// Reads the next file from the tape: an information block holding the
/// 128-byte header, then a data block holding `length` payload bytes.
///
/// The trailing framing bit of the data block is not verified; the final
/// block of a recording may omit it.
pub fn read_file(reader: &mut TapeReader) -> Result<DecodedFile, FileReadError> {
    let mut warnings = Vec::new();

    let block_type = reader.sync_to_block().map_err(FileReadError::Sync)?;
    if block_type != BlockType::Information {
        return Err(FileReadError::UnexpectedBlockType(BlockType::Information));
    }

    reader
        .verify_bit(TapeBit::One)
        .map_err(FileReadError::Prelude)?;

    let (header, stored) = reader
        .next_bytes_with_checksum(FILE_INFO_SIZE)
        .map_err(FileReadError::Read)?;
    check_checksum(&header, BlockType::Information, stored, &mut warnings);

    reader
        .verify_bit(TapeBit::One)
        .map_err(FileReadError::Postlude)?;

    let info = FileInfo::from_bytes(&header).map_err(FileReadError::Header)?;

    let block_type = reader.sync_to_block().map_err(FileReadError::Sync)?;
    if block_type != BlockType::Data {
        return Err(FileReadError::UnexpectedBlockType(BlockType::Data));
    }

    reader
        .verify_bit(TapeBit::One)
        .map_err(FileReadError::Prelude)?;

    let (data, stored) = reader
        .next_bytes_with_checksum(usize::from(info.length))
        .map_err(FileReadError::Read)?;
    check_checksum(&data, BlockType::Data, stored, &mut warnings);

    Ok(DecodedFile {
        file: TapeFile { info, data },
        warnings,
    })
}

/// Writes one tape file: both blocks with their sync runs, framing bits
/// and checksums.
pub fn write_file<W>(writer: &mut TapeWriter<W>, file: &TapeFile) -> Result<(), TapeError>
where
    W: Write + Seek,
{
    writer.write_sync_run(BlockType::Information.sync_run())?;
    writer.write_bit(TapeBit::One)?;
    writer.write_bytes_with_checksum(&file.info.to_bytes())?;
    writer.write_bit(TapeBit::One)?;

    writer.write_sync_run(BlockType::Data.sync_run())?;
    writer.write_bit(TapeBit::One)?;
    writer.write_bytes_with_checksum(&file.data)?;
    writer.write_bit(TapeBit::One)?;

    Ok(())
}

/// Writes a complete recording: silence, every file in order, silence.
pub fn write_recording<W>(writer: &mut TapeWriter<W>, files: &[TapeFile]) -> Result<(), TapeError>
where
    W: Write + Seek,
{
    writer.write_silence(SILENCE_PADDING_SECONDS)?;
    for file in files {
        write_file(writer, file)?;
    }
    writer.write_silence(SILENCE_PADDING_SECONDS)?;
    Ok(())
}
