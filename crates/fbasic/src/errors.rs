//! A single location for all of the errors in the file formats

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Display;
use std::io;

use tape::{BlockType, TapeError};

#[derive(Debug)]
pub enum CharmapError {
    /// No character-set entry matches a prefix of the text.
    UnmappableText(String),
}

#[derive(Debug)]
pub enum HeaderError {
    BufferTooSmall(usize),
    UnknownFileType(u8),
}

#[derive(Debug)]
pub enum FileReadError {
    Sync(TapeError),
    UnexpectedBlockType(BlockType),
    Prelude(TapeError),
    Read(TapeError),
    Postlude(TapeError),
    Header(HeaderError),
}

#[derive(Debug)]
pub enum BasicError {
    /// The tokenizer made no progress on a line.
    Stuck { line_number: u16, rest: String },
    /// A byte no tokenizer rule accepts.
    CannotParse { line_number: u16, rest: String },
    /// A numeric literal that does not fit in 16 bits.
    ValueOutOfRange(u32),
    CannotParseNumber(String),
    /// A tokenized line record longer than the one-byte length field allows.
    LineTooLong { line_number: u16, len: usize },
    /// A line record length below the three-byte prefix.
    InvalidLineLength(u8),
    Charmap(CharmapError),
    IoError(io::Error),
}

/// Non-fatal conditions found while detokenizing; the affected line is
/// skipped and the rest of the program is decoded.
#[derive(Debug)]
pub enum BasicWarning {
    UnknownToken {
        line_number: u16,
        token: u8,
        rest: String,
    },
    TruncatedLiteral {
        line_number: u16,
    },
}

#[derive(Debug)]
pub enum DeserializeError {
    OpenError(String, io::Error),
    SerdeError(String, serde_json::Error),
}

impl From<CharmapError> for BasicError {
    fn from(e: CharmapError) -> Self {
        Self::Charmap(e)
    }
}

impl From<io::Error> for BasicError {
    fn from(e: io::Error) -> Self {
        Self::IoError(e)
    }
}

// Display
// =======

impl Display for CharmapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmappableText(s) => write!(f, "no character mapping for '{}'", s),
        }
    }
}

impl Display for HeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferTooSmall(len) => write!(f, "header buffer too small: {} < 128", len),
            Self::UnknownFileType(t) => write!(f, "unknown file type: {}", t),
        }
    }
}

impl Display for FileReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(e) => write!(f, "block sync error: {}", e),
            Self::UnexpectedBlockType(expected) => {
                write!(f, "invalid block type (expected {})", expected)
            }
            Self::Prelude(e) => write!(f, "block prelude error: {}", e),
            Self::Read(e) => write!(f, "block read error: {}", e),
            Self::Postlude(e) => write!(f, "block postlude error: {}", e),
            Self::Header(e) => write!(f, "file header error: {}", e),
        }
    }
}

impl Display for BasicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stuck { line_number, rest } => {
                write!(f, "cannot parse line {} beyond '{}' (stuck)", line_number, rest)
            }
            Self::CannotParse { line_number, rest } => {
                write!(f, "cannot parse line {} beyond '{}'", line_number, rest)
            }
            Self::ValueOutOfRange(v) => write!(f, "value out of range: {}", v),
            Self::CannotParseNumber(s) => write!(f, "cannot parse number '{}'", s),
            Self::LineTooLong { line_number, len } => {
                write!(f, "line {} too long ({} bytes)", line_number, len)
            }
            Self::InvalidLineLength(len) => write!(f, "invalid line record length: {}", len),
            Self::Charmap(e) => e.fmt(f),
            Self::IoError(e) => e.fmt(f),
        }
    }
}

impl Display for BasicWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownToken {
                line_number,
                token,
                rest,
            } => {
                write!(
                    f,
                    "skipping line {}, unknown token 0x{:02X} ({})",
                    line_number, token, rest
                )
            }
            Self::TruncatedLiteral { line_number } => {
                write!(f, "skipping line {}, truncated literal", line_number)
            }
        }
    }
}

impl Display for DeserializeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenError(filename, e) => write!(f, "Unable to open {}: {}", filename, e),
            Self::SerdeError(filename, e) => write!(f, "Unable to read {}: {}", filename, e),
        }
    }
}
