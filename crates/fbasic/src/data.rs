//! The 128-byte tape file header

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tape::TapeEncodingInfo;

use crate::charmap;
use crate::errors::{CharmapError, DeserializeError, HeaderError};

pub const FILE_INFO_SIZE: usize = 128;

const NAME_SIZE: usize = 16;
const PAD_SIZE: usize = 104;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Basic,
    BgGraphics,
}

impl FileType {
    pub fn from_u8(v: u8) -> Result<FileType, HeaderError> {
        match v {
            2 => Ok(FileType::Basic),
            3 => Ok(FileType::BgGraphics),
            _ => Err(HeaderError::UnknownFileType(v)),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FileType::Basic => 2,
            FileType::BgGraphics => 3,
        }
    }

    /// The on-disk extension used when writing decoded files.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Basic => "prg",
            FileType::BgGraphics => "gfx",
        }
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Basic => write!(f, "BASIC"),
            FileType::BgGraphics => write!(f, "BG-GRAPHICS"),
        }
    }
}

/// The information block payload, round-tripped byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub file_type: FileType,
    pub name: [u8; NAME_SIZE],
    pub reserved: u8,
    pub length: u16,
    pub load_address: u16,
    pub execution_address: u16,
    pub padding: [u8; PAD_SIZE],
}

impl FileInfo {
    pub fn new(file_type: FileType) -> FileInfo {
        FileInfo {
            file_type,
            name: [0; NAME_SIZE],
            reserved: 0,
            length: 0,
            load_address: 0,
            execution_address: 0,
            padding: [0; PAD_SIZE],
        }
    }

    pub fn from_bytes(buf: &[u8]) -> Result<FileInfo, HeaderError> {
        if buf.len() < FILE_INFO_SIZE {
            return Err(HeaderError::BufferTooSmall(buf.len()));
        }

        let mut info = FileInfo::new(FileType::from_u8(buf[0])?);
        info.name.copy_from_slice(&buf[1..17]);
        info.reserved = buf[17];
        info.length = u16::from_le_bytes([buf[18], buf[19]]);
        info.load_address = u16::from_le_bytes([buf[20], buf[21]]);
        info.execution_address = u16::from_le_bytes([buf[22], buf[23]]);
        info.padding.copy_from_slice(&buf[24..128]);

        Ok(info)
    }

    pub fn to_bytes(&self) -> [u8; FILE_INFO_SIZE] {
        let mut buf = [0; FILE_INFO_SIZE];
        buf[0] = self.file_type.as_u8();
        buf[1..17].copy_from_slice(&self.name);
        buf[17] = self.reserved;
        buf[18..20].copy_from_slice(&self.length.to_le_bytes());
        buf[20..22].copy_from_slice(&self.load_address.to_le_bytes());
        buf[22..24].copy_from_slice(&self.execution_address.to_le_bytes());
        buf[24..128].copy_from_slice(&self.padding);
        buf
    }

    /// The file name rendered as text, stopping at the first NUL.
    pub fn name_string(&self) -> String {
        let mut s = String::new();
        for &c in &self.name {
            if c == 0 {
                break;
            }
            s.push_str(&charmap::byte_to_string(c));
        }
        s
    }

    /// Encodes `name` (uppercased) into the name field, truncated to 16
    /// bytes and NUL-terminated when shorter.
    pub fn set_name(&mut self, name: &str) -> Result<(), CharmapError> {
        let encoded = charmap::encode(&name.to_uppercase())?;

        self.name = [0; NAME_SIZE];
        let len = encoded.len().min(NAME_SIZE);
        self.name[..len].copy_from_slice(&encoded[..len]);
        Ok(())
    }
}

/// One tape file: a decoded header and exactly `info.length` payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeFile {
    pub info: FileInfo,
    pub data: Vec<u8>,
}

/// Loads a `TapeEncodingInfo` override from a JSON profile file.
///
/// Missing fields keep their defaults.
pub fn load_encoding_profile(path: &Path) -> Result<TapeEncodingInfo, DeserializeError> {
    let file_name = path.display().to_string();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(DeserializeError::OpenError(file_name, e)),
    };

    match serde_json::from_reader(BufReader::new(file)) {
        Ok(enc) => Ok(enc),
        Err(e) => Err(DeserializeError::SerdeError(file_name, e)),
    }
}
