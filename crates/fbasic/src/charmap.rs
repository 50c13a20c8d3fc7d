//! The Family BASIC character set

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::CharmapError;

/// Glyphs for bytes `0x5B..=0xB6`, in byte order.
const HIGH_GLYPHS: &str = "「￥」^_アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワンヲァィゥェォャュョッガギグゲゴザジズゼゾダヂヅデドバビブベボパピプペポ□▫[]Ⓒ×÷";

const FIRST_GLYPH: u8 = 0x5B;
const LAST_GLYPH: u8 = 0xB6;

/// Renders one character-set byte as text.
///
/// Bytes `0x20..=0x5A` are ASCII, `0x5B..=0xB6` are katakana and symbol
/// glyphs, and the remainder render as `\A0`-style escapes (`A..D` for the
/// control block, `E..M` for the high block).  `0xB7` has no glyph and is
/// the literal string `\xB7`.
pub fn byte_to_string(b: u8) -> String {
    match b {
        0x00..=0x1F => format!("\\{}{}", (b'A' + (b >> 3)) as char, b & 7),
        0x20..=0x5A => (b as char).to_string(),
        FIRST_GLYPH..=LAST_GLYPH => {
            let i = usize::from(b - FIRST_GLYPH);
            HIGH_GLYPHS.chars().nth(i).unwrap().to_string()
        }
        0xB7 => "\\xB7".to_string(),
        0xB8..=0xFF => format!("\\{}{}", (b'E' + ((b - 0xB8) >> 3)) as char, b & 7),
    }
}

struct ReverseTable {
    map: HashMap<String, u8>,
    max_len: usize,
}

fn reverse_table() -> &'static ReverseTable {
    static TABLE: OnceLock<ReverseTable> = OnceLock::new();

    TABLE.get_or_init(|| {
        let mut map = HashMap::new();
        let mut max_len = 0;
        for b in 0..=0xFF {
            let s = byte_to_string(b);
            max_len = max_len.max(s.len());
            map.insert(s, b);
        }
        ReverseTable { map, max_len }
    })
}

/// Encodes text into character-set bytes, longest matching prefix first.
pub fn encode(s: &str) -> Result<Vec<u8>, CharmapError> {
    let table = reverse_table();
    let mut buf = Vec::new();
    let mut rest = s;

    'next: while !rest.is_empty() {
        let max_len = table.max_len.min(rest.len());
        for len in (1..=max_len).rev() {
            if !rest.is_char_boundary(len) {
                continue;
            }
            if let Some(&b) = table.map.get(&rest[..len]) {
                buf.push(b);
                rest = &rest[len..];
                continue 'next;
            }
        }
        return Err(CharmapError::UnmappableText(rest.to_string()));
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_glyph_pins() {
        assert_eq!(byte_to_string(0x20), " ");
        assert_eq!(byte_to_string(0x41), "A");
        assert_eq!(byte_to_string(0x5A), "Z");
        assert_eq!(byte_to_string(0x5B), "「");
        assert_eq!(byte_to_string(0x5C), "￥");
        assert_eq!(byte_to_string(0x60), "ア");
        assert_eq!(byte_to_string(0xB6), "÷");
    }

    #[test]
    fn escape_pins() {
        assert_eq!(byte_to_string(0x00), "\\A0");
        assert_eq!(byte_to_string(0x07), "\\A7");
        assert_eq!(byte_to_string(0x1F), "\\D7");
        assert_eq!(byte_to_string(0xB7), "\\xB7");
        assert_eq!(byte_to_string(0xB8), "\\E0");
        assert_eq!(byte_to_string(0xBF), "\\E7");
        assert_eq!(byte_to_string(0xFF), "\\M7");
    }

    #[test]
    fn every_byte_round_trips() {
        for b in 0..=0xFF {
            let s = byte_to_string(b);
            assert_eq!(encode(&s).unwrap(), vec![b], "byte 0x{:02X} ({})", b, s);
        }
    }

    #[test]
    fn encode_mixed_text() {
        assert_eq!(
            encode("HELLO アイ\\E0").unwrap(),
            vec![0x48, 0x45, 0x4C, 0x4C, 0x4F, 0x20, 0x60, 0x61, 0xB8]
        );
    }

    #[test]
    fn encode_rejects_unmappable_text() {
        assert!(matches!(
            encode("abc"),
            Err(CharmapError::UnmappableText(_))
        ));
    }
}
