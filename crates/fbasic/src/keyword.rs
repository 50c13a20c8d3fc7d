//! The tokenized BASIC keyword table

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

pub const REM: u8 = 0x95;
pub const DATA: u8 = 0x91;

/// Token ids `0x80..=0x85` take a line-number reference as their argument.
pub fn takes_line_number(id: u8) -> bool {
    matches!(id, 0x80..=0x85)
}

#[rustfmt::skip]
pub static KEYWORDS: &[(u8, &str)] = &[
    (0x80, "GOTO"),
    (0x81, "GOSUB"),
    (0x82, "RUN"),
    (0x83, "RETURN"),
    (0x84, "RESTORE"),
    (0x85, "THEN"),
    (0x86, "LIST"),
    (0x87, "SYSTEM"),
    (0x88, "TO"),
    (0x89, "STEP"),
    (0x8A, "SPRITE"),
    (0x8B, "PRINT"),
    (0x8C, "FOR"),
    (0x8D, "NEXT"),
    (0x8E, "PAUSE"),
    (0x8F, "INPUT"),
    (0x90, "LINPUT"),
    (0x91, "DATA"),
    (0x92, "IF"),
    (0x93, "READ"),
    (0x94, "DIM"),
    (0x95, "REM"),
    (0x96, "STOP"),
    (0x97, "CONT"),
    (0x98, "CLS"),
    (0x99, "CLEAR"),
    (0x9A, "ON"),
    (0x9B, "OFF"),
    (0x9C, "CUT"),
    (0x9D, "NEW"),
    (0x9E, "POKE"),
    (0x9F, "CGSET"),
    (0xA0, "VIEW"),
    (0xA1, "MOVE"),
    (0xA2, "END"),
    (0xA3, "PLAY"),
    (0xA4, "BEEP"),
    (0xA5, "LOAD"),
    (0xA6, "SAVE"),
    (0xA7, "POSITION"),
    (0xA8, "KEY"),
    (0xA9, "COLOR"),
    (0xAA, "DEF"),
    (0xAB, "CGEN"),
    (0xAC, "SWAP"),
    (0xAD, "CALL"),
    (0xAE, "LOCATE"),
    (0xAF, "PALET"),
    (0xB0, "ERA"),

    // Family Basic V3
    (0xB1, "TR"),
    (0xB2, "FIND"),
    (0xB3, "GAME"),
    (0xB4, "BGTOOL"),
    (0xB5, "AUTO"),
    (0xB6, "DELETE"),
    (0xB7, "RENUM"),
    (0xB8, "FILTER"),
    (0xB9, "CLICK"),
    (0xBA, "SCREEN"),
    (0xBB, "BACKUP"),
    (0xBC, "ERROR"),
    (0xBD, "RESUME"),
    (0xBE, "BGPUT"),
    (0xBF, "BGGET"),
    (0xC0, "CAN"),

    (0xCA, "ABS"),
    (0xCB, "ASC"),
    (0xCC, "STR$"),
    (0xCD, "FRE"),
    (0xCE, "LEN"),
    (0xCF, "PEEK"),
    (0xD0, "RND"),
    (0xD1, "SGN"),
    (0xD2, "SPC"),
    (0xD3, "TAB"),
    (0xD4, "MID$"),
    (0xD5, "STICK"),
    (0xD6, "STRIG"),
    (0xD7, "XPOS"),
    (0xD8, "YPOS"),
    (0xD9, "VAL"),
    (0xDA, "POS"),
    (0xDB, "CSRLIN"),
    (0xDC, "CHR$"),
    (0xDD, "HEX$"),
    (0xDE, "INKEY$"),
    (0xDF, "RIGHT$"),
    (0xE0, "LEFT$"),
    (0xE1, "SCR$"),

    // Family Basic V3
    (0xE2, "INSTR"),
    (0xE3, "CRASH"),
    (0xE4, "ERR"),
    (0xE5, "ERL"),
    (0xE6, "VCT"),

    (0xEF, "XOR"),
    (0xF0, "OR"),
    (0xF1, "AND"),
    (0xF2, "NOT"),
    (0xF3, "<>"),
    (0xF4, ">="),
    (0xF5, "<="),
    (0xF6, "="),
    (0xF7, ">"),
    (0xF8, "<"),
    (0xF9, "+"),
    (0xFA, "-"),
    (0xFB, "MOD"),
    (0xFC, "/"),
    (0xFD, "*"),
];

pub fn keyword_text(id: u8) -> Option<&'static str> {
    KEYWORDS.iter().find(|(k, _)| *k == id).map(|(_, v)| *v)
}

/// Finds the longest keyword that is a prefix of `s`.
pub fn match_keyword(s: &str) -> Option<(u8, usize)> {
    let mut best: Option<(u8, usize)> = None;
    for &(id, text) in KEYWORDS {
        if text.len() > best.map_or(0, |(_, len)| len) && s.starts_with(text) {
            best = Some((id, text.len()));
        }
    }
    best
}
