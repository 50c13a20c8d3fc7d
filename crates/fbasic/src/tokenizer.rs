//! Text to tokenized BASIC program

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::charmap;
use crate::errors::BasicError;
use crate::keyword;

// One line record is `length, line_no_lo, line_no_hi, payload..` with the
// length byte covering itself, so the tokenized payload (terminating 0
// included) must stay below 253 bytes.
const MAX_LINE_PAYLOAD: usize = 253;

/// Tokenizes a textual BASIC program.
///
/// Lines without a `number body` shape are skipped.  Keywords are matched
/// longest-prefix-first; `REM`, `DATA` and `'` dump the rest of the line
/// as raw character-set bytes, `"` copies through the closing quote.
pub fn text_to_program(text: &str) -> Result<Vec<u8>, BasicError> {
    let mut out = Vec::new();

    for line in text.replace("\r\n", "\n").split('\n') {
        let Some((number, body)) = line.split_once(' ') else {
            continue;
        };
        let Ok(line_number) = number.parse::<u16>() else {
            continue;
        };

        let line_buf = tokenize_line(body, line_number)?;
        if line_buf.len() >= MAX_LINE_PAYLOAD {
            return Err(BasicError::LineTooLong {
                line_number,
                len: line_buf.len(),
            });
        }

        out.push((line_buf.len() + 3) as u8);
        out.extend_from_slice(&line_number.to_le_bytes());
        out.extend_from_slice(&line_buf);
    }
    out.push(0x00);

    Ok(out)
}

fn tokenize_line(body: &str, line_number: u16) -> Result<Vec<u8>, BasicError> {
    let mut buf = Vec::new();
    let mut s = body;

    let mut reading_line_numbers = false;
    let mut curr_alpha = false;
    let mut prev_len = usize::MAX;

    while !s.is_empty() {
        let matched_keyword = keyword::match_keyword(s);

        if s.len() == prev_len {
            return Err(BasicError::Stuck {
                line_number,
                rest: s.to_string(),
            });
        }
        prev_len = s.len();

        let last_alpha = curr_alpha;
        curr_alpha = false;

        let b = s.as_bytes();
        if b[0] == 0x20 {
            // skip spaces early (so "GOTO"<space>"line number" works)
            buf.push(0x20);
            s = &s[1..];
            continue;
        }

        if let Some((id, len)) = matched_keyword {
            buf.push(id);
            s = &s[len..];
            if id == keyword::REM || id == keyword::DATA {
                // comment
                buf.extend(charmap::encode(s)?);
                break;
            }
            reading_line_numbers = keyword::takes_line_number(id);
        } else if b[0] == b'\'' {
            // comment
            buf.extend(charmap::encode(s)?);
            break;
        } else if b[0] == b'"' {
            // string
            buf.push(b'"');
            s = &s[1..];
            match s.find('"') {
                None => {
                    buf.extend(charmap::encode(s)?);
                    break;
                }
                Some(pos) => {
                    buf.extend(charmap::encode(&s[..=pos])?);
                    s = &s[pos + 1..];
                }
            }
        } else if !last_alpha
            && (b[0].is_ascii_digit() || (b.len() >= 2 && b[0] == b'-' && b[1].is_ascii_digit()))
        {
            // digits
            let mut x = 0;
            if b[0] == b'-' {
                // negative value marker
                buf.push(0xFA);
                x += 1;
            }
            let x_start = x;
            while x < b.len() && b[x].is_ascii_digit() {
                x += 1;
            }
            let digits = &s[x_start..x];
            let v: u32 = digits
                .parse()
                .map_err(|_| BasicError::CannotParseNumber(digits.to_string()))?;
            if v >= 65536 {
                return Err(BasicError::ValueOutOfRange(v));
            }

            if reading_line_numbers {
                // line number
                buf.push(0x0B);
                buf.extend_from_slice(&(v as u16).to_le_bytes());
            } else if v >= 10 || v == 0 {
                // long constant number (0 is stored long, as the cartridge
                // writes it)
                buf.push(0x12);
                buf.extend_from_slice(&(v as u16).to_le_bytes());
            } else {
                // short constant number
                buf.push((v + 1) as u8);
            }
            s = &s[x..];
        } else if b.len() >= 2 && b[0] == b'&' && b[1] == b'H' {
            // hex number
            let mut x = 2;
            let x_start = x;
            while x < b.len() && (b[x].is_ascii_digit() || (b'A'..=b'F').contains(&b[x])) {
                x += 1;
            }
            let digits = &s[x_start..x];
            let v = u32::from_str_radix(digits, 16)
                .map_err(|_| BasicError::CannotParseNumber(digits.to_string()))?;
            if v >= 65536 {
                return Err(BasicError::ValueOutOfRange(v));
            }

            buf.push(0x11);
            buf.extend_from_slice(&(v as u16).to_le_bytes());
            s = &s[x..];
        } else if (0x21..=0x5B).contains(&b[0]) {
            // other character
            buf.push(b[0]);
            if b[0] != b',' {
                reading_line_numbers = false;
            }
            if (0x41..=0x5B).contains(&b[0]) {
                curr_alpha = true;
            }
            s = &s[1..];
        } else {
            return Err(BasicError::CannotParse {
                line_number,
                rest: s.to_string(),
            });
        }
    }
    buf.push(0x00);

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_literal() {
        assert_eq!(
            text_to_program("1 PRINT 5").unwrap(),
            vec![0x07, 0x01, 0x00, 0x8B, 0x20, 0x06, 0x00, 0x00]
        );
    }

    #[test]
    fn zero_literal_is_long_form() {
        assert_eq!(
            text_to_program("1 PRINT 0").unwrap(),
            vec![0x09, 0x01, 0x00, 0x8B, 0x20, 0x12, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn negative_literal() {
        assert_eq!(
            text_to_program("1 PRINT -3").unwrap(),
            vec![0x08, 0x01, 0x00, 0x8B, 0x20, 0xFA, 0x04, 0x00, 0x00]
        );
    }

    #[test]
    fn line_reference() {
        assert_eq!(
            text_to_program("1 GOTO 100").unwrap(),
            vec![0x09, 0x01, 0x00, 0x80, 0x20, 0x0B, 0x64, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn hex_literal() {
        assert_eq!(
            text_to_program("1 POKE &HC000,1").unwrap(),
            vec![0x0B, 0x01, 0x00, 0x9E, 0x20, 0x11, 0x00, 0xC0, 0x2C, 0x02, 0x00, 0x00]
        );
    }

    #[test]
    fn line_reference_survives_commas() {
        // "," keeps the line-number context alive
        assert_eq!(
            text_to_program("1 GOTO 10,20").unwrap(),
            vec![0x0D, 0x01, 0x00, 0x80, 0x20, 0x0B, 0x0A, 0x00, 0x2C, 0x0B, 0x14, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn digit_after_variable_is_verbatim() {
        // "A1" is a name, not a literal
        assert_eq!(
            text_to_program("1 A1=2").unwrap(),
            vec![0x08, 0x01, 0x00, 0x41, 0x31, 0xF6, 0x03, 0x00, 0x00]
        );
    }

    #[test]
    fn string_copies_raw_bytes() {
        assert_eq!(
            text_to_program("1 PRINT \"A\"").unwrap(),
            vec![0x09, 0x01, 0x00, 0x8B, 0x20, 0x22, 0x41, 0x22, 0x00, 0x00]
        );
    }

    #[test]
    fn rem_dumps_the_rest_of_the_line() {
        assert_eq!(
            text_to_program("1 REM X=1").unwrap(),
            vec![0x09, 0x01, 0x00, 0x95, 0x20, 0x58, 0x3D, 0x31, 0x00, 0x00]
        );
    }

    #[test]
    fn lines_without_a_number_are_skipped() {
        assert_eq!(text_to_program("no line number\n\n").unwrap(), vec![0x00]);
    }

    #[test]
    fn lowercase_is_unparsable() {
        assert!(matches!(
            text_to_program("10 print"),
            Err(BasicError::CannotParse { line_number: 10, .. })
        ));
    }

    #[test]
    fn hex_overflow() {
        assert!(matches!(
            text_to_program("10 POKE &H10000,1"),
            Err(BasicError::ValueOutOfRange(0x10000))
        ));
    }

    #[test]
    fn decimal_overflow() {
        assert!(matches!(
            text_to_program("10 PRINT 70000"),
            Err(BasicError::ValueOutOfRange(70000))
        ));
    }

    #[test]
    fn overlong_line_is_rejected() {
        let text = format!("10 REM {}", "A".repeat(300));
        assert!(matches!(
            text_to_program(&text),
            Err(BasicError::LineTooLong { line_number: 10, .. })
        ));
    }
}
