//! Tape and BASIC round-trip tests

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io::Cursor;

use fbasic::data::{FileInfo, FileType, TapeFile};
use fbasic::detokenizer::program_to_text;
use fbasic::tape_file::{read_file, write_file, write_recording};
use fbasic::tokenizer::text_to_program;

use tape::{data_checksum, TapeBit, TapeEncodingInfo, TapeReader, TapeWriter};

const ENRI_EXAMPLE_TEXT: &str = "\
10 FOR I=0 TO 10
20 PRINT \"TEST \";
30 NEXT
";

#[rustfmt::skip]
const ENRI_EXAMPLE_BIN: &[u8] = &[
    0x11,
    0x0A, 0x00,
    0x8C, 0x20, 0x49, 0xF6, 0x12, 0x00, 0x00, 0x20, 0x88, 0x20, 0x12, 0x0A, 0x00,
    0x00,

    0x0E,
    0x14, 0x00,
    0x8B, 0x20, 0x22, 0x54, 0x45, 0x53, 0x54, 0x20, 0x22, 0x3B,
    0x00,

    0x05,
    0x1E, 0x00,
    0x8D,
    0x00,

    0x00,
];

#[test]
fn enri_example_tokenizes_byte_exact() {
    assert_eq!(text_to_program(ENRI_EXAMPLE_TEXT).unwrap(), ENRI_EXAMPLE_BIN);
}

#[test]
fn enri_example_detokenizes_back() {
    let d = program_to_text(&mut Cursor::new(ENRI_EXAMPLE_BIN)).unwrap();
    assert!(d.warnings.is_empty());
    assert_eq!(d.text.trim(), ENRI_EXAMPLE_TEXT.trim());
}

#[test]
fn tokenized_program_round_trips() {
    let d = program_to_text(&mut Cursor::new(ENRI_EXAMPLE_BIN)).unwrap();
    assert_eq!(text_to_program(&d.text).unwrap(), ENRI_EXAMPLE_BIN);
}

fn fast_encoding() -> TapeEncodingInfo {
    TapeEncodingInfo {
        sync_min_pulse_count: 200,
        ..TapeEncodingInfo::default()
    }
}

fn test_file() -> TapeFile {
    let mut info = FileInfo::new(FileType::Basic);
    info.set_name("ABCDEFGHIJKLMNOP").unwrap();
    info.length = 32;
    info.load_address = 0x6006;
    info.execution_address = 0x2020;

    let data: Vec<u8> = (0..32).map(|i| (i * 7) as u8).collect();
    TapeFile { info, data }
}

#[test]
fn tape_file_round_trips_at_32khz() {
    let file = test_file();

    let mut w = TapeWriter::new(Cursor::new(Vec::new()), TapeEncodingInfo::default(), 32000)
        .unwrap();
    write_recording(&mut w, std::slice::from_ref(&file)).unwrap();
    let wav = w.finish().unwrap().into_inner();

    let mut r = TapeReader::new(&mut Cursor::new(wav), TapeEncodingInfo::default()).unwrap();
    let decoded = read_file(&mut r).unwrap();

    assert!(decoded.warnings.is_empty());
    assert_eq!(decoded.file.info.to_bytes(), file.info.to_bytes());
    assert_eq!(decoded.file.data, file.data);
}

#[test]
fn two_files_on_one_tape() {
    let first = test_file();
    let mut second = test_file();
    second.info.set_name("SECOND").unwrap();
    second.info.length = 8;
    second.data = vec![0xEE; 8];

    let enc = fast_encoding();
    let mut w = TapeWriter::new(Cursor::new(Vec::new()), enc.clone(), 32000).unwrap();
    write_recording(&mut w, &[first.clone(), second.clone()]).unwrap();
    let wav = w.finish().unwrap().into_inner();

    let mut r = TapeReader::new(&mut Cursor::new(wav), enc).unwrap();
    let a = read_file(&mut r).unwrap();
    let b = read_file(&mut r).unwrap();

    assert_eq!(a.file, first);
    assert_eq!(b.file, second);

    // nothing left but trailing silence
    assert!(read_file(&mut r).is_err());
}

#[test]
fn checksum_mismatch_is_a_warning() {
    let file = test_file();
    let header = file.info.to_bytes();
    let enc = fast_encoding();

    let mut w = TapeWriter::new(Cursor::new(Vec::new()), enc.clone(), 32000).unwrap();

    // information block with a corrupted checksum word
    w.write_sync_run(40).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_bytes(&header).unwrap();
    let bad = data_checksum(&header) ^ 0x0101;
    w.write_byte((bad >> 8) as u8).unwrap();
    w.write_byte(bad as u8).unwrap();
    w.write_bit(TapeBit::One).unwrap();

    // intact data block
    w.write_sync_run(20).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_bytes_with_checksum(&file.data).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_silence(0.01).unwrap();

    let wav = w.finish().unwrap().into_inner();

    let mut r = TapeReader::new(&mut Cursor::new(wav), enc).unwrap();
    let decoded = read_file(&mut r).unwrap();

    assert_eq!(decoded.file.data, file.data);
    assert_eq!(decoded.warnings.len(), 1);
    assert_eq!(decoded.warnings[0].stored, bad);
    assert_eq!(decoded.warnings[0].computed, data_checksum(&header));
}

#[test]
fn data_block_first_is_an_error() {
    let file = test_file();
    let enc = fast_encoding();

    let mut w = TapeWriter::new(Cursor::new(Vec::new()), enc.clone(), 32000).unwrap();
    // a lone data block, no information block before it
    w.write_sync_run(20).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_bytes_with_checksum(&file.data).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_silence(0.01).unwrap();
    let wav = w.finish().unwrap().into_inner();

    let mut r = TapeReader::new(&mut Cursor::new(wav), enc).unwrap();
    assert!(matches!(
        read_file(&mut r),
        Err(fbasic::errors::FileReadError::UnexpectedBlockType(_))
    ));
}

#[test]
fn single_file_without_trailing_bit_still_decodes() {
    // the final framing bit of the last data block may be omitted
    let file = test_file();
    let enc = fast_encoding();

    let mut w = TapeWriter::new(Cursor::new(Vec::new()), enc.clone(), 32000).unwrap();
    w.write_sync_run(40).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_bytes_with_checksum(&file.info.to_bytes()).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_sync_run(20).unwrap();
    w.write_bit(TapeBit::One).unwrap();
    w.write_bytes_with_checksum(&file.data).unwrap();
    w.write_silence(0.01).unwrap();
    let wav = w.finish().unwrap().into_inner();

    let mut r = TapeReader::new(&mut Cursor::new(wav), enc).unwrap();
    let decoded = read_file(&mut r).unwrap();
    assert_eq!(decoded.file, file);
}

#[test]
fn padding_bytes_round_trip_verbatim() {
    let mut file = test_file();
    file.info.reserved = 0x11;
    file.info.padding = [0x5A; 104];

    let enc = fast_encoding();
    let mut w = TapeWriter::new(Cursor::new(Vec::new()), enc.clone(), 32000).unwrap();
    write_file(&mut w, &file).unwrap();
    w.write_silence(0.01).unwrap();
    let wav = w.finish().unwrap().into_inner();

    let mut r = TapeReader::new(&mut Cursor::new(wav), enc).unwrap();
    let decoded = read_file(&mut r).unwrap();
    assert_eq!(decoded.file.info.reserved, 0x11);
    assert_eq!(decoded.file.info.padding, [0x5A; 104]);
}
