// src/tests/linereader_tests.rs

#![allow(non_snake_case)]

use crate::common::{Bytes, FPath, ResultS3};
use crate::readers::linereader::{
    BlockSz, ForwardLineReader, ReverseLineReader, BLOCKSZ_DEFAULT,
};
use crate::tests::common::{create_temp_file, ntf_fpath};

use ::test_case::test_case;

// -------------------------------------------------------------------------------------------------

fn collect_forward(path: &FPath) -> Vec<String> {
    let mut linereader: ForwardLineReader = ForwardLineReader::open(path).unwrap();
    let mut lines: Vec<String> = Vec::new();
    loop {
        match linereader.next_line() {
            ResultS3::Found(bytes) => lines.push(bytes_to_string(bytes)),
            ResultS3::Done => break,
            ResultS3::Err(err) => panic!("next_line() return Err {}", err),
        }
    }

    lines
}

fn collect_reverse(
    path: &FPath,
    blocksz: BlockSz,
) -> Vec<String> {
    let mut linereader: ReverseLineReader = ReverseLineReader::open(path, blocksz).unwrap();
    let mut lines: Vec<String> = Vec::new();
    loop {
        match linereader.next_line() {
            ResultS3::Found(bytes) => lines.push(bytes_to_string(bytes)),
            ResultS3::Done => break,
            ResultS3::Err(err) => panic!("next_line() return Err {}", err),
        }
    }

    lines
}

fn bytes_to_string(bytes: Bytes) -> String {
    String::from_utf8(bytes).unwrap()
}

// -------------------------------------------------------------------------------------------------
// ForwardLineReader

#[test]
fn test_forward_basic() {
    let ntf = create_temp_file("aa\nbb\ncc\n");
    assert_eq!(collect_forward(&ntf_fpath(&ntf)), vec!["aa", "bb", "cc"]);
}

#[test]
fn test_forward_no_trailing_newline() {
    let ntf = create_temp_file("aa\nbb");
    assert_eq!(collect_forward(&ntf_fpath(&ntf)), vec!["aa", "bb"]);
}

#[test]
fn test_forward_blank_lines_skipped() {
    let ntf = create_temp_file("\n\naa\n\nbb\n\n\n");
    assert_eq!(collect_forward(&ntf_fpath(&ntf)), vec!["aa", "bb"]);
}

#[test]
fn test_forward_crlf() {
    let ntf = create_temp_file("aa\r\nbb\r\n");
    assert_eq!(collect_forward(&ntf_fpath(&ntf)), vec!["aa", "bb"]);
}

#[test]
fn test_forward_empty_file() {
    let ntf = create_temp_file("");
    assert!(collect_forward(&ntf_fpath(&ntf)).is_empty());
}

#[test]
fn test_forward_open_missing_file_is_err() {
    assert!(ForwardLineReader::open(&FPath::from("/no/such/file")).is_err());
}

// -------------------------------------------------------------------------------------------------
// ReverseLineReader

const BLOCKSZS: [BlockSz; 8] = [1, 2, 3, 5, 7, 16, 64, BLOCKSZ_DEFAULT];

/// reverse-stream property: for any file and any block size, the
/// reverse sequence equals the reverse of the forward sequence
#[test_case(""; "empty file")]
#[test_case("\n"; "single newline")]
#[test_case("a"; "one char no newline")]
#[test_case("a\n"; "one line")]
#[test_case("aa\nbb\ncc\n"; "three lines")]
#[test_case("aa\nbb\ncc"; "three lines no trailing newline")]
#[test_case("\n\naa\n\nbb\n\n"; "blank lines")]
#[test_case("first\r\nsecond\r\n"; "crlf")]
#[test_case("0123456789abcdef0123456789abcdef long line spanning many small blocks\nshort\n";
    "line spans block seams")]
fn test_reverse_equals_reversed_forward(data: &str) {
    let ntf = create_temp_file(data);
    let fpath: FPath = ntf_fpath(&ntf);
    let mut expect: Vec<String> = collect_forward(&fpath);
    expect.reverse();
    for blocksz in BLOCKSZS.iter() {
        let lines: Vec<String> = collect_reverse(&fpath, *blocksz);
        assert_eq!(lines, expect, "blocksz {}", blocksz);
    }
}

#[test]
fn test_reverse_file_size_not_multiple_of_blocksz() {
    // 13 bytes against blocksz 4
    let ntf = create_temp_file("ab\ncdef\nghij\n");
    let fpath: FPath = ntf_fpath(&ntf);
    assert_eq!(collect_reverse(&fpath, 4), vec!["ghij", "cdef", "ab"]);
}

#[test]
fn test_reverse_line_longer_than_blocksz() {
    let long: String = "x".repeat(1000);
    let data: String = format!("{}\nshort\n", long);
    let ntf = create_temp_file(&data);
    let fpath: FPath = ntf_fpath(&ntf);
    assert_eq!(collect_reverse(&fpath, 8), vec![String::from("short"), long]);
}

#[test]
fn test_reverse_open_missing_file_is_err() {
    assert!(ReverseLineReader::open(&FPath::from("/no/such/file"), BLOCKSZ_DEFAULT).is_err());
}

#[test]
fn test_reverse_blocksz_zero_is_err() {
    let ntf = create_temp_file("aa\n");
    assert!(ReverseLineReader::open(&ntf_fpath(&ntf), 0).is_err());
}

/// a reader is single-pass: pulling past exhaustion keeps returning Done
#[test]
fn test_reverse_done_is_sticky() {
    let ntf = create_temp_file("aa\n");
    let mut linereader: ReverseLineReader = ReverseLineReader::open(&ntf_fpath(&ntf), 4).unwrap();
    assert!(linereader.next_line().is_found());
    assert!(linereader.next_line().is_done());
    assert!(linereader.next_line().is_done());
}
