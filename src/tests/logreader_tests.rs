// src/tests/logreader_tests.rs

#![allow(non_snake_case)]

use crate::common::FPath;
use crate::data::datetime::{Direction, NaiveDate};
use crate::data::record::{Record, RecordType};
use crate::readers::linereader::BLOCKSZ_DEFAULT;
use crate::readers::logreader::{LogFileRef, LogReader};
use crate::tests::common::{
    create_temp_file, ntf_fpath, LINE_E_1, LINE_E_2, LINE_MALFORMED, LINE_Q_1,
};

use ::test_case::test_case;

// -------------------------------------------------------------------------------------------------

fn fileref(path: FPath) -> LogFileRef {
    LogFileRef {
        path,
        date: NaiveDate::from_ymd_opt(2023, 4, 13).unwrap(),
    }
}

fn open(
    path: FPath,
    direction: Direction,
    type_filter: Option<RecordType>,
) -> LogReader {
    LogReader::open(fileref(path), direction, BLOCKSZ_DEFAULT, type_filter)
}

// -------------------------------------------------------------------------------------------------

#[test]
fn test_logreader_forward_yields_in_file_order() {
    let data: String = format!("{}\n{}\n{}\n", LINE_Q_1, LINE_E_1, LINE_E_2);
    let ntf = create_temp_file(&data);
    let records: Vec<Record> =
        open(ntf_fpath(&ntf), Direction::Forward, None).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].record_type(), &RecordType::Queue);
    assert_eq!(records[1].job_id(), "100001.pbs01");
    assert_eq!(records[2].job_id(), "100002.pbs01");
}

#[test]
fn test_logreader_reverse_yields_newest_first() {
    let data: String = format!("{}\n{}\n{}\n", LINE_Q_1, LINE_E_1, LINE_E_2);
    let ntf = create_temp_file(&data);
    let records: Vec<Record> =
        open(ntf_fpath(&ntf), Direction::Reverse, None).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].job_id(), "100002.pbs01");
    assert_eq!(records[2].record_type(), &RecordType::Queue);
}

#[test]
fn test_logreader_missing_file_is_empty_stream() {
    let mut logreader: LogReader =
        open(FPath::from("/no/such/dir/20230413"), Direction::Forward, None);
    assert!(logreader.is_empty_stream());
    assert!(logreader.next().is_none());
    assert_eq!(logreader.summary.lines_read, 0);
}

#[test_case(Direction::Forward)]
#[test_case(Direction::Reverse)]
fn test_logreader_malformed_line_skipped_and_counted(direction: Direction) {
    let data: String = format!("{}\n{}\n{}\n", LINE_Q_1, LINE_MALFORMED, LINE_E_1);
    let ntf = create_temp_file(&data);
    let mut logreader: LogReader = open(ntf_fpath(&ntf), direction, None);
    let records: Vec<Record> = logreader.by_ref().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(logreader.summary.lines_read, 3);
    assert_eq!(logreader.summary.lines_malformed, 1);
    assert_eq!(logreader.summary.records_yielded, 2);
}

#[test]
fn test_logreader_type_pushdown() {
    let data: String = format!("{}\n{}\n{}\n", LINE_Q_1, LINE_E_1, LINE_E_2);
    let ntf = create_temp_file(&data);
    let mut logreader: LogReader = open(
        ntf_fpath(&ntf),
        Direction::Forward,
        Some(RecordType::End),
    );
    let records: Vec<Record> = logreader.by_ref().collect();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|record| record.record_type() == &RecordType::End));
    assert_eq!(logreader.summary.lines_prefiltered, 1);
    assert_eq!(logreader.summary.records_yielded, 2);
}

// a line with no header tag is still reported as malformed when a type
// filter is active
#[test]
fn test_logreader_type_pushdown_counts_headerless_malformed() {
    let data: String = format!("{}\n{}\n", LINE_MALFORMED, LINE_E_1);
    let ntf = create_temp_file(&data);
    let mut logreader: LogReader = open(
        ntf_fpath(&ntf),
        Direction::Forward,
        Some(RecordType::End),
    );
    let records: Vec<Record> = logreader.by_ref().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(logreader.summary.lines_malformed, 1);
    assert_eq!(logreader.summary.lines_prefiltered, 0);
}

#[test]
fn test_logreader_coercion_note_counted() {
    let ntf =
        create_temp_file("04/13/2023 09:00:00;E;42.pbs01;Resource_List.ncpus=banana user=x\n");
    let mut logreader: LogReader = open(ntf_fpath(&ntf), Direction::Forward, None);
    let records: Vec<Record> = logreader.by_ref().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(logreader.summary.notes_coercion, 1);
}

#[test]
fn test_logreader_blank_lines_not_counted() {
    let data: String = format!("\n{}\n\n{}\n\n", LINE_Q_1, LINE_E_1);
    let ntf = create_temp_file(&data);
    let mut logreader: LogReader = open(ntf_fpath(&ntf), Direction::Forward, None);
    let records: Vec<Record> = logreader.by_ref().collect();
    assert_eq!(records.len(), 2);
    assert_eq!(logreader.summary.lines_read, 2);
}
