// src/tests/sequencer_tests.rs

#![allow(non_snake_case)]

use crate::data::datetime::{resolve_window, DateWindow, Direction, NaiveDate};
use crate::data::record::{Record, RecordType};
use crate::filter::{compile, evaluate, FilterClause};
use crate::printer::printers::{FieldSpec, OutputMode, RecordPrinter};
use crate::readers::linereader::BLOCKSZ_DEFAULT;
use crate::readers::sequencer::LogSequencer;
use crate::tests::common::{create_log_dir, create_log_file, dir_fpath, TempDir};

// -------------------------------------------------------------------------------------------------

fn ymd(
    y: i32,
    m: u32,
    d: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn window(
    start: (i32, u32, u32),
    end: (i32, u32, u32),
    direction: Direction,
) -> DateWindow {
    resolve_window(
        None,
        None,
        Some((ymd(start.0, start.1, start.2), ymd(end.0, end.1, end.2))),
        direction,
        ymd(2025, 12, 31),
    )
    .unwrap()
}

fn line_Q(
    mmdd: &str,
    job: u32,
) -> String {
    format!("{}/2025 08:00:00;Q;{}.pbs01;user=vanderwb queue=regular", mmdd, job)
}

fn line_E(
    mmdd: &str,
    job: u32,
) -> String {
    format!(
        "{}/2025 14:00:00;E;{}.pbs01;user=vanderwb queue=regular \
        Resource_List.ncpus=4 resources_used.walltime=01:00:00 Exit_status=0",
        mmdd, job,
    )
}

/// three daily files, two records each
fn three_day_dir() -> TempDir {
    let dir: TempDir = create_log_dir();
    create_log_file(
        &dir,
        "20250225",
        &format!("{}\n{}\n", line_Q("02/25", 100), line_E("02/25", 100)),
    );
    create_log_file(
        &dir,
        "20250226",
        &format!("{}\n{}\n", line_Q("02/26", 200), line_E("02/26", 200)),
    );
    create_log_file(
        &dir,
        "20250227",
        &format!("{}\n{}\n", line_Q("02/27", 300), line_E("02/27", 300)),
    );

    dir
}

fn short_ids(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| String::from(record.short_id()))
        .collect()
}

// -------------------------------------------------------------------------------------------------

#[test]
fn test_sequencer_forward_oldest_file_first() {
    let dir: TempDir = three_day_dir();
    let mut sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 27), Direction::Forward),
        BLOCKSZ_DEFAULT,
        None,
    );
    let records: Vec<Record> = sequencer.by_ref().collect();
    assert_eq!(
        short_ids(&records),
        vec!["100", "100", "200", "200", "300", "300"],
    );
    // within a file, forward order is file order: Q precedes E
    assert_eq!(records[0].record_type(), &RecordType::Queue);
    assert_eq!(records[1].record_type(), &RecordType::End);
    assert_eq!(sequencer.summary.files_opened, 3);
    assert_eq!(sequencer.summary.files_missing, 0);
    assert_eq!(sequencer.summary.records_yielded, 6);
}

#[test]
fn test_sequencer_reverse_newest_file_first() {
    let dir: TempDir = three_day_dir();
    let mut sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 27), Direction::Reverse),
        BLOCKSZ_DEFAULT,
        None,
    );
    let records: Vec<Record> = sequencer.by_ref().collect();
    assert_eq!(
        short_ids(&records),
        vec!["300", "300", "200", "200", "100", "100"],
    );
    // within a file, reverse order: E precedes Q
    assert_eq!(records[0].record_type(), &RecordType::End);
    assert_eq!(records[1].record_type(), &RecordType::Queue);
}

#[test]
fn test_sequencer_missing_middle_day() {
    let dir: TempDir = create_log_dir();
    create_log_file(&dir, "20250225", &format!("{}\n", line_E("02/25", 100)));
    create_log_file(&dir, "20250227", &format!("{}\n", line_E("02/27", 300)));
    let mut sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 27), Direction::Forward),
        BLOCKSZ_DEFAULT,
        None,
    );
    let records: Vec<Record> = sequencer.by_ref().collect();
    assert_eq!(short_ids(&records), vec!["100", "300"]);
    assert_eq!(sequencer.summary.files_opened, 2);
    assert_eq!(sequencer.summary.files_missing, 1);
}

#[test]
fn test_sequencer_no_file_touched_before_first_pull() {
    let dir: TempDir = three_day_dir();
    let sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 27), Direction::Forward),
        BLOCKSZ_DEFAULT,
        None,
    );
    assert_eq!(sequencer.summary.files_opened, 0);
    assert_eq!(sequencer.summary.lines_read, 0);
}

#[test]
fn test_sequencer_empty_dir_yields_nothing() {
    let dir: TempDir = create_log_dir();
    let mut sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 27), Direction::Forward),
        BLOCKSZ_DEFAULT,
        None,
    );
    assert!(sequencer.by_ref().next().is_none());
    assert_eq!(sequencer.summary.files_missing, 3);
    assert_eq!(sequencer.summary.records_yielded, 0);
}

#[test]
fn test_sequencer_type_pushdown_across_files() {
    let dir: TempDir = three_day_dir();
    let mut sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 27), Direction::Forward),
        BLOCKSZ_DEFAULT,
        Some(RecordType::Queue),
    );
    let records: Vec<Record> = sequencer.by_ref().collect();
    assert_eq!(records.len(), 3);
    assert!(records
        .iter()
        .all(|record| record.record_type() == &RecordType::Queue));
    assert_eq!(sequencer.summary.lines_prefiltered, 3);
}

#[test]
fn test_sequencer_fileref_path_shape() {
    let dir: TempDir = create_log_dir();
    let sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 25), Direction::Forward),
        BLOCKSZ_DEFAULT,
        None,
    );
    let fileref = sequencer.fileref_for(ymd(2025, 2, 25));
    assert!(fileref.path.ends_with("/20250225"));
    assert_eq!(fileref.date, ymd(2025, 2, 25));
}

// -------------------------------------------------------------------------------------------------

/// end-to-end: two daily files with three Q/E pairs and one malformed
/// line, filtered to end records, rendered as csv
#[test]
fn test_query_end_records_to_csv() {
    let dir: TempDir = create_log_dir();
    create_log_file(
        &dir,
        "20250225",
        &format!(
            "{}\n{}\n{}\n{}\n",
            line_Q("02/25", 100),
            line_E("02/25", 100),
            "garbage line with no header",
            line_E("02/25", 101),
        ),
    );
    create_log_file(
        &dir,
        "20250226",
        &format!("{}\n{}\n", line_Q("02/26", 200), line_E("02/26", 200)),
    );
    let mut sequencer: LogSequencer = LogSequencer::new(
        dir_fpath(&dir),
        window((2025, 2, 25), (2025, 2, 26), Direction::Forward),
        BLOCKSZ_DEFAULT,
        Some(RecordType::End),
    );
    let clauses: Vec<FilterClause> = compile("Exit_status==0").unwrap();
    let specs: Vec<FieldSpec> = vec![
        FieldSpec::parse("short_id").unwrap(),
        FieldSpec::parse("user").unwrap(),
        FieldSpec::parse("resources_used.walltime@hms").unwrap(),
    ];
    let mut printer: RecordPrinter<Vec<u8>> =
        RecordPrinter::new(OutputMode::Csv, specs, Vec::<u8>::new()).unwrap();
    for record in sequencer.by_ref() {
        if evaluate(&record, &clauses) {
            printer.print_record(&record).unwrap();
        }
    }
    printer.finish().unwrap();
    let out: String = String::from_utf8(printer.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "short_id,user,resources_used.walltime",
            "100,vanderwb,1:00:00",
            "101,vanderwb,1:00:00",
            "200,vanderwb,1:00:00",
        ],
    );
    // the malformed line was diagnosed exactly once
    assert_eq!(sequencer.summary.lines_malformed, 1);
    assert_eq!(sequencer.summary.lines_prefiltered, 2);
}
