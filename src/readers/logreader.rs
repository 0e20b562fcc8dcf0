// src/readers/logreader.rs

//! Implements a [`LogReader`], the per-file stream of decoded
//! [`Record`]s: a line reader in either direction plus the pure line
//! decoder plus the diagnostic policy.
//!
//! Per-line faults are absorbed here: a malformed line is skipped with a
//! warning and streaming continues. An absent file is a warning and an
//! empty stream, so a query window with a missing day degrades
//! gracefully instead of aborting.
//!
//! [`LogReader`]: self::LogReader
//! [`Record`]: crate::data::record::Record

use crate::common::{FPath, ResultS3};
use crate::data::datetime::{Direction, NaiveDate, DT_PATTERN_DATE};
use crate::data::record::{decode_line, peek_type_tag, Record, RecordType};
#[allow(unused_imports)]
use crate::debug::printers::{de_wrn, e_err, e_wrn};
use crate::readers::linereader::{
    BlockSz, ForwardLineReader, ResultLineRead, ReverseLineReader,
};
use crate::readers::summary::SummaryLogReader;

use std::io::ErrorKind;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LogFileRef
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A (path, date) pair naming one daily accounting log file.
///
/// Existence is checked lazily at open time, not at window resolution,
/// so a moved or removed file surfaces as a per-file warning rather than
/// aborting the whole query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogFileRef {
    pub path: FPath,
    pub date: NaiveDate,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LogReader
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

enum LineReaderKind {
    Forward(ForwardLineReader),
    Reverse(ReverseLineReader),
}

/// A lazy stream of [`Record`]s from one daily file, pulled one record
/// at a time via [`Iterator`]. Owns at most one file handle; the handle
/// is released as soon as the file is exhausted, or when the reader is
/// dropped by a caller that stopped pulling early.
///
/// [`Record`]: crate::data::record::Record
pub struct LogReader {
    fileref: LogFileRef,
    /// `None` when the file was absent or unopenable (already warned),
    /// or after exhaustion; yields an empty stream either way.
    inner: Option<LineReaderKind>,
    /// Record-type push-down: the raw header tag is tested before the
    /// payload is decoded at all.
    type_filter: Option<RecordType>,
    pub(crate) summary: SummaryLogReader,
}

impl LogReader {
    /// Open `fileref` for streaming in `direction`.
    ///
    /// Infallible by design: a file that cannot be opened produces a
    /// warning on the diagnostic channel and an empty stream.
    pub fn open(
        fileref: LogFileRef,
        direction: Direction,
        blocksz: BlockSz,
        type_filter: Option<RecordType>,
    ) -> LogReader {
        defñ!("({:?}, {:?})", fileref.path, direction);
        let opened: Result<LineReaderKind, std::io::Error> = match direction {
            Direction::Forward => {
                ForwardLineReader::open(&fileref.path).map(LineReaderKind::Forward)
            }
            Direction::Reverse => {
                ReverseLineReader::open(&fileref.path, blocksz).map(LineReaderKind::Reverse)
            }
        };
        let inner: Option<LineReaderKind> = match opened {
            Ok(linereader) => Some(linereader),
            Err(err) => {
                match err.kind() {
                    ErrorKind::NotFound => e_wrn!(
                        "no accounting log {:?} for {}",
                        fileref.path,
                        fileref.date.format(DT_PATTERN_DATE),
                    ),
                    _ => e_wrn!("cannot open {:?}: {}", fileref.path, err),
                }
                None
            }
        };

        LogReader {
            fileref,
            inner,
            type_filter,
            summary: SummaryLogReader::default(),
        }
    }

    pub fn fileref(&self) -> &LogFileRef {
        &self.fileref
    }

    /// `true` when the underlying file could not be opened.
    pub fn is_empty_stream(&self) -> bool {
        self.inner.is_none()
    }

    /// Release the file handle; the stream yields nothing afterward.
    fn finish(&mut self) {
        self.inner = None;
    }
}

impl Iterator for LogReader {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let result: ResultLineRead = match &mut self.inner {
                None => return None,
                Some(LineReaderKind::Forward(linereader)) => linereader.next_line(),
                Some(LineReaderKind::Reverse(linereader)) => linereader.next_line(),
            };
            let bytes = match result {
                ResultS3::Found(bytes) => bytes,
                ResultS3::Done => {
                    self.finish();
                    return None;
                }
                ResultS3::Err(err) => {
                    e_err!("reading {:?}: {}", self.fileref.path, err);
                    self.finish();
                    return None;
                }
            };
            self.summary.lines_read += 1;
            let line: &str = match std::str::from_utf8(&bytes) {
                Ok(line) => line,
                Err(_) => {
                    self.summary.lines_malformed += 1;
                    e_wrn!("skipping non-UTF-8 line in {:?}", self.fileref.path);
                    continue;
                }
            };
            if let Some(wanted) = &self.type_filter {
                match peek_type_tag(line) {
                    Some(tag) if tag == wanted.as_tag() => {}
                    Some(_) => {
                        self.summary.lines_prefiltered += 1;
                        continue;
                    }
                    // no header at all; fall through so the decoder
                    // reports it as malformed
                    None => {}
                }
            }
            match decode_line(line) {
                Ok((record, notes)) => {
                    for note in notes.iter() {
                        self.summary.notes_coercion += 1;
                        e_wrn!("{:?}: {}", self.fileref.path, note);
                    }
                    self.summary.records_yielded += 1;

                    return Some(record);
                }
                Err(malformed) => {
                    self.summary.lines_malformed += 1;
                    e_wrn!("skipping malformed line in {:?}: {}", self.fileref.path, malformed);
                    continue;
                }
            }
        }
    }
}
