// src/readers/sequencer.rs

//! Implements the [`LogSequencer`], the driver of a whole query window:
//! it turns a [`DateWindow`] into an ordered list of daily file
//! references and chains one [`LogReader`] after another into a single
//! continuous lazy stream of [`Record`]s.
//!
//! Forward windows stream oldest file to newest, reverse windows newest
//! to oldest, and every record of file N precedes every record of file
//! N+1 in stream order. Each file is opened lazily and closed before the
//! next one is opened, so at most one file descriptor is held per query.
//!
//! [`LogSequencer`]: self::LogSequencer
//! [`DateWindow`]: crate::data::datetime::DateWindow
//! [`LogReader`]: crate::readers::logreader::LogReader
//! [`Record`]: crate::data::record::Record

use crate::common::FPath;
use crate::data::datetime::{filestamp, DateWindow, NaiveDate};
use crate::data::record::{Record, RecordType};
use crate::readers::linereader::BlockSz;
use crate::readers::logreader::{LogFileRef, LogReader};
use crate::readers::summary::SummaryProcessing;

use std::path::PathBuf;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LogSequencer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Chains per-file [`LogReader`] streams across a [`DateWindow`] into
/// one lazy record stream, pulled via [`Iterator`].
///
/// [`LogReader`]: crate::readers::logreader::LogReader
/// [`DateWindow`]: crate::data::datetime::DateWindow
pub struct LogSequencer {
    root: FPath,
    window: DateWindow,
    /// dates not yet opened, in stream order
    dates: std::vec::IntoIter<NaiveDate>,
    blocksz: BlockSz,
    type_filter: Option<RecordType>,
    /// the one open file; `None` between files
    current: Option<LogReader>,
    pub summary: SummaryProcessing,
}

impl LogSequencer {
    /// `root` is the accounting log directory; daily files are named by
    /// their date stamp, e.g. `<root>/20230413`. No file is touched
    /// until the stream is first pulled.
    pub fn new(
        root: FPath,
        window: DateWindow,
        blocksz: BlockSz,
        type_filter: Option<RecordType>,
    ) -> LogSequencer {
        defñ!("({:?}, {})", root, window);
        let dates: Vec<NaiveDate> = window.dates();

        LogSequencer {
            root,
            window,
            dates: dates.into_iter(),
            blocksz,
            type_filter,
            current: None,
            summary: SummaryProcessing::default(),
        }
    }

    pub fn window(&self) -> &DateWindow {
        &self.window
    }

    /// The file reference implied by `date` under this sequencer's root.
    pub fn fileref_for(
        &self,
        date: NaiveDate,
    ) -> LogFileRef {
        let path: PathBuf = PathBuf::from(&self.root).join(filestamp(&date));

        LogFileRef {
            path: path.to_string_lossy().into_owned(),
            date,
        }
    }

    /// Fold the finished reader's statistics into the query summary and
    /// release its file handle.
    fn close_current(&mut self) {
        if let Some(logreader) = self.current.take() {
            self.summary
                .update(&logreader.summary);
        }
    }
}

impl Iterator for LogSequencer {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if self.current.is_none() {
                let date: NaiveDate = self.dates.next()?;
                let fileref: LogFileRef = self.fileref_for(date);
                defo!("open {:?}", fileref.path);
                let logreader: LogReader = LogReader::open(
                    fileref,
                    self.window.direction(),
                    self.blocksz,
                    self.type_filter.clone(),
                );
                match logreader.is_empty_stream() {
                    true => self.summary.files_missing += 1,
                    false => self.summary.files_opened += 1,
                }
                self.current = Some(logreader);
            }
            if let Some(logreader) = self.current.as_mut() {
                match logreader.next() {
                    Some(record) => return Some(record),
                    None => self.close_current(),
                }
            }
        }
    }
}

impl Drop for LogSequencer {
    // a caller that stops pulling early still gets partial statistics
    // folded in
    fn drop(&mut self) {
        self.close_current();
    }
}
