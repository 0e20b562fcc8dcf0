// src/readers/summary.rs

//! Implements the processing statistics structs.

use crate::common::Count;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SummaryLogReader, SummaryProcessing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Accumulated statistics about one file processed by a [`LogReader`].
///
/// [`LogReader`]: crate::readers::logreader::LogReader
#[derive(Clone, Copy, Debug, Default)]
pub struct SummaryLogReader {
    /// lines yielded by the underlying line reader
    pub lines_read: Count,
    /// lines discarded by record-type push-down before full decode
    pub lines_prefiltered: Count,
    /// lines that could not yield a valid record
    pub lines_malformed: Count,
    /// payload values kept as raw text after failed coercion
    pub notes_coercion: Count,
    /// records decoded and yielded
    pub records_yielded: Count,
}

/// Accumulated statistics about a whole query processed by a
/// [`LogSequencer`]; per-file [`SummaryLogReader`] data is folded in as
/// each file is exhausted.
///
/// For CLI option `--summary`.
///
/// [`LogSequencer`]: crate::readers::sequencer::LogSequencer
/// [`SummaryLogReader`]: self::SummaryLogReader
#[derive(Clone, Copy, Debug, Default)]
pub struct SummaryProcessing {
    /// daily files opened successfully
    pub files_opened: Count,
    /// daily files in the window that were absent (warned, not fatal)
    pub files_missing: Count,
    pub lines_read: Count,
    pub lines_prefiltered: Count,
    pub lines_malformed: Count,
    pub notes_coercion: Count,
    pub records_yielded: Count,
}

impl SummaryProcessing {
    pub fn update(
        &mut self,
        summary: &SummaryLogReader,
    ) {
        self.lines_read += summary.lines_read;
        self.lines_prefiltered += summary.lines_prefiltered;
        self.lines_malformed += summary.lines_malformed;
        self.notes_coercion += summary.notes_coercion;
        self.records_yielded += summary.records_yielded;
    }
}
