// src/printer/summary.rs

//! The streaming [`RecordAggregator`] and the `--summary` printout.
//!
//! [`RecordAggregator`]: self::RecordAggregator

use crate::common::Count;
use crate::data::record::{duration_to_hms, FieldKind};
use crate::error::QhResult;
use crate::printer::printers::FieldSpec;
use crate::readers::summary::SummaryProcessing;

use std::io::Write;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RecordAggregator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Running aggregate of one numeric display field.
///
/// Exactly O(1) state: count, sum, min, max. Durations aggregate in
/// seconds, memory in bytes; units are restored at render time.
#[derive(Clone, Debug)]
struct AggregateState {
    name: String,
    kind: FieldKind,
    count: Count,
    sum: f64,
    min: f64,
    max: f64,
}

impl AggregateState {
    fn update(
        &mut self,
        val: f64,
    ) {
        if self.count == 0 {
            self.min = val;
            self.max = val;
        } else {
            self.min = self.min.min(val);
            self.max = self.max.max(val);
        }
        self.count += 1;
        self.sum += val;
    }

    fn render(
        &self,
        val: f64,
    ) -> String {
        match self.kind {
            FieldKind::Duration => duration_to_hms(val as i64),
            FieldKind::Memory => format!("{:.1}", val / (1024.0 * 1024.0 * 1024.0)),
            FieldKind::Integer => format!("{:.1}", val),
            _ => format!("{:.2}", val),
        }
    }
}

/// Accumulates count/sum/min/max for the numeric fields of a display
/// list across the streamed records: one pass, no buffering, a single
/// summary block at stream end.
#[derive(Clone, Debug)]
pub struct RecordAggregator {
    fields: Vec<AggregateState>,
    records_seen: Count,
}

impl RecordAggregator {
    /// Non-numeric fields of `specs` are ignored; with none numeric the
    /// aggregator still counts records.
    pub fn new(specs: &[FieldSpec]) -> RecordAggregator {
        let fields: Vec<AggregateState> = specs
            .iter()
            .filter(|spec| {
                matches!(
                    spec.kind,
                    FieldKind::Integer | FieldKind::Float | FieldKind::Duration | FieldKind::Memory,
                )
            })
            .map(|spec| AggregateState {
                name: spec.name.clone(),
                kind: spec.kind,
                count: 0,
                sum: 0.0,
                min: 0.0,
                max: 0.0,
            })
            .collect();

        RecordAggregator {
            fields,
            records_seen: 0,
        }
    }

    pub fn update(
        &mut self,
        record: &crate::data::record::Record,
    ) {
        self.records_seen += 1;
        for state in self.fields.iter_mut() {
            if let Some(val) = record
                .value(&state.name)
                .and_then(|value| value.as_f64())
            {
                state.update(val);
            }
        }
    }

    pub fn records_seen(&self) -> Count {
        self.records_seen
    }

    /// Emit the aggregate block: one line overall, one line per field.
    pub fn write_summary<W: Write>(
        &self,
        out: &mut W,
    ) -> QhResult<()> {
        writeln!(out, "records: {}", self.records_seen)?;
        for state in self.fields.iter() {
            match state.count {
                0 => writeln!(out, "{}: no values", state.name)?,
                _ => {
                    let mean: f64 = state.sum / state.count as f64;
                    writeln!(
                        out,
                        "{}: count {} mean {} min {} max {}",
                        state.name,
                        state.count,
                        state.render(mean),
                        state.render(state.min),
                        state.render(state.max),
                    )?;
                }
            }
        }

        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// processing summary
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Print a query's processing statistics to the diagnostic channel.
///
/// For CLI option `--summary`; never mixed into data output.
pub fn print_processing_summary(summary: &SummaryProcessing) {
    eprintln!("Processing summary:");
    eprintln!(
        "  files opened {}, files missing {}",
        summary.files_opened, summary.files_missing,
    );
    eprintln!(
        "  lines read {} (prefiltered {}, malformed {}, coercion notes {})",
        summary.lines_read,
        summary.lines_prefiltered,
        summary.lines_malformed,
        summary.notes_coercion,
    );
    eprintln!("  records yielded {}", summary.records_yielded);
}
