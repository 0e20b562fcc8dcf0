// src/bin/qh.rs

//! Driver program _qh_ drives the [_qhlib_].
//!
//! Processes user-passed command-line arguments into the core's inputs:
//! a resolved output mode, an ordered display-field list, a filter
//! string, and the raw window intent (anchor date, explicit range, or
//! day-count). The library core never parses CLI syntax itself.
//!
//! Streams matching records to stdout in the selected mode; warnings
//! (missing daily files, malformed lines, coercion failures) go to
//! stderr, never mixed into data output. Exit code 0 on success,
//! non-zero on a fatal window/filter/format error — fatal errors are
//! reported before any record output is produced.
//!
//! [_qhlib_]: qhlib

use std::io::Write;
use std::process::ExitCode;

use ::anyhow::{anyhow, Context, Result};
use ::chrono::Local;
use ::clap::{Parser, ValueEnum};
use ::qhlib::data::datetime::{
    date_from_str, resolve_window, DateWindow, Direction, NaiveDate,
};
use ::qhlib::data::record::RecordType;
use ::qhlib::debug::printers::e_err;
use ::qhlib::filter::{compile, evaluate, FilterClause};
use ::qhlib::printer::printers::{
    default_field_specs, FieldSpec, OutputMode, RecordPrinter,
};
use ::qhlib::printer::summary::{print_processing_summary, RecordAggregator};
use ::qhlib::readers::linereader::{BlockSz, BLOCKSZ_DEFAULT};
use ::qhlib::readers::sequencer::LogSequencer;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// command-line parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CliOutputMode {
    Tabular,
    Long,
    Csv,
    Json,
}

impl From<CliOutputMode> for OutputMode {
    fn from(mode: CliOutputMode) -> OutputMode {
        match mode {
            CliOutputMode::Tabular => OutputMode::Tabular,
            CliOutputMode::Long => OutputMode::Long,
            CliOutputMode::Csv => OutputMode::Csv,
            CliOutputMode::Json => OutputMode::Json,
        }
    }
}

/// clap command-line arguments build-time definitions.
#[derive(Parser, Debug)]
#[clap(
    name = "qh",
    about = "Query job history from PBS accounting logs.",
    after_help = "\
DATE arguments accept YYYY-MM-DD or the daily file stamp form YYYYMMDD.
Daily log files are expected at LOGROOT/YYYYMMDD.

Filter clauses are joined with ';' and applied with logical AND, e.g.
    -w 'user==vanderwb;Resource_List.ncpus>36'
Display fields accept per-field specifiers name[:width][.precision][@style],
styles: hms (durations), gb mb (memory), date (timestamps)."
)]
struct CliArgs {
    /// Directory holding the daily accounting logs.
    logroot: String,

    /// Explicit date range START:END (inclusive), or a single day DATE.
    #[clap(short = 'p', long = "period", value_name = "DATE[:DATE]")]
    period: Option<String>,

    /// Days to reach back from the anchor date; 0 means the anchor day
    /// only.
    #[clap(short = 'd', long = "days-back", value_name = "N")]
    days_back: Option<u32>,

    /// Anchor date for --days-back; defaults to today.
    #[clap(short = 'a', long = "anchor", value_name = "DATE")]
    anchor: Option<String>,

    /// Only decode records with this type tag (e.g. E); applied before
    /// full decode.
    #[clap(short = 't', long = "type", value_name = "TAG")]
    record_type: Option<String>,

    /// Filter expression, clauses joined with ';'.
    #[clap(short = 'w', long = "where", value_name = "FILTER")]
    filter: Option<String>,

    /// Comma-separated display fields with optional specifiers.
    #[clap(short = 'f', long = "fields", value_name = "SPEC,SPEC,…")]
    fields: Option<String>,

    #[clap(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t = CliOutputMode::Tabular
    )]
    output: CliOutputMode,

    /// Stream newest records first (reads files back to front).
    #[clap(short = 'r', long = "reverse")]
    reverse: bool,

    /// Read-block size in bytes for reverse streaming.
    #[clap(long = "block-size", default_value_t = BLOCKSZ_DEFAULT, value_name = "BYTES")]
    blocksz: BlockSz,

    /// Print per-field aggregates (count/mean/min/max) after the
    /// records.
    #[clap(long = "average")]
    average: bool,

    /// Print processing statistics to stderr when done.
    #[clap(long = "summary")]
    summary: bool,
}

/// Parse `DATE` or `DATE:DATE` into an explicit inclusive range.
fn parse_period(period: &str) -> Result<(NaiveDate, NaiveDate)> {
    let (start_raw, end_raw): (&str, &str) = match period.split_once(':') {
        Some((start, end)) => (start, end),
        None => (period, period),
    };
    let start: NaiveDate = date_from_str(start_raw)
        .ok_or_else(|| anyhow!("unparseable date {:?} in --period", start_raw))?;
    let end: NaiveDate = date_from_str(end_raw)
        .ok_or_else(|| anyhow!("unparseable date {:?} in --period", end_raw))?;

    Ok((start, end))
}

fn parse_fields(fields: &str) -> Result<Vec<FieldSpec>> {
    let mut specs: Vec<FieldSpec> = Vec::new();
    for token in fields.split(',') {
        let token: &str = token.trim();
        if token.is_empty() {
            continue;
        }
        specs.push(
            FieldSpec::parse(token).with_context(|| format!("display field {:?}", token))?,
        );
    }
    if specs.is_empty() {
        return Err(anyhow!("--fields named no fields"));
    }

    Ok(specs)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// main
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn main() -> ExitCode {
    let args: CliArgs = CliArgs::parse();
    match run(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            e_err!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    let today: NaiveDate = Local::now().date_naive();
    let direction: Direction = match args.reverse {
        true => Direction::Reverse,
        false => Direction::Forward,
    };

    // every setup-time fault surfaces here, before any file is touched
    let range: Option<(NaiveDate, NaiveDate)> = match &args.period {
        Some(period) => Some(parse_period(period)?),
        None => None,
    };
    let anchor: Option<NaiveDate> = match &args.anchor {
        Some(anchor) => Some(
            date_from_str(anchor).ok_or_else(|| anyhow!("unparseable date {:?} in --anchor", anchor))?,
        ),
        None => None,
    };
    let window: DateWindow = resolve_window(anchor, args.days_back, range, direction, today)?;
    let clauses: Vec<FilterClause> = match &args.filter {
        Some(filter) => compile(filter)?,
        None => Vec::new(),
    };
    let specs: Vec<FieldSpec> = match &args.fields {
        Some(fields) => parse_fields(fields)?,
        None => default_field_specs(),
    };
    let type_filter: Option<RecordType> = args
        .record_type
        .as_deref()
        .map(RecordType::from_tag);

    let stdout = std::io::stdout();
    let mut printer: RecordPrinter<std::io::StdoutLock<'_>> =
        RecordPrinter::new(args.output.into(), specs.clone(), stdout.lock())?;
    let mut aggregator: Option<RecordAggregator> = match args.average {
        true => Some(RecordAggregator::new(&specs)),
        false => None,
    };

    let mut sequencer: LogSequencer =
        LogSequencer::new(args.logroot.clone(), window, args.blocksz, type_filter);
    for record in &mut sequencer {
        if !evaluate(&record, &clauses) {
            continue;
        }
        printer.print_record(&record)?;
        if let Some(aggregator) = &mut aggregator {
            aggregator.update(&record);
        }
    }
    printer.finish()?;
    if let Some(aggregator) = &aggregator {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        aggregator.write_summary(&mut out)?;
        out.flush()?;
    }
    if args.summary {
        print_processing_summary(&sequencer.summary);
    }

    Ok(())
}
