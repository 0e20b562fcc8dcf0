// src/printer/printers.rs

//! Specialized printer struct [`RecordPrinter`] rendering [`Record`]s in
//! tabular, long-form, csv, or json mode.
//!
//! The display-field list is an ordered list of [`FieldSpec`]s with
//! optional per-field specifiers, `name[:width][.precision][@style]`:
//!
//! ```text
//! user:10  resources_used.walltime:10@hms  resources_used.mem:8.1@gb
//! ```
//!
//! Specifier/kind mismatches are rejected at printer setup
//! ([`UnsupportedFormatSpecifier`]), never per record. Records are
//! rendered one at a time off the stream; nothing is buffered.
//!
//! [`RecordPrinter`]: self::RecordPrinter
//! [`Record`]: crate::data::record::Record
//! [`FieldSpec`]: self::FieldSpec
//! [`UnsupportedFormatSpecifier`]: crate::error::QhError::UnsupportedFormatSpecifier

use crate::common::Count;
use crate::data::record::{
    duration_to_hms, field_kind, FieldKind, FieldValue, Record,
};
use crate::error::{QhError, QhResult};

use std::io::{Error, ErrorKind, Write};

use ::serde_json::{Map, Number, Value};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OutputMode, FieldStyle, FieldSpec
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// column headers and fixed-width rows
    Tabular,
    /// one labeled block per record
    Long,
    /// header row plus one row per record
    Csv,
    /// one JSON object per line
    Json,
}

/// Type-aware display style, the `@style` specifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldStyle {
    /// duration as `H:MM:SS`
    Hms,
    /// memory in gibibytes
    Gb,
    /// memory in mebibytes
    Mb,
    /// timestamp as bare date
    Date,
}

impl FieldStyle {
    fn from_token(token: &str) -> Option<FieldStyle> {
        match token {
            "hms" => Some(FieldStyle::Hms),
            "gb" => Some(FieldStyle::Gb),
            "mb" => Some(FieldStyle::Mb),
            "date" => Some(FieldStyle::Date),
            _ => None,
        }
    }
}

/// One display field with optional specifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub style: Option<FieldStyle>,
}

impl FieldSpec {
    /// A spec with no specifiers. Fails on a name not in the field table.
    pub fn named(name: &str) -> QhResult<FieldSpec> {
        let kind: FieldKind = match field_kind(name) {
            Some(kind) => kind,
            None => return Err(QhError::UnknownField(String::from(name))),
        };

        Ok(FieldSpec {
            name: String::from(name),
            kind,
            width: None,
            precision: None,
            style: None,
        })
    }

    /// Parse `name[:width][.precision][@style]`. Field names may contain
    /// dots (`Resource_List.ncpus`), so a precision must follow a `:`.
    pub fn parse(token: &str) -> QhResult<FieldSpec> {
        let (left, style_token): (&str, Option<&str>) = match token.split_once('@') {
            Some((left, style)) => (left, Some(style)),
            None => (token, None),
        };
        let (name, width_token): (&str, Option<&str>) = match left.split_once(':') {
            Some((name, width)) => (name, Some(width)),
            None => (left, None),
        };
        let mut spec: FieldSpec = FieldSpec::named(name)?;
        if let Some(width_token) = width_token {
            let (width, precision): (&str, Option<&str>) = match width_token.split_once('.') {
                Some((width, precision)) => (width, Some(precision)),
                None => (width_token, None),
            };
            if !width.is_empty() {
                spec.width = match width.parse::<usize>() {
                    Ok(width) => Some(width),
                    Err(_) => return Err(spec.unsupported(token)),
                };
            }
            if let Some(precision) = precision {
                spec.precision = match precision.parse::<usize>() {
                    Ok(precision) => Some(precision),
                    Err(_) => return Err(spec.unsupported(token)),
                };
            }
        }
        if let Some(style_token) = style_token {
            spec.style = match FieldStyle::from_token(style_token) {
                Some(style) => Some(style),
                None => return Err(spec.unsupported(token)),
            };
        }
        spec.validate()?;

        Ok(spec)
    }

    /// Check specifier/kind compatibility; called at printer setup.
    pub fn validate(&self) -> QhResult<()> {
        match self.style {
            Some(FieldStyle::Hms) if self.kind != FieldKind::Duration => {
                return Err(self.unsupported("@hms"));
            }
            Some(FieldStyle::Gb) | Some(FieldStyle::Mb) if self.kind != FieldKind::Memory => {
                return Err(self.unsupported("@gb/@mb"));
            }
            Some(FieldStyle::Date) if self.kind != FieldKind::Timestamp => {
                return Err(self.unsupported("@date"));
            }
            _ => {}
        }
        if self.precision.is_some()
            && !matches!(self.kind, FieldKind::Float | FieldKind::Memory)
        {
            return Err(self.unsupported("precision"));
        }

        Ok(())
    }

    fn unsupported(
        &self,
        spec: &str,
    ) -> QhError {
        QhError::UnsupportedFormatSpecifier {
            field: self.name.clone(),
            spec: String::from(spec),
            kind: self.kind,
        }
    }

    /// Column width for tabular mode when no width was given.
    fn default_width(&self) -> usize {
        let kind_width: usize = match self.kind {
            FieldKind::Text => 12,
            FieldKind::Integer => 8,
            FieldKind::Float => 10,
            FieldKind::Duration => 10,
            FieldKind::Timestamp => 19,
            FieldKind::Memory => 9,
        };
        std::cmp::max(kind_width, self.name.len())
    }
}

/// The out-of-the-box display list: what an accounting query prints when
/// the caller supplies no field list.
pub fn default_field_specs() -> Vec<FieldSpec> {
    let tokens: [&str; 8] = [
        "short_id:8",
        "record_type:4",
        "timestamp",
        "user:10",
        "queue:10",
        "Resource_List.ncpus:6",
        "resources_used.walltime:12@hms",
        "resources_used.mem:10.1@gb",
    ];
    let mut specs: Vec<FieldSpec> = Vec::with_capacity(tokens.len());
    for token in tokens.iter() {
        // every token names a field in the static table
        if let Ok(spec) = FieldSpec::parse(token) {
            specs.push(spec);
        }
    }

    specs
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// value formatting
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Truncate to at most `width` characters, always on a char boundary;
/// values are not guaranteed ASCII.
fn truncate_width(
    text: &mut String,
    width: usize,
) {
    if let Some((at, _)) = text.char_indices().nth(width) {
        text.truncate(at);
    }
}

/// Render one typed value per the spec's style and precision.
///
/// Memory fields default to gibibytes with one decimal; every other kind
/// defaults to the value's own `Display`.
fn format_value(
    spec: &FieldSpec,
    value: &FieldValue,
) -> String {
    match (spec.style, value) {
        (Some(FieldStyle::Hms), FieldValue::Duration(secs)) => duration_to_hms(*secs),
        (Some(FieldStyle::Gb), FieldValue::Float(bytes)) => {
            format!("{:.*}", spec.precision.unwrap_or(1), bytes / BYTES_PER_GB)
        }
        (Some(FieldStyle::Mb), FieldValue::Float(bytes)) => {
            format!("{:.*}", spec.precision.unwrap_or(1), bytes / BYTES_PER_MB)
        }
        (Some(FieldStyle::Date), FieldValue::Timestamp(dt)) => {
            dt.format("%Y-%m-%d").to_string()
        }
        (None, FieldValue::Float(val)) if spec.kind == FieldKind::Memory => {
            format!("{:.*}", spec.precision.unwrap_or(1), val / BYTES_PER_GB)
        }
        (_, FieldValue::Float(val)) => match spec.precision {
            Some(precision) => format!("{:.*}", precision, val),
            None => format!("{}", val),
        },
        _ => value.to_string(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RecordPrinter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

enum Sink<W: Write> {
    Plain(W),
    Csv(csv::Writer<W>),
}

/// Renders one [`Record`] at a time to a writer. Holds no record state;
/// the only memory across records is the header-written flag and a
/// counter.
///
/// [`Record`]: crate::data::record::Record
pub struct RecordPrinter<W: Write> {
    mode: OutputMode,
    specs: Vec<FieldSpec>,
    sink: Sink<W>,
    header_written: bool,
    pub records_printed: Count,
}

impl<W: Write> RecordPrinter<W> {
    /// Validates every spec up front; a specifier/kind mismatch fails
    /// here, before any record is streamed.
    pub fn new(
        mode: OutputMode,
        specs: Vec<FieldSpec>,
        out: W,
    ) -> QhResult<RecordPrinter<W>> {
        for spec in specs.iter() {
            spec.validate()?;
        }
        let sink: Sink<W> = match mode {
            OutputMode::Csv => Sink::Csv(csv::Writer::from_writer(out)),
            _ => Sink::Plain(out),
        };

        Ok(RecordPrinter {
            mode,
            specs,
            sink,
            header_written: false,
            records_printed: 0,
        })
    }

    pub fn print_record(
        &mut self,
        record: &Record,
    ) -> QhResult<()> {
        match self.mode {
            OutputMode::Tabular => self.print_tabular(record)?,
            OutputMode::Long => self.print_long(record)?,
            OutputMode::Csv => self.print_csv(record)?,
            OutputMode::Json => self.print_json(record)?,
        }
        self.records_printed += 1;

        Ok(())
    }

    /// Flush the underlying writer; call once after the stream ends.
    pub fn finish(&mut self) -> QhResult<()> {
        match &mut self.sink {
            Sink::Plain(out) => out.flush()?,
            Sink::Csv(writer) => writer.flush()?,
        }

        Ok(())
    }

    /// Flush and recover the underlying writer.
    pub fn into_inner(self) -> QhResult<W> {
        match self.sink {
            Sink::Plain(out) => Ok(out),
            Sink::Csv(writer) => writer
                .into_inner()
                .map_err(|err| QhError::Io(err.into_error())),
        }
    }

    fn plain(&mut self) -> &mut W {
        match &mut self.sink {
            Sink::Plain(out) => out,
            // unreachable by construction: only Csv mode builds a Csv sink
            Sink::Csv(_) => unreachable!("plain sink in csv mode"),
        }
    }

    fn print_tabular(
        &mut self,
        record: &Record,
    ) -> QhResult<()> {
        if !self.header_written {
            self.header_written = true;
            let mut header: Vec<String> = Vec::with_capacity(self.specs.len());
            let mut rule: Vec<String> = Vec::with_capacity(self.specs.len());
            for spec in self.specs.iter() {
                let width: usize = spec.width.unwrap_or_else(|| spec.default_width());
                let mut name: String = spec.name.clone();
                truncate_width(&mut name, width);
                header.push(format!("{:<width$}", name, width = width));
                rule.push("-".repeat(width));
            }
            let out = self.plain();
            writeln!(out, "{}", header.join(" "))?;
            writeln!(out, "{}", rule.join(" "))?;
        }
        let mut row: Vec<String> = Vec::with_capacity(self.specs.len());
        for spec in self.specs.iter() {
            let width: usize = spec.width.unwrap_or_else(|| spec.default_width());
            let mut cell: String = match record.value(&spec.name) {
                Some(value) => format_value(spec, &value),
                None => String::from("-"),
            };
            if spec.kind == FieldKind::Text {
                truncate_width(&mut cell, width);
            }
            let aligned: String = match spec.kind {
                FieldKind::Text | FieldKind::Timestamp => {
                    format!("{:<width$}", cell, width = width)
                }
                _ => format!("{:>width$}", cell, width = width),
            };
            row.push(aligned);
        }
        writeln!(self.plain(), "{}", row.join(" "))?;

        Ok(())
    }

    fn print_long(
        &mut self,
        record: &Record,
    ) -> QhResult<()> {
        let specs: &[FieldSpec] = &self.specs;
        let mut block: String = format!(
            "{} ({} at {})\n",
            record.job_id(),
            record.record_type(),
            record.timestamp().format("%Y-%m-%d %H:%M:%S"),
        );
        for spec in specs.iter() {
            let cell: String = match record.value(&spec.name) {
                Some(value) => format_value(spec, &value),
                None => String::from("-"),
            };
            block.push_str(&format!("    {:<28} = {}\n", spec.name, cell));
        }
        writeln!(self.plain(), "{}", block)?;

        Ok(())
    }

    fn print_csv(
        &mut self,
        record: &Record,
    ) -> QhResult<()> {
        let writer: &mut csv::Writer<W> = match &mut self.sink {
            Sink::Csv(writer) => writer,
            Sink::Plain(_) => unreachable!("csv sink in non-csv mode"),
        };
        if !self.header_written {
            self.header_written = true;
            writer
                .write_record(self.specs.iter().map(|spec| spec.name.as_str()))
                .map_err(csv_to_io)?;
        }
        let mut row: Vec<String> = Vec::with_capacity(self.specs.len());
        for spec in self.specs.iter() {
            row.push(match record.value(&spec.name) {
                Some(value) => format_value(spec, &value),
                None => String::new(),
            });
        }
        writer
            .write_record(row.iter().map(|cell| cell.as_str()))
            .map_err(csv_to_io)?;

        Ok(())
    }

    fn print_json(
        &mut self,
        record: &Record,
    ) -> QhResult<()> {
        let mut object: Map<String, Value> = Map::with_capacity(self.specs.len());
        for spec in self.specs.iter() {
            let value: Value = match record.value(&spec.name) {
                None => Value::Null,
                Some(value) => json_value(spec, &value),
            };
            object.insert(spec.name.clone(), value);
        }
        let line: String =
            serde_json::to_string(&Value::Object(object)).map_err(json_to_io)?;
        writeln!(self.plain(), "{}", line)?;

        Ok(())
    }
}

/// JSON rendering: typed where the default representation is typed,
/// strings where a style was requested.
fn json_value(
    spec: &FieldSpec,
    value: &FieldValue,
) -> Value {
    match (spec.style, value) {
        (Some(_), _) => Value::String(format_value(spec, value)),
        (None, FieldValue::Text(val)) => Value::String(val.clone()),
        (None, FieldValue::Integer(val)) => Value::Number(Number::from(*val)),
        (None, FieldValue::Float(val)) => match Number::from_f64(*val) {
            Some(num) => Value::Number(num),
            None => Value::Null,
        },
        // canonical seconds
        (None, FieldValue::Duration(secs)) => Value::Number(Number::from(*secs)),
        (None, FieldValue::Timestamp(dt)) => {
            Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        }
    }
}

fn csv_to_io(err: csv::Error) -> QhError {
    QhError::Io(Error::new(ErrorKind::Other, err))
}

fn json_to_io(err: serde_json::Error) -> QhError {
    QhError::Io(Error::new(ErrorKind::Other, err))
}
