// src/data/record.rs

//! Implements the accounting [`Record`]: the typed event decoded from one
//! log line, the per-field coercion table, and the pure line decoder
//! [`decode_line`].
//!
//! One log line is one accounting event:
//!
//! ```text
//! 04/13/2023 14:00:00;E;123456.pbs01;user=vanderwb queue=regular Resource_List.ncpus=36 …
//! ```
//!
//! The leading `;`-delimited header carries the wall-clock timestamp, the
//! record-type tag, and the job id; the payload is space-delimited
//! `key=value` tokens. Values are coerced per [`FIELD_KINDS`]; a value that
//! fails coercion is retained as raw text (with a note for the diagnostic
//! channel), only an unparseable header rejects the line.
//!
//! [`Record`]: self::Record
//! [`decode_line`]: self::decode_line
//! [`FIELD_KINDS`]: self::FIELD_KINDS

use crate::data::datetime::{datetime_from_header, DateTimeA};

use std::collections::HashMap;

use ::phf::phf_map;
use ::thiserror::Error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RecordType
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The event kind encoded in the second header field of each log line.
///
/// Closed set per the PBS accounting format. An unrecognized tag decodes
/// to [`Unknown`] rather than dropping the line, so downstream filters can
/// still reference the recognized fields.
///
/// [`Unknown`]: RecordType::Unknown
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordType {
    /// `Q`: job entered a queue
    Queue,
    /// `S`: job started
    Start,
    /// `E`: job ended
    End,
    /// `R`: job was requeued (rerun)
    Requeue,
    /// `D`: job was deleted
    Delete,
    /// `A`: job was aborted by the server
    Abort,
    /// `L`: license usage
    License,
    /// any other tag, kept verbatim
    Unknown(String),
}

impl RecordType {
    pub fn from_tag(tag: &str) -> RecordType {
        match tag {
            "Q" => RecordType::Queue,
            "S" => RecordType::Start,
            "E" => RecordType::End,
            "R" => RecordType::Requeue,
            "D" => RecordType::Delete,
            "A" => RecordType::Abort,
            "L" => RecordType::License,
            _ => RecordType::Unknown(String::from(tag)),
        }
    }

    /// The tag as logged, e.g. `"E"`.
    pub fn as_tag(&self) -> &str {
        match self {
            RecordType::Queue => "Q",
            RecordType::Start => "S",
            RecordType::End => "E",
            RecordType::Requeue => "R",
            RecordType::Delete => "D",
            RecordType::Abort => "A",
            RecordType::License => "L",
            RecordType::Unknown(tag) => tag.as_str(),
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FieldKind and the coercion table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Declared kind of a named field; decides how its raw text is coerced
/// and which filter literals and display specifiers it accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    /// `HH:MM:SS` or bare seconds, canonical unit seconds
    Duration,
    /// epoch seconds in the payload, wall-clock in the header
    Timestamp,
    /// scaled numeric with a `kb`/`mb`/`gb` style suffix,
    /// canonical unit bytes, stored as [`FieldValue::Float`]
    Memory,
}

impl std::fmt::Display for FieldKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name: &str = match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Duration => "duration",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// The closed field-coercion table: field name, exactly as logged
/// (case-sensitive), to declared [`FieldKind`].
///
/// Fields absent from this table are unknown to the filter compiler and
/// the formatter ([`UnknownField`]); the decoder keeps them as raw text.
///
/// The four pseudo-fields `record_type`, `job_id`, `short_id`, and
/// `timestamp` resolve on every record via [`Record::value`] and
/// participate in filters and display lists like logged fields.
///
/// [`FieldKind`]: self::FieldKind
/// [`UnknownField`]: crate::error::QhError::UnknownField
/// [`Record::value`]: self::Record#method.value
pub static FIELD_KINDS: phf::Map<&'static str, FieldKind> = phf_map! {
    // pseudo-fields from the line header
    "record_type" => FieldKind::Text,
    "job_id" => FieldKind::Text,
    "short_id" => FieldKind::Text,
    "timestamp" => FieldKind::Timestamp,
    // resource counts
    "Resource_List.ncpus" => FieldKind::Integer,
    "Resource_List.nodect" => FieldKind::Integer,
    "Resource_List.mpiprocs" => FieldKind::Integer,
    "Resource_List.ompthreads" => FieldKind::Integer,
    "resources_used.ncpus" => FieldKind::Integer,
    "resources_used.cpupercent" => FieldKind::Integer,
    "Exit_status" => FieldKind::Integer,
    "session" => FieldKind::Integer,
    "ncpus" => FieldKind::Integer,
    // walltime and cpu-time
    "Resource_List.walltime" => FieldKind::Duration,
    "resources_used.walltime" => FieldKind::Duration,
    "resources_used.cput" => FieldKind::Duration,
    // memory
    "Resource_List.mem" => FieldKind::Memory,
    "resources_used.mem" => FieldKind::Memory,
    "resources_used.vmem" => FieldKind::Memory,
    // event times in the payload (epoch seconds)
    "ctime" => FieldKind::Timestamp,
    "qtime" => FieldKind::Timestamp,
    "etime" => FieldKind::Timestamp,
    "start" => FieldKind::Timestamp,
    "end" => FieldKind::Timestamp,
    // plain text
    "user" => FieldKind::Text,
    "group" => FieldKind::Text,
    "account" => FieldKind::Text,
    "project" => FieldKind::Text,
    "queue" => FieldKind::Text,
    "jobname" => FieldKind::Text,
    "exec_host" => FieldKind::Text,
    "exec_vnode" => FieldKind::Text,
    "requestor" => FieldKind::Text,
    "Resource_List.select" => FieldKind::Text,
    "Resource_List.place" => FieldKind::Text,
    "Resource_List.jobtype" => FieldKind::Text,
    "metadata" => FieldKind::Text,
};

/// O(1), case-sensitive lookup of a field's declared kind.
pub fn field_kind(name: &str) -> Option<FieldKind> {
    FIELD_KINDS
        .get(name)
        .copied()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FieldValue
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A typed field value; the tagged-variant answer to the original
/// format's stringly-typed payload.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// canonical seconds
    Duration(i64),
    Timestamp(DateTimeA),
}

impl FieldValue {
    /// Coerce raw text to `kind`. `None` when the text does not parse;
    /// the caller decides whether that is fatal (header fields) or
    /// degrades to raw text (payload fields).
    pub fn coerce(
        kind: FieldKind,
        raw: &str,
    ) -> Option<FieldValue> {
        match kind {
            FieldKind::Text => Some(FieldValue::Text(String::from(raw))),
            FieldKind::Integer => raw
                .parse::<i64>()
                .ok()
                .map(FieldValue::Integer),
            FieldKind::Float => raw
                .parse::<f64>()
                .ok()
                .map(FieldValue::Float),
            FieldKind::Duration => duration_from_str(raw).map(FieldValue::Duration),
            FieldKind::Timestamp => timestamp_from_epoch(raw).map(FieldValue::Timestamp),
            FieldKind::Memory => memory_from_str(raw).map(FieldValue::Float),
        }
    }

    /// Idempotent re-coercion: an already-typed value is returned
    /// unchanged; only a raw [`Text`] value is re-parsed (and kept as-is
    /// when parsing fails).
    ///
    /// [`Text`]: FieldValue::Text
    pub fn recoerce(
        self,
        kind: FieldKind,
    ) -> FieldValue {
        match &self {
            FieldValue::Text(raw) if kind != FieldKind::Text => {
                FieldValue::coerce(kind, raw).unwrap_or(self)
            }
            _ => self,
        }
    }

    /// Numeric view for aggregation; durations in seconds, memory in
    /// bytes. `None` for text and timestamps.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(val) => Some(*val as f64),
            FieldValue::Float(val) => Some(*val),
            FieldValue::Duration(secs) => Some(*secs as f64),
            FieldValue::Text(_) | FieldValue::Timestamp(_) => None,
        }
    }

    /// Same-variant ordering for filter evaluation. Mixed variants
    /// (e.g. a coercion-failed raw text against an integer literal)
    /// compare as `None`, which a filter clause treats as no-match.
    pub fn partial_cmp_value(
        &self,
        other: &FieldValue,
    ) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Duration(a), FieldValue::Duration(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            FieldValue::Text(val) => write!(f, "{}", val),
            FieldValue::Integer(val) => write!(f, "{}", val),
            FieldValue::Float(val) => write!(f, "{}", val),
            FieldValue::Duration(secs) => write!(f, "{}", duration_to_hms(*secs)),
            FieldValue::Timestamp(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Parse `HH:MM:SS` (hours may exceed two digits), `MM:SS`, or bare
/// seconds, to canonical seconds.
pub fn duration_from_str(raw: &str) -> Option<i64> {
    if !raw.contains(':') {
        return raw.parse::<i64>().ok();
    }
    let mut secs: i64 = 0;
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() > 3 || parts.is_empty() {
        return None;
    }
    for part in parts.iter() {
        let val: i64 = part.parse::<i64>().ok()?;
        if val < 0 {
            return None;
        }
        // oversized components fail coercion, they do not wrap
        secs = secs
            .checked_mul(60)?
            .checked_add(val)?;
    }

    Some(secs)
}

/// Render canonical seconds as `H:MM:SS`.
pub fn duration_to_hms(secs: i64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Parse a memory quantity with an optional case-insensitive suffix
/// (`b`, `kb`, `mb`, `gb`, `tb`; no suffix means bytes) to bytes.
pub fn memory_from_str(raw: &str) -> Option<f64> {
    let lower: String = raw.to_ascii_lowercase();
    let (digits, scale): (&str, f64) = if let Some(d) = lower.strip_suffix("kb") {
        (d, 1024.0)
    } else if let Some(d) = lower.strip_suffix("mb") {
        (d, 1024.0 * 1024.0)
    } else if let Some(d) = lower.strip_suffix("gb") {
        (d, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(d) = lower.strip_suffix("tb") {
        (d, 1024.0 * 1024.0 * 1024.0 * 1024.0)
    } else if let Some(d) = lower.strip_suffix('b') {
        (d, 1.0)
    } else {
        (lower.as_str(), 1.0)
    };
    let val: f64 = digits.parse::<f64>().ok()?;
    if val < 0.0 {
        return None;
    }

    Some(val * scale)
}

/// Payload event times are epoch seconds.
fn timestamp_from_epoch(raw: &str) -> Option<DateTimeA> {
    let secs: i64 = raw.parse::<i64>().ok()?;
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One decoded accounting event. Immutable once constructed; no derived
/// value is ever written back onto a `Record`.
#[derive(Clone, Debug)]
pub struct Record {
    record_type: RecordType,
    timestamp: DateTimeA,
    job_id: String,
    /// numeric prefix of `job_id`, e.g. `123456` of `123456.pbs01`
    /// (array subjobs like `123456[7].pbs01` shorten the same way)
    short_id: String,
    fields: HashMap<String, FieldValue>,
}

impl Record {
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    pub fn timestamp(&self) -> &DateTimeA {
        &self.timestamp
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// Resolve a field by name: the four header pseudo-fields first,
    /// then the payload field map. `None` when the record does not carry
    /// the field.
    pub fn value(
        &self,
        name: &str,
    ) -> Option<FieldValue> {
        match name {
            "record_type" => Some(FieldValue::Text(String::from(self.record_type.as_tag()))),
            "job_id" => Some(FieldValue::Text(self.job_id.clone())),
            "short_id" => Some(FieldValue::Text(self.short_id.clone())),
            "timestamp" => Some(FieldValue::Timestamp(self.timestamp)),
            _ => self
                .fields
                .get(name)
                .cloned(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// line decoding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A line that cannot yield a valid [`Record`]. Never fatal to a stream:
/// the line is skipped, a warning goes to the diagnostic channel, and
/// streaming continues.
///
/// [`Record`]: self::Record
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MalformedRecord {
    #[error("line has fewer than three ';'-delimited header fields")]
    TruncatedHeader,
    #[error("unparseable timestamp {0:?}")]
    BadTimestamp(String),
    #[error("empty record-type tag")]
    MissingType,
    #[error("empty job id")]
    MissingJobId,
}

/// A payload value that failed coercion and was kept as raw text.
/// Reported on the diagnostic channel by the caller; never fatal.
#[derive(Debug, Eq, PartialEq)]
pub struct DecodeNote {
    pub field: String,
    pub raw: String,
    pub kind: FieldKind,
}

impl std::fmt::Display for DecodeNote {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "field {:?} value {:?} not parseable as {}; kept as text",
            self.field, self.raw, self.kind,
        )
    }
}

/// Cheap look at the record-type tag of a raw line, for record-type
/// push-down: the tag is tested before the payload is decoded at all.
pub fn peek_type_tag(line: &str) -> Option<&str> {
    let mut parts = line.splitn(3, ';');
    let _timestamp: &str = parts.next()?;
    let tag: &str = parts.next()?;
    match tag.is_empty() {
        true => None,
        false => Some(tag),
    }
}

/// Decode one raw log line into a [`Record`].
///
/// Pure; no I/O, no shared state. Fails only when a mandatory header
/// field (timestamp, type tag, job id) is missing or unparseable. Payload
/// values that fail coercion are kept as raw text and reported in the
/// returned [`DecodeNote`]s.
///
/// [`Record`]: self::Record
/// [`DecodeNote`]: self::DecodeNote
pub fn decode_line(line: &str) -> Result<(Record, Vec<DecodeNote>), MalformedRecord> {
    let line: &str = line.trim_end_matches(['\n', '\r']);
    let mut parts = line.splitn(4, ';');
    let timestamp_raw: &str = parts.next().unwrap_or("");
    let tag: &str = match parts.next() {
        Some(val) => val,
        None => return Err(MalformedRecord::TruncatedHeader),
    };
    let job_id: &str = match parts.next() {
        Some(val) => val,
        None => return Err(MalformedRecord::TruncatedHeader),
    };
    let payload: &str = parts.next().unwrap_or("");

    let timestamp: DateTimeA = match datetime_from_header(timestamp_raw) {
        Some(dt) => dt,
        None => return Err(MalformedRecord::BadTimestamp(String::from(timestamp_raw))),
    };
    if tag.is_empty() {
        return Err(MalformedRecord::MissingType);
    }
    if job_id.is_empty() {
        return Err(MalformedRecord::MissingJobId);
    }

    // continuation tokens are merged into their `key=value` pair first,
    // so the full raw value is what gets coerced
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut metadata: Vec<String> = Vec::new();
    for token in tokenize_payload(payload).into_iter() {
        match token.split_once('=') {
            Some((key, value)) => {
                pairs.push((String::from(key), String::from(unquote(value))));
            }
            None => match pairs.last_mut() {
                // an unquoted value with embedded whitespace continues
                // the previous value
                Some((_key, prev)) => {
                    prev.push(' ');
                    prev.push_str(&token);
                }
                // comma-delimited metadata preceding any `key=value`
                // token; embedded commas are opaque, not sub-delimited
                None => metadata.push(token),
            },
        }
    }

    let mut notes: Vec<DecodeNote> = Vec::new();
    let mut fields: HashMap<String, FieldValue> = HashMap::new();
    for (key, value) in pairs.into_iter() {
        let fv: FieldValue = match field_kind(&key) {
            Some(kind) => match FieldValue::coerce(kind, &value) {
                Some(fv) => fv,
                None => {
                    notes.push(DecodeNote {
                        field: key.clone(),
                        raw: value.clone(),
                        kind,
                    });
                    FieldValue::Text(value)
                }
            },
            None => FieldValue::Text(value),
        };
        fields.insert(key, fv);
    }
    if !metadata.is_empty() {
        fields.insert(String::from("metadata"), FieldValue::Text(metadata.join(" ")));
    }

    let short_id: String = short_id_of(job_id);

    Ok((
        Record {
            record_type: RecordType::from_tag(tag),
            timestamp,
            job_id: String::from(job_id),
            short_id,
            fields,
        },
        notes,
    ))
}

/// Numeric prefix of a full job id; the whole id when there is none.
fn short_id_of(job_id: &str) -> String {
    let digits: &str = {
        let end: usize = job_id
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(job_id.len());
        &job_id[..end]
    };
    match digits.is_empty() {
        true => String::from(job_id),
        false => String::from(digits),
    }
}

/// Split a payload on spaces, keeping double-quoted runs intact.
/// Quotes around a whole token value are stripped later by [`unquote`];
/// interior quotes are preserved verbatim.
///
/// [`unquote`]: self::unquote
fn tokenize_payload(payload: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut token: String = String::new();
    let mut in_quote: bool = false;
    for c in payload.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                token.push(c);
            }
            ' ' if !in_quote => {
                if !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                }
            }
            _ => token.push(c),
        }
    }
    if !token.is_empty() {
        tokens.push(token);
    }

    tokens
}

/// Strip one pair of surrounding double quotes, if present.
pub(crate) fn unquote(value: &str) -> &str {
    match value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        true => &value[1..value.len() - 1],
        false => value,
    }
}
