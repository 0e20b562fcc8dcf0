// src/error.rs

//! Fatal error taxonomy for _qhlib_.
//!
//! Everything here aborts a query before any record is streamed, so a
//! request that was invalid from the start never produces partial output.
//! Per-record faults (a malformed line, a missing daily file) are _not_
//! represented here; those are absorbed where they occur and reported as
//! warnings on the diagnostic channel. See [`MalformedRecord`].
//!
//! [`MalformedRecord`]: crate::data::record::MalformedRecord

use crate::data::record::FieldKind;

use ::thiserror::Error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fatal errors surfaced to the caller of _qhlib_.
///
/// The caller (the `qh` binary) maps any of these to a non-zero exit code.
#[derive(Debug, Error)]
pub enum QhError {
    /// The resolved date window is empty or future-dated.
    #[error("invalid date window: {0}")]
    InvalidWindow(String),

    /// A filter or display field name not present in the field table.
    #[error("unknown field {0:?}")]
    UnknownField(String),

    /// A filter literal that cannot be coerced to its field's declared kind.
    #[error("invalid literal {literal:?} for {kind} field {field:?}")]
    InvalidLiteral {
        field: String,
        literal: String,
        kind: FieldKind,
    },

    /// A filter clause that does not parse as `field op literal`.
    #[error("invalid filter clause: {0}")]
    InvalidFilter(String),

    /// A display specifier incompatible with the field's kind,
    /// e.g. `@hms` on a text field.
    #[error("unsupported format specifier {spec:?} for {kind} field {field:?}")]
    UnsupportedFormatSpecifier {
        field: String,
        spec: String,
        kind: FieldKind,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type QhResult<T> = std::result::Result<T, QhError>;
