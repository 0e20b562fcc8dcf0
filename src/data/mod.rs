// src/data/mod.rs

//! The `data` module is the specialized data containers for _qhlib_:
//! accounting [`Record`]s and resolved [`DateWindow`]s.
//!
//! ## Definitions of data
//!
//! ### Record
//!
//! A "record" is one accounting event, one per log line:
//!
//! * begins with a `;`-delimited header of timestamp, record-type tag,
//!   and job id.
//! * carries a payload of space-delimited `key=value` fields.
//!
//! A "record" is represented by a [`Record`], decoded by
//! [`decode_line`], and found in a file by a [`LogReader`].
//!
//! ### Window
//!
//! A "window" is an inclusive start/end pair of calendar dates plus a
//! streaming direction. There is one accounting log file per calendar day,
//! so a window implies a concrete ordered set of files.
//!
//! A "window" is represented by a [`DateWindow`] and resolved by
//! [`resolve_window`]. A [`LogSequencer`] turns a window into one
//! continuous stream of records.
//!
//! [`Record`]: crate::data::record::Record
//! [`decode_line`]: crate::data::record::decode_line
//! [`LogReader`]: crate::readers::logreader::LogReader
//! [`DateWindow`]: crate::data::datetime::DateWindow
//! [`resolve_window`]: crate::data::datetime::resolve_window
//! [`LogSequencer`]: crate::readers::sequencer::LogSequencer

pub mod datetime;
pub mod record;
