// src/readers/mod.rs

//! "Readers" for _qhlib_.
//!
//! ## Overview of readers
//!
//! * A [`LogSequencer`] resolves a [`DateWindow`] into daily files and
//!   drives one [`LogReader`] at a time.
//! * A `LogReader` drives a [`ForwardLineReader`] or a
//!   [`ReverseLineReader`] to derive [`Record`]s from raw lines.
//!
//! Every stage is pull-based and single-pass: each `next` call does at
//! most one buffered disk read, no stage buffers more than one record,
//! and at most one file descriptor is open per query. A reader owns its
//! file handle and releases it on drop, so a caller that stops pulling
//! early releases the file promptly.
//!
//! _These are not rust "Readers"; these structs do not implement the
//! trait [`Read`]. These are "readers" in an informal sense._
//!
//! [`LogSequencer`]: crate::readers::sequencer::LogSequencer
//! [`DateWindow`]: crate::data::datetime::DateWindow
//! [`LogReader`]: crate::readers::logreader::LogReader
//! [`ForwardLineReader`]: crate::readers::linereader::ForwardLineReader
//! [`ReverseLineReader`]: crate::readers::linereader::ReverseLineReader
//! [`Record`]: crate::data::record::Record
//! [`Read`]: std::io::Read

pub mod linereader;
pub mod logreader;
pub mod sequencer;
pub mod summary;
