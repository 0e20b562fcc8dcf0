// src/printer/mod.rs

//! Printing for _qhlib_: rendering filtered [`Record`]s in one of four
//! output modes, and the streaming numeric aggregator.
//!
//! [`Record`]: crate::data::record::Record

pub mod printers;
pub mod summary;
