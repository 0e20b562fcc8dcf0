// src/debug/mod.rs

//! Diagnostic printing macros for _qhlib_.
//!
//! Warnings and errors go to the stderr channel, never stdout;
//! stdout carries record output only.

pub mod printers;
