// src/tests/mod.rs

//! Unit tests for _qhlib_.

pub mod common;

mod linereader_tests;
mod logreader_tests;
mod sequencer_tests;
