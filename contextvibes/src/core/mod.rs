//! Deterministic, pure logic shared by the commands.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod check;
pub mod config;
pub mod rules;
