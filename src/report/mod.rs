//! Output writers for the merged dependency list.
//!
//! - [`csv`]: semicolon-delimited file, one row per dependency.
//! - [`json`]: pretty-printed JSON array, to a file or stdout.
//! - [`terminal`]: colored table with a per-license summary.

pub mod csv;
pub mod json;
pub mod terminal;
