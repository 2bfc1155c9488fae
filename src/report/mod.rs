//! Reporting: terminal tables and summaries.

pub mod format;

pub use format::*;
