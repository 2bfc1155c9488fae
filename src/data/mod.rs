//! Synthetic light-curve generation.

pub mod synthetic;

pub use synthetic::*;
