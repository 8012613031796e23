//! Reporting utilities: currency formatting and plain-text tables.

pub mod format;

pub use format::*;
