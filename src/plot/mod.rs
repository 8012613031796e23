//! Plain-text chart rendering for the non-interactive front end.

pub mod ascii;

pub use ascii::*;
