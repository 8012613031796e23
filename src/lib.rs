//! `villa-forecast` library crate.
//!
//! The binary is a thin wrapper around this library so that loading,
//! querying and rendering stay testable without spawning processes or a
//! terminal.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod query;
pub mod report;
pub mod store;
pub mod tui;
