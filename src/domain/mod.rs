//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the normalized table (`ForecastTable`, `ForecastRow`, `Category`)
//! - per-entity query output (`EntitySeries`)
//! - selection parameters (`ViewRequest`, `ChartKind`, `Metric`, `CurrencyStyle`)

pub mod types;

pub use types::*;
