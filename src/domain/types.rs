//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - held in memory for the lifetime of the process (the loaded table)
//! - exported to JSON/CSV
//! - passed to any renderer (text, TUI) without conversion

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Classification of a forecast row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Forecast,
    Expense,
}

impl Category {
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Forecast => "Forecast",
            Category::Expense => "Expense",
        }
    }

    /// Parse an explicit category cell (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "forecast" => Some(Category::Forecast),
            "expense" | "expenses" => Some(Category::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Infer a row's category from its entity name.
///
/// An entity whose name contains `"Expense"` (case-sensitive) is an expense
/// line; everything else is a revenue forecast.
pub fn infer_category(entity: &str) -> Category {
    if entity.contains("Expense") {
        Category::Expense
    } else {
        Category::Forecast
    }
}

/// One normalized observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub entity: String,
    pub date: NaiveDate,
    pub forecast_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub category: Category,
}

impl ForecastRow {
    /// `lower_bound <= forecast_value <= upper_bound`.
    pub fn band_is_ordered(&self) -> bool {
        self.lower_bound <= self.forecast_value && self.forecast_value <= self.upper_bound
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Forecast => self.forecast_value,
            Metric::Lower => self.lower_bound,
            Metric::Upper => self.upper_bound,
        }
    }
}

/// The normalized contents of one forecast CSV.
///
/// Rows keep source file order. The table is never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastTable {
    pub source: PathBuf,
    pub rows: Vec<ForecastRow>,
    /// Interval percentage taken from the bound column header (e.g. `"30%"`).
    pub interval_label: Option<String>,
    /// Whether the file carried at least one confidence-bound column.
    pub has_bounds: bool,
}

impl ForecastTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All rows of one entity, sorted ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySeries {
    pub entity: String,
    pub category: Category,
    pub rows: Vec<ForecastRow>,
}

impl EntitySeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// `(date, value)` pairs for one metric, in date order.
    pub fn points(&self, metric: Metric) -> Vec<(NaiveDate, f64)> {
        self.rows.iter().map(|r| (r.date, r.metric(metric))).collect()
    }
}

/// Which value a bar chart plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Forecast,
    Lower,
    Upper,
}

impl Metric {
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Forecast => "Forecast",
            Metric::Lower => "lower",
            Metric::Upper => "upper",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Metric::Forecast => Metric::Lower,
            Metric::Lower => Metric::Upper,
            Metric::Upper => Metric::Forecast,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Metric::Forecast => Metric::Upper,
            Metric::Lower => Metric::Forecast,
            Metric::Upper => Metric::Lower,
        }
    }
}

/// How the selected series is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Table,
}

impl ChartKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ChartKind::Line => "Line Forecast",
            ChartKind::Bar => "Bar Forecast",
            ChartKind::Table => "Table View",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ChartKind::Line => ChartKind::Bar,
            ChartKind::Bar => ChartKind::Table,
            ChartKind::Table => ChartKind::Line,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ChartKind::Line => ChartKind::Table,
            ChartKind::Bar => ChartKind::Line,
            ChartKind::Table => ChartKind::Bar,
        }
    }
}

/// A user's selection, passed explicitly into the query layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub entity: String,
    pub chart: ChartKind,
    pub metric: Metric,
    pub show_band: bool,
}

/// Currency rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyStyle {
    /// `Rp 1,250,000`
    Grouped,
    /// `Rp 1M`
    Millions,
}
