//! Command-line parsing for the forecast dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! loading, querying, and rendering.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ChartKind, Metric};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "villa-forecast", version, about = "12-month villa forecast dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    Tui(SourceArgs),
    /// List the entities in the forecast file with their category.
    Entities(SourceArgs),
    /// Print one entity's chart or table and optionally export its series.
    Show(ShowArgs),
}

/// Where to read the forecast table from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Forecast CSV (defaults to $FORECAST_CSV, then Total_Forecast.csv).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,
}

/// Options for a single rendered view.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Entity (villa/unit) to show, exactly as it appears in the file.
    #[arg(short = 'e', long)]
    pub entity: String,

    /// Chart style.
    #[arg(short = 'c', long, value_enum, default_value_t = ChartKind::Line)]
    pub chart: ChartKind,

    /// Metric plotted by the bar chart.
    #[arg(short = 'm', long, value_enum, default_value_t = Metric::Forecast)]
    pub metric: Metric,

    /// Hide the confidence band on the line chart.
    #[arg(long)]
    pub no_band: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the selected series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the selected series to JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}
