//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - resolves the data file
//! - dispatches to the TUI or a one-shot command

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ShowArgs, SourceArgs};
use crate::config::DashboardConfig;
use crate::domain::ViewRequest;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `villa-forecast` binary.
pub fn run() -> Result<(), AppError> {
    // We want `villa-forecast` and `villa-forecast -f x.csv` to behave like
    // `villa-forecast tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // Log lines would tear the alternate screen, so the TUI stays silent
    // unless RUST_LOG asks otherwise.
    let default_filter = match cli.command {
        Command::Tui(_) => "off",
        _ => "warn",
    };
    init_logging(default_filter);

    let result = match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Entities(args) => handle_entities(args),
        Command::Show(args) => handle_show(args),
    };

    if let Err(err) = &result {
        debug!(exit_code = err.exit_code(), error = %err, "command failed");
    }
    result
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_tui(args: SourceArgs) -> Result<(), AppError> {
    let config = DashboardConfig::from_env(args.file);
    let table = pipeline::load_table(&config)?;
    crate::tui::run(table)
}

fn handle_entities(args: SourceArgs) -> Result<(), AppError> {
    let config = DashboardConfig::from_env(args.file);
    let table = pipeline::load_table(&config)?;
    let entities = crate::query::entity_categories(&table);
    print!("{}", crate::report::format_entity_list(&entities));
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let config = DashboardConfig::from_env(args.source.file.clone());
    let request = ViewRequest {
        entity: args.entity.clone(),
        chart: args.chart,
        metric: args.metric,
        show_band: !args.no_band,
    };
    let out = pipeline::run_view(&config, &request)?;

    print!("{}", pipeline::render_text(&out.view, args.width, args.height));

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_series_csv(path, &out.view.series)?;
    }
    if let Some(path) = &args.json {
        crate::io::export::write_series_json(path, &out.view.series)?;
    }

    Ok(())
}

/// Rewrite argv so `villa-forecast` defaults to `villa-forecast tui`.
///
/// Rules:
/// - `villa-forecast`                     -> `villa-forecast tui`
/// - `villa-forecast -f x.csv ...`        -> `villa-forecast tui -f x.csv ...`
/// - `villa-forecast --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "entities" | "show");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["vf"])), argv(&["vf", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["vf", "-f", "x.csv"])),
            argv(&["vf", "tui", "-f", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_untouched() {
        for args in [
            argv(&["vf", "show", "-e", "Villa A"]),
            argv(&["vf", "entities"]),
            argv(&["vf", "--help"]),
            argv(&["vf", "-V"]),
            argv(&["vf", "bogus"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }
}
