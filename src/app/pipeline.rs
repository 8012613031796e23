//! Shared "load -> query -> render" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! cached table load -> entity selection -> labelled view
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::domain::{ChartKind, ForecastTable, ViewRequest};
use crate::error::AppError;
use crate::query::{SeriesView, build_view};

/// All computed outputs of a single view request.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub table: Arc<ForecastTable>,
    pub view: SeriesView,
}

/// Load (or reuse) the configured forecast table.
pub fn load_table(config: &DashboardConfig) -> Result<Arc<ForecastTable>, AppError> {
    crate::store::load(&config.data_path)
}

/// Load the table and resolve one view request against it.
pub fn run_view(config: &DashboardConfig, request: &ViewRequest) -> Result<ViewOutput, AppError> {
    let table = load_table(config)?;
    let view = build_view(&table, request)?;
    Ok(ViewOutput { table, view })
}

/// Render a view as plain text: header block followed by the chart or table.
pub fn render_text(view: &SeriesView, width: usize, height: usize) -> String {
    let mut out = crate::report::format_view_header(view);
    out.push('\n');

    let body = match view.chart {
        ChartKind::Line => crate::plot::render_line_plot(&view.series, view.show_band, width, height),
        ChartKind::Bar => crate::plot::render_bar_plot(&view.series, view.metric, width, height),
        ChartKind::Table => crate::report::format_series_table(&view.series),
    };
    out.push_str(&body);

    if view.chart == ChartKind::Line && view.show_band {
        out.push_str(&format!("(':' = {})\n", view.band_label));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::domain::Metric;

    fn config_with(contents: &str) -> (tempfile::TempDir, DashboardConfig) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Total_Forecast.csv");
        fs::write(&path, contents).unwrap();
        (dir, DashboardConfig { data_path: path })
    }

    fn request(entity: &str, chart: ChartKind) -> ViewRequest {
        ViewRequest {
            entity: entity.to_string(),
            chart,
            metric: Metric::Forecast,
            show_band: true,
        }
    }

    #[test]
    fn table_view_renders_currency() {
        let (_dir, config) = config_with(concat!(
            "Villa,Date,Forecast,CI Lower (30%),CI Upper (30%)\n",
            "Villa A,2025-02-28,1250000,875000,1625000\n",
            "Villa A,2025-01-31,1000000,700000,1300000\n",
        ));
        let out = run_view(&config, &request("Villa A", ChartKind::Table)).unwrap();
        let text = render_text(&out.view, 40, 10);

        assert!(text.starts_with("=== 12-Month Forecast Dashboard ===\nVilla A – Forecast\n"));
        let jan = text.find("2025-01-31").unwrap();
        let feb = text.find("2025-02-28").unwrap();
        assert!(jan < feb);
        assert!(text.contains("Rp 1,250,000"));
    }

    #[test]
    fn line_view_mentions_band_legend() {
        let (_dir, config) = config_with(concat!(
            "Villa,Date,Forecast,CI Lower (30%),CI Upper (30%)\n",
            "Villa A,2025-01-31,100,70,130\n",
            "Villa A,2025-02-28,200,140,260\n",
        ));
        let out = run_view(&config, &request("Villa A", ChartKind::Line)).unwrap();
        let text = render_text(&out.view, 20, 8);
        assert!(text.ends_with("(':' = ±30% CI)\n"));
    }

    #[test]
    fn unknown_entity_surfaces_error() {
        let (_dir, config) = config_with("Villa,Date,Forecast\nVilla A,2025-01-31,1\n");
        let err = run_view(&config, &request("Nonexistent Villa", ChartKind::Line)).unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound { .. }));
    }
}
