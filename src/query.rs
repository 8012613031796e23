//! Stateless queries over a loaded `ForecastTable`.
//!
//! Every selection the user makes arrives as an explicit argument; nothing
//! here holds state between calls and the table is never mutated.

use std::collections::BTreeMap;

use crate::domain::{Category, ChartKind, EntitySeries, ForecastTable, Metric, ViewRequest};
use crate::error::AppError;

pub const DASHBOARD_TITLE: &str = "12-Month Forecast Dashboard";
pub const AMOUNT_LABEL: &str = "Amount (Rp)";

/// Distinct entities, sorted lexicographically.
pub fn list_entities(table: &ForecastTable) -> Vec<String> {
    entity_categories(table).into_iter().map(|(e, _)| e).collect()
}

/// Distinct entities with their category, sorted by entity.
///
/// The category is the one of the entity's earliest-dated row, the same row
/// `select_series` reports.
pub fn entity_categories(table: &ForecastTable) -> Vec<(String, Category)> {
    let mut first: BTreeMap<&str, (chrono::NaiveDate, Category)> = BTreeMap::new();
    for row in &table.rows {
        first
            .entry(row.entity.as_str())
            .and_modify(|cur| {
                if row.date < cur.0 {
                    *cur = (row.date, row.category);
                }
            })
            .or_insert((row.date, row.category));
    }
    first
        .into_iter()
        .map(|(entity, (_, category))| (entity.to_string(), category))
        .collect()
}

/// All rows of `entity`, stable-sorted ascending by date.
///
/// An entity with no rows is an error rather than an empty series.
pub fn select_series(table: &ForecastTable, entity: &str) -> Result<EntitySeries, AppError> {
    let mut rows: Vec<_> = table.rows.iter().filter(|r| r.entity == entity).cloned().collect();
    if rows.is_empty() {
        return Err(AppError::EntityNotFound {
            entity: entity.to_string(),
        });
    }

    // `sort_by_key` is stable: equal dates keep file order.
    rows.sort_by_key(|r| r.date);
    let category = rows[0].category;

    Ok(EntitySeries {
        entity: entity.to_string(),
        category,
        rows,
    })
}

/// A series plus everything a renderer needs to label it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesView {
    pub series: EntitySeries,
    pub chart: ChartKind,
    pub metric: Metric,
    /// Draw the confidence band (only true when the table carries bounds).
    pub show_band: bool,
    pub title: &'static str,
    pub subtitle: String,
    pub chart_title: String,
    pub band_label: String,
    pub y_label: &'static str,
}

/// Resolve a user's selection into a renderable view.
pub fn build_view(table: &ForecastTable, request: &ViewRequest) -> Result<SeriesView, AppError> {
    let series = select_series(table, &request.entity)?;

    let subtitle = format!("{} – {}", series.entity, series.category);
    let chart_title = match request.chart {
        ChartKind::Line => "Forecast with Confidence Interval".to_string(),
        ChartKind::Bar => format!("{} over Time", request.metric.display_name()),
        ChartKind::Table => "Forecast Table".to_string(),
    };
    let band_label = match &table.interval_label {
        Some(pct) => format!("±{pct} CI"),
        None => "Confidence band".to_string(),
    };

    Ok(SeriesView {
        series,
        chart: request.chart,
        metric: request.metric,
        show_band: request.show_band && table.has_bounds,
        title: DASHBOARD_TITLE,
        subtitle,
        chart_title,
        band_label,
        y_label: AMOUNT_LABEL,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::io::ingest::read_forecast_csv;

    fn table() -> ForecastTable {
        read_forecast_csv(
            concat!(
                "Villa,Date,Forecast,CI Lower (30%),CI Upper (30%)\n",
                "Villa B,2025-03-31,30,21,39\n",
                "Villa A - Expense,2025-02-28,5,3,7\n",
                "Villa B,2025-01-31,10,7,13\n",
                "Villa A,2025-01-31,1,1,1\n",
                "Villa B,2025-01-31,11,8,14\n",
                "Villa A,2025-02-28,2,2,2\n",
            )
            .as_bytes(),
            Path::new("q.csv"),
        )
        .unwrap()
    }

    #[test]
    fn entities_are_distinct_and_sorted() {
        let t = table();
        assert_eq!(list_entities(&t), vec!["Villa A", "Villa A - Expense", "Villa B"]);
    }

    #[test]
    fn entity_categories_pairs_each_entity() {
        let t = table();
        assert_eq!(
            entity_categories(&t),
            vec![
                ("Villa A".to_string(), Category::Forecast),
                ("Villa A - Expense".to_string(), Category::Expense),
                ("Villa B".to_string(), Category::Forecast),
            ]
        );
    }

    #[test]
    fn series_is_filtered_and_sorted_stably() {
        let t = table();
        let s = select_series(&t, "Villa B").unwrap();
        assert!(s.rows.iter().all(|r| r.entity == "Villa B"));
        assert!(s.rows.windows(2).all(|w| w[0].date <= w[1].date));
        // The two January rows keep their file order.
        let values: Vec<_> = s.rows.iter().map(|r| r.forecast_value).collect();
        assert_eq!(values, vec![10.0, 11.0, 30.0]);
    }

    #[test]
    fn series_does_not_touch_table() {
        let t = table();
        let before = t.clone();
        let mut s = select_series(&t, "Villa A").unwrap();
        s.rows.clear();
        assert_eq!(t, before);
        assert_eq!(select_series(&t, "Villa A").unwrap().len(), 2);
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let t = table();
        let err = select_series(&t, "Nonexistent Villa").unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound { ref entity } if entity == "Nonexistent Villa"));
    }

    #[test]
    fn view_labels_follow_selection() {
        let t = table();
        let view = build_view(
            &t,
            &ViewRequest {
                entity: "Villa A - Expense".to_string(),
                chart: ChartKind::Bar,
                metric: Metric::Upper,
                show_band: true,
            },
        )
        .unwrap();
        assert_eq!(view.subtitle, "Villa A - Expense – Expense");
        assert_eq!(view.chart_title, "upper over Time");
        assert_eq!(view.band_label, "±30% CI");
        assert!(view.show_band);
    }

    #[test]
    fn band_is_hidden_without_bound_columns() {
        let t = read_forecast_csv("Villa,Date,Forecast\nV,2025-01-01,1\n".as_bytes(), Path::new("x.csv")).unwrap();
        let view = build_view(
            &t,
            &ViewRequest {
                entity: "V".to_string(),
                chart: ChartKind::Line,
                metric: Metric::Forecast,
                show_band: true,
            },
        )
        .unwrap();
        assert!(!view.show_band);
        assert_eq!(view.band_label, "Confidence band");
    }
}
