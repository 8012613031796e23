//! Currency formatting and plain-text tables.
//!
//! We keep formatting code in one place so:
//! - the query layer stays free of presentation details
//! - the text front end and the TUI show identical numbers

use num_format::{Locale, ToFormattedString};

use crate::domain::{Category, CurrencyStyle, EntitySeries};
use crate::query::SeriesView;

const CURRENCY_PREFIX: &str = "Rp";

/// Format an amount in the given style.
///
/// Both styles round half to even to a whole unit (whole rupiah for
/// `Grouped`, whole millions for `Millions`).
pub fn format_currency(value: f64, style: CurrencyStyle) -> String {
    if !value.is_finite() {
        return format!("{CURRENCY_PREFIX} -");
    }
    match style {
        CurrencyStyle::Grouped => {
            let whole = value.round_ties_even() as i64;
            format!("{CURRENCY_PREFIX} {}", whole.to_formatted_string(&Locale::en))
        }
        CurrencyStyle::Millions => {
            let millions = (value / 1_000_000.0).round_ties_even() as i64;
            format!("{CURRENCY_PREFIX} {millions}M")
        }
    }
}

/// `Rp 1,250,000`
pub fn format_grouped(value: f64) -> String {
    format_currency(value, CurrencyStyle::Grouped)
}

/// `Rp 1M`
pub fn format_millions(value: f64) -> String {
    format_currency(value, CurrencyStyle::Millions)
}

/// Format the entity listing (`entities` command).
pub fn format_entity_list(entities: &[(String, Category)]) -> String {
    let width = entities
        .iter()
        .map(|(e, _)| e.chars().count())
        .max()
        .unwrap_or(0)
        .max("entity".len());

    let mut out = String::new();
    out.push_str(format!("{:<width$}  {}", "entity", "category").trim_end());
    out.push('\n');
    out.push_str(&format!("{:-<width$}  {:-<8}\n", "", ""));
    for (entity, category) in entities {
        out.push_str(format!("{entity:<width$}  {category}").trim_end());
        out.push('\n');
    }
    out
}

/// Header block printed above any view.
pub fn format_view_header(view: &SeriesView) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", view.title));
    out.push_str(&format!("{}\n", view.subtitle));
    out.push_str(&format!("{}\n", view.chart_title));
    if let (Some(first), Some(last)) = (view.series.first_date(), view.series.last_date()) {
        out.push_str(&format!("Dates: {first} .. {last} | rows={}\n", view.series.len()));
    }
    out
}

/// Format the series as a currency table (`date`, `Forecast`, `lower`, `upper`).
pub fn format_series_table(series: &EntitySeries) -> String {
    let mut out = String::new();
    out.push_str(
        format!("{:<10} {:>18} {:>18} {:>18}", "date", "Forecast", "lower", "upper").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<18} {:-<18} {:-<18}", "", "", "", "").trim_end());
    out.push('\n');

    for row in &series.rows {
        out.push_str(
            format!(
                "{:<10} {:>18} {:>18} {:>18}",
                row.date.format("%Y-%m-%d"),
                format_grouped(row.forecast_value),
                format_grouped(row.lower_bound),
                format_grouped(row.upper_bound),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}
