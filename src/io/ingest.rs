//! CSV ingest and normalization.
//!
//! This module is responsible for turning a forecast CSV into a clean
//! `ForecastTable`: canonical field names, parsed dates, filled-in confidence
//! bounds, and a category on every row.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 3)
//! - **All-or-nothing**: any bad row fails the whole load, no partial table
//! - **Deterministic behavior** (rows keep file order, no hidden defaults)
//! - **Separation of concerns**: no caching or querying here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{Category, ForecastRow, ForecastTable, infer_category};
use crate::error::AppError;

/// Accepted headers for the entity column, in priority order.
const ENTITY_HEADERS: [&str; 4] = ["villa", "entity", "unit", "property"];
const DATE_HEADER: &str = "date";
const FORECAST_HEADER: &str = "forecast";
const CATEGORY_HEADERS: [&str; 2] = ["type", "category"];

const LOWER_ALIASES: [&str; 3] = ["lower", "lower_bound", "lowerbound"];
const UPPER_ALIASES: [&str; 3] = ["upper", "upper_bound", "upperbound"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundSide {
    Lower,
    Upper,
}

/// Resolved column positions for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    entity: usize,
    date: usize,
    forecast: usize,
    lower: Option<usize>,
    upper: Option<usize>,
    category: Option<usize>,
    interval_label: Option<String>,
}

/// Open and normalize the forecast CSV at `path`.
pub fn load_forecast_csv(path: &Path) -> Result<ForecastTable, AppError> {
    if !path.is_file() {
        return Err(AppError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound {
            path: path.to_path_buf(),
        },
        _ => AppError::io(format!("Failed to open CSV '{}'", path.display()), e),
    })?;

    read_forecast_csv(file, path)
}

/// Normalize forecast CSV contents read from `reader`.
///
/// `source` is only used for error messages and recorded on the table.
pub fn read_forecast_csv<R: Read>(reader: R, source: &Path) -> Result<ForecastTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::parse(source, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let columns = resolve_columns(&headers).map_err(|msg| AppError::parse(source, msg))?;
    if columns.lower.is_some() != columns.upper.is_some() {
        warn!(
            source = %source.display(),
            "only one confidence-bound column present; the other side defaults to the forecast"
        );
    }

    let mut rows = Vec::new();
    // Category and line of each entity's first row.
    let mut categories: HashMap<String, (Category, usize)> = HashMap::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;

        let record = result
            .map_err(|e| AppError::parse(source, format!("line {line}: CSV parse error: {e}")))?;

        let row = parse_row(&record, &columns)
            .map_err(|msg| AppError::parse(source, format!("line {line}: {msg}")))?;

        let (first, first_line) = *categories
            .entry(row.entity.clone())
            .or_insert((row.category, line));
        if first != row.category {
            return Err(AppError::parse(
                source,
                format!(
                    "line {line}: entity '{}' is {} but was {} on line {first_line}",
                    row.entity, row.category, first
                ),
            ));
        }
        rows.push(row);
    }

    let unordered = rows.iter().filter(|r| !r.band_is_ordered()).count();
    if unordered > 0 {
        warn!(
            source = %source.display(),
            rows = unordered,
            "rows with lower <= forecast <= upper violated"
        );
    }

    debug!(
        source = %source.display(),
        rows = rows.len(),
        has_bounds = columns.lower.is_some() || columns.upper.is_some(),
        "normalized forecast table"
    );

    Ok(ForecastTable {
        source: source.to_path_buf(),
        rows,
        has_bounds: columns.lower.is_some() || columns.upper.is_some(),
        interval_label: columns.interval_label,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, String> {
    let header_map = build_header_map(headers);

    let entity = ENTITY_HEADERS
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| "Missing required entity column: one of `Villa`, `Entity`, `Unit`, `Property`".to_string())?;
    let date = header_map
        .get(DATE_HEADER)
        .copied()
        .ok_or_else(|| "Missing required column: `Date`".to_string())?;
    let forecast = header_map
        .get(FORECAST_HEADER)
        .copied()
        .ok_or_else(|| "Missing required column: `Forecast`".to_string())?;
    let category = CATEGORY_HEADERS
        .iter()
        .find_map(|name| header_map.get(*name).copied());

    let mut lower = None;
    let mut upper = None;
    let mut interval_label = None;
    for (idx, raw) in headers.iter().enumerate() {
        let Some((side, label)) = parse_bound_header(&normalize_header_name(raw)) else {
            continue;
        };
        let slot = match side {
            BoundSide::Lower => &mut lower,
            BoundSide::Upper => &mut upper,
        };
        if slot.is_none() {
            *slot = Some(idx);
            if interval_label.is_none() {
                interval_label = label;
            }
        }
    }

    Ok(ColumnMap {
        entity,
        date,
        forecast,
        lower,
        upper,
        category,
        interval_label,
    })
}

/// Recognize a confidence-bound header.
///
/// Accepts `ci lower (30%)` / `ci upper (30%)` with any percentage, plus the
/// plain aliases. `name` must already be normalized (trimmed, lowercase).
fn parse_bound_header(name: &str) -> Option<(BoundSide, Option<String>)> {
    if LOWER_ALIASES.contains(&name) {
        return Some((BoundSide::Lower, None));
    }
    if UPPER_ALIASES.contains(&name) {
        return Some((BoundSide::Upper, None));
    }

    let rest = name.strip_prefix("ci")?.trim_start();
    let (side, rest) = if let Some(rest) = rest.strip_prefix("lower") {
        (BoundSide::Lower, rest)
    } else if let Some(rest) = rest.strip_prefix("upper") {
        (BoundSide::Upper, rest)
    } else {
        return None;
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Some((side, None));
    }
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?.trim();
    let pct = inner.strip_suffix('%')?.trim();
    if pct.is_empty() || pct.parse::<f64>().is_err() {
        return None;
    }
    Some((side, Some(format!("{pct}%"))))
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<ForecastRow, String> {
    let entity = get_required(record, columns.entity, "entity")?.to_string();
    let date = parse_date(get_required(record, columns.date, "Date")?)?;
    let forecast_value = parse_amount(get_required(record, columns.forecast, "Forecast")?, "Forecast")?;

    let lower_bound = match columns.lower.and_then(|idx| get_optional(record, idx)) {
        Some(s) => parse_amount(s, "lower")?,
        None => forecast_value,
    };
    let upper_bound = match columns.upper.and_then(|idx| get_optional(record, idx)) {
        Some(s) => parse_amount(s, "upper")?,
        None => forecast_value,
    };

    let category = match columns.category.and_then(|idx| get_optional(record, idx)) {
        Some(label) => Category::from_label(label)
            .ok_or_else(|| format!("Invalid category '{label}'. Expected `Forecast` or `Expense`."))?,
        None => infer_category(&entity),
    };

    Ok(ForecastRow {
        entity,
        date,
        forecast_value,
        lower_bound,
        upper_bound,
        category,
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    get_optional(record, idx).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Slash and dash dates are month-first; day-first is only tried when the
    // month-first reading is impossible (e.g. `31/01/2025`).
    const DATE_FMTS: [&str; 6] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY-MM-DD[ T]HH:MM:SS, YYYY/MM/DD, MM/DD/YYYY, MM-DD-YYYY."
    ))
}

fn parse_amount(s: &str, name: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value '{s}' (expected a finite number).")),
    }
}
