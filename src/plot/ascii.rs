//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual checks in a terminal or a pipe
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - forecast points: `o`
//! - forecast line: `-`
//! - confidence band: `:`
//! - bars: `#`

use chrono::{Datelike, NaiveDate};

use crate::domain::{EntitySeries, Metric};
use crate::report::format_grouped;

/// Render the forecast line, optionally over its confidence band.
pub fn render_line_plot(series: &EntitySeries, show_band: bool, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let forecast = to_xy(series, Metric::Forecast);
    let lower = to_xy(series, Metric::Lower);
    let upper = to_xy(series, Metric::Upper);

    let (t_min, t_max) = x_range(&forecast);

    let mut values: Vec<f64> = forecast.iter().map(|&(_, y)| y).collect();
    if show_band {
        values.extend(lower.iter().map(|&(_, y)| y));
        values.extend(upper.iter().map(|&(_, y)| y));
    }
    let (y_min, y_max) = value_range(&values).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first, then the band only fills empty cells, so the line stays visible.
    draw_curve(&mut grid, &forecast, t_min, t_max, y_min, y_max);
    if show_band {
        fill_band(&mut grid, &lower, &upper, t_min, t_max, y_min, y_max);
    }
    for &(t, y) in &forecast {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        grid[yy][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | y=[{}, {}]\n",
        date_span(series),
        format_grouped(y_min),
        format_grouped(y_max),
    ));
    push_grid(&mut out, grid);
    out
}

/// Render one metric as vertical bars, one per date.
///
/// The grid widens to one column per date when `width` is too narrow.
pub fn render_bar_plot(series: &EntitySeries, metric: Metric, width: usize, height: usize) -> String {
    let values: Vec<f64> = series.rows.iter().map(|r| r.metric(metric)).collect();
    let width = width.max(10).max(values.len());
    let height = height.max(5);

    // Bars always grow from zero, so zero must be inside the range.
    let (lo, hi) = value_range(&values).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = (lo.min(0.0), hi.max(0.0));
    let (y_min, y_max) = if y_max > y_min { (y_min, y_max) } else { (0.0, 1.0) };

    let mut grid = vec![vec![' '; width]; height];
    let n = values.len().max(1);
    let slot = (width / n).max(1);
    let bar_w = slot.saturating_sub(1).max(1);
    let base = map_y(0.0, y_min, y_max, height);

    for (i, &v) in values.iter().enumerate() {
        let x0 = i * slot;
        let top = map_y(v, y_min, y_max, height);
        let (r0, r1) = (top.min(base), top.max(base));
        for row in grid.iter_mut().take(r1 + 1).skip(r0) {
            for cell in row.iter_mut().skip(x0).take(bar_w) {
                *cell = '#';
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | {} | y=[{}, {}]\n",
        metric.display_name(),
        date_span(series),
        format_grouped(y_min),
        format_grouped(y_max),
    ));
    push_grid(&mut out, grid);
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn date_span(series: &EntitySeries) -> String {
    match (series.first_date(), series.last_date()) {
        (Some(a), Some(b)) => format!("dates=[{a}, {b}]"),
        _ => "dates=[]".to_string(),
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn to_xy(series: &EntitySeries, metric: Metric) -> Vec<(f64, f64)> {
    series
        .points(metric)
        .into_iter()
        .map(|(d, v)| (day_number(d), v))
        .collect()
}

fn x_range(points: &[(f64, f64)]) -> (f64, f64) {
    let mut min_t = f64::INFINITY;
    let mut max_t = f64::NEG_INFINITY;
    for &(t, _) in points {
        min_t = min_t.min(t);
        max_t = max_t.max(t);
    }
    if !min_t.is_finite() || !max_t.is_finite() {
        return (0.0, 1.0);
    }
    if max_t <= min_t {
        return (min_t, min_t + 1.0);
    }
    (min_t, max_t)
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &v in values {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }
    if min_y.is_finite() && max_y.is_finite() {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 {
        span * frac
    } else {
        // Flat series: open up a band around the single level.
        (max.abs() * frac).max(1.0)
    };
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Fill `:` between the lower and upper series, column by column.
fn fill_band(
    grid: &mut [Vec<char>],
    lower: &[(f64, f64)],
    upper: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();

    for col in 0..width {
        let t = t_min + (col as f64 / (width as f64 - 1.0)) * (t_max - t_min);
        let (Some(lo), Some(hi)) = (interpolate(lower, t), interpolate(upper, t)) else {
            continue;
        };
        let top = map_y(lo.max(hi), y_min, y_max, height);
        let bottom = map_y(lo.min(hi), y_min, y_max, height);
        for row in grid.iter_mut().take(bottom + 1).skip(top) {
            if row[col] == ' ' {
                row[col] = ':';
            }
        }
    }
}

/// Linear interpolation over points sorted by `t`; `None` outside their span.
fn interpolate(points: &[(f64, f64)], t: f64) -> Option<f64> {
    if let [(t0, y0)] = points {
        return ((t - t0).abs() < 1e-9).then_some(*y0);
    }
    points.windows(2).find_map(|w| {
        let ((a, ya), (b, yb)) = (w[0], w[1]);
        if t < a || t > b {
            return None;
        }
        if b == a {
            return Some(ya);
        }
        Some(ya + (yb - ya) * (t - a) / (b - a))
    })
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
