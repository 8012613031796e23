//! Ratatui-based terminal dashboard.
//!
//! The sidebar holds the entity picker and the view settings (chart style,
//! bar metric, confidence band); the main pane renders the selected view as a
//! Plotters chart or a currency table.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};
use tracing::debug;

use crate::domain::{ChartKind, ForecastTable, Metric, ViewRequest};
use crate::error::AppError;
use crate::query::{SeriesView, build_view, list_entities};
use crate::report::{format_grouped, format_millions};

mod plotters_chart;

use plotters_chart::{ChartShape, ForecastPlottersChart};

/// Start the TUI over an already-loaded table.
pub fn run(table: Arc<ForecastTable>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).map_err(AppError::terminal)?;

    let mut app = App::new(table)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Sidebar section receiving `↑/↓` and `←/→`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Entities,
    Chart,
    Metric,
    Band,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Entities => Focus::Chart,
            Focus::Chart => Focus::Metric,
            Focus::Metric => Focus::Band,
            Focus::Band => Focus::Entities,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Entities => Focus::Band,
            Focus::Chart => Focus::Entities,
            Focus::Metric => Focus::Chart,
            Focus::Band => Focus::Metric,
        }
    }
}

struct App {
    table: Arc<ForecastTable>,
    focus: Focus,
    entities: Vec<String>,
    selected: usize,
    chart: ChartKind,
    metric: Metric,
    show_band: bool,
    status: String,
    view: Option<SeriesView>,
}

impl App {
    fn new(table: Arc<ForecastTable>) -> Result<Self, AppError> {
        let entities = list_entities(&table);
        let status = row_status(&table);
        let mut app = Self {
            table,
            focus: Focus::Entities,
            entities,
            selected: 0,
            chart: ChartKind::Line,
            metric: Metric::Forecast,
            show_band: true,
            status,
            view: None,
        };
        app.refresh_view()?;
        Ok(app)
    }

    fn request(&self) -> Option<ViewRequest> {
        let entity = self.entities.get(self.selected)?;
        Some(ViewRequest {
            entity: entity.clone(),
            chart: self.chart,
            metric: self.metric,
            show_band: self.show_band,
        })
    }

    /// Recompute the view from the current selection.
    fn refresh_view(&mut self) -> Result<(), AppError> {
        self.view = match self.request() {
            Some(request) => {
                debug!(entity = %request.entity, chart = ?request.chart, "rebuilding view");
                Some(build_view(&self.table, &request)?)
            }
            None => None,
        };
        Ok(())
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f)).map_err(AppError::terminal)?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(AppError::terminal)? {
                continue;
            }

            match event::read().map_err(AppError::terminal)? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply one key press. Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        self.status = row_status(&self.table);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return Ok(false);
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return Ok(false);
            }
            KeyCode::Up | KeyCode::Down => {
                let forward = code == KeyCode::Down;
                match self.focus {
                    Focus::Entities => self.move_selection(forward),
                    Focus::Chart => self.step_chart(forward),
                    Focus::Metric => self.step_metric(forward),
                    Focus::Band => self.toggle_band(),
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let forward = code == KeyCode::Right;
                match self.focus {
                    Focus::Metric => self.step_metric(forward),
                    _ => self.step_chart(forward),
                }
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.entities.len().saturating_sub(1),
            KeyCode::Char('c') => self.step_chart(true),
            KeyCode::Char('m') => self.step_metric(true),
            KeyCode::Char(' ') | KeyCode::Char('b') => self.toggle_band(),
            _ => return Ok(false),
        }

        self.refresh_view()?;
        Ok(false)
    }

    fn move_selection(&mut self, forward: bool) {
        if forward {
            if self.selected + 1 < self.entities.len() {
                self.selected += 1;
            }
        } else {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    fn step_chart(&mut self, forward: bool) {
        self.chart = if forward { self.chart.next() } else { self.chart.prev() };
    }

    fn step_metric(&mut self, forward: bool) {
        self.metric = if forward { self.metric.next() } else { self.metric.prev() };
    }

    fn toggle_band(&mut self) {
        self.show_band = !self.show_band;
        if self.show_band && !self.table.has_bounds {
            self.status = "No confidence-bound columns in this file.".to_string();
        }
    }

    fn section_block(&self, title: &'static str, section: Focus) -> Block<'static> {
        let block = Block::default().title(title).borders(Borders::ALL);
        if self.focus == section {
            block.border_style(Style::default().fg(Color::Cyan))
        } else {
            block
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(size);

        self.draw_sidebar(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(columns[1]);

        self.draw_header(frame, rows[0]);
        self.draw_body(frame, rows[1]);
        self.draw_footer(frame, rows[2]);
    }

    fn draw_sidebar(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        let items: Vec<ListItem> = self.entities.iter().map(|e| ListItem::new(e.as_str())).collect();
        let list = List::new(items)
            .block(self.section_block("Select Villa", Focus::Entities))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if !self.entities.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let band = if self.show_band { "on" } else { "off" };
        let settings = [
            ("Chart Type", Focus::Chart, self.chart.display_name()),
            ("Bar Metric", Focus::Metric, self.metric.display_name()),
            ("Confidence Band", Focus::Band, band),
        ];
        for (chunk, (title, section, value)) in chunks[1..].iter().zip(settings) {
            let p = Paragraph::new(format!("‹ {value} ›")).block(self.section_block(title, section));
            frame.render_widget(p, *chunk);
        }
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(Span::styled(
            crate::query::DASHBOARD_TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));

        match &self.view {
            Some(view) => {
                lines.push(Line::from(view.subtitle.as_str()));
                let range = match (view.series.first_date(), view.series.last_date()) {
                    (Some(a), Some(b)) => format!("{a} → {b}"),
                    _ => "-".to_string(),
                };
                lines.push(Line::from(Span::styled(
                    format!("{} | {range} | n={}", view.chart_title, view.series.len()),
                    Style::default().fg(Color::Gray),
                )));
            }
            None => lines.push(Line::from(Span::styled(
                "No entities in forecast file.",
                Style::default().fg(Color::Yellow),
            ))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(view) = &self.view else {
            let msg = Paragraph::new("Nothing to show.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        };

        match view.chart {
            ChartKind::Table => draw_table(frame, area, view),
            ChartKind::Line | ChartKind::Bar => draw_chart(frame, area, view),
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab section  ↑/↓ move  ←/→ chart/metric  Space band  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn row_status(table: &ForecastTable) -> String {
    format!("{} rows from {}", table.len(), table.source.display())
}

fn draw_table(frame: &mut ratatui::Frame<'_>, area: Rect, view: &SeriesView) {
    let header = Row::new(vec!["Date", "Forecast", "lower", "upper"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = view
        .series
        .rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.date.format("%Y-%m-%d").to_string()),
                Cell::from(Line::from(format_grouped(r.forecast_value)).alignment(Alignment::Right)),
                Cell::from(Line::from(format_grouped(r.lower_bound)).alignment(Alignment::Right)),
                Cell::from(Line::from(format_grouped(r.upper_bound)).alignment(Alignment::Right)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(Block::default().title(view.chart_title.as_str()).borders(Borders::ALL));

    frame.render_widget(table, area);
}

fn draw_chart(frame: &mut ratatui::Frame<'_>, area: Rect, view: &SeriesView) {
    let block = Block::default().title(view.chart_title.as_str()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let data = chart_series(view);
    let (chart_rect, insets) = chart_layout(inner);
    let widget = ForecastPlottersChart {
        shape: &data.shape,
        x_bounds: data.x_bounds,
        y_bounds: data.y_bounds,
        x_label: "date",
        y_label: view.y_label,
        fmt_x: fmt_axis_date,
        fmt_y: format_millions,
    };

    frame.render_widget(widget, chart_rect);
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, data.x_bounds, data.y_bounds, view.y_label);
    }
}

/// Series and bounds for one chart, in Plotters coordinates (x = day number).
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    shape: ChartShape,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Build chart series for Plotters.
fn chart_series(view: &SeriesView) -> ChartData {
    let series = &view.series;
    let xs: Vec<f64> = series.rows.iter().map(|r| day_number(r.date)).collect();

    // Half of the tightest date spacing, so bars never overlap.
    let min_gap = xs
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|g| *g > 0.0)
        .fold(f64::INFINITY, f64::min);
    let half_width = if min_gap.is_finite() { (min_gap * 0.4).max(0.5) } else { 10.0 };

    let shape = match view.chart {
        ChartKind::Bar => ChartShape::Bars {
            bars: series.rows.iter().map(|r| (day_number(r.date), r.metric(view.metric))).collect(),
            half_width,
        },
        _ => ChartShape::Line {
            forecast: series.rows.iter().map(|r| (day_number(r.date), r.forecast_value)).collect(),
            band: view.show_band.then(|| {
                series
                    .rows
                    .iter()
                    .map(|r| (day_number(r.date), r.lower_bound, r.upper_bound))
                    .collect()
            }),
        },
    };

    let (mut x0, mut x1) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    if view.chart == ChartKind::Bar || x1 <= x0 {
        x0 -= half_width;
        x1 += half_width;
    }
    if !x0.is_finite() || !x1.is_finite() || x1 <= x0 {
        x0 = 0.0;
        x1 = 1.0;
    }

    let mut values: Vec<f64> = Vec::new();
    match &shape {
        ChartShape::Bars { bars, .. } => {
            values.push(0.0);
            values.extend(bars.iter().map(|&(_, v)| v));
        }
        ChartShape::Line { forecast, band } => {
            values.extend(forecast.iter().map(|&(_, v)| v));
            if let Some(band) = band {
                values.extend(band.iter().flat_map(|&(_, lo, hi)| [lo, hi]));
            }
        }
    }
    let (mut y_min, mut y_max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    let span = y_max - y_min;
    let pad = if span > 0.0 { span * 0.05 } else { (y_max.abs() * 0.05).max(1.0) };

    ChartData {
        shape,
        x_bounds: [x0, x1],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_date(x_val);
        let label_len = label.chars().count() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format_millions(y_val);
        let label_len = label.chars().count() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let y_title = Paragraph::new(y_label.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width.min(y_label.chars().count() as u16),
        height: 1,
    };
    frame.render_widget(y_title, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use crate::io::ingest::read_forecast_csv;

    fn app() -> App {
        let table = read_forecast_csv(
            concat!(
                "Villa,Date,Forecast,CI Lower (30%),CI Upper (30%)\n",
                "Villa B,2025-01-31,2000000,1400000,2600000\n",
                "Villa A,2025-02-28,1200000,840000,1560000\n",
                "Villa A,2025-01-31,1000000,700000,1300000\n",
            )
            .as_bytes(),
            Path::new("tui.csv"),
        )
        .unwrap();
        App::new(Arc::new(table)).unwrap()
    }

    #[test]
    fn starts_on_first_sorted_entity() {
        let app = app();
        assert_eq!(app.entities, vec!["Villa A", "Villa B"]);
        let view = app.view.as_ref().unwrap();
        assert_eq!(view.series.entity, "Villa A");
        assert_eq!(view.chart, ChartKind::Line);
        assert!(view.show_band);
    }

    #[test]
    fn keys_change_selection_and_rebuild_view() {
        let mut app = app();
        assert!(!app.handle_key(KeyCode::Down).unwrap());
        assert_eq!(app.view.as_ref().unwrap().series.entity, "Villa B");
        // Clamped at the end of the list.
        app.handle_key(KeyCode::Down).unwrap();
        assert_eq!(app.selected, 1);

        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.view.as_ref().unwrap().chart, ChartKind::Bar);
        app.handle_key(KeyCode::Char(' ')).unwrap();
        assert!(!app.view.as_ref().unwrap().show_band);

        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn focus_routes_arrow_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(app.focus, Focus::Chart);
        app.handle_key(KeyCode::Down).unwrap();
        assert_eq!(app.chart, ChartKind::Bar);
        assert_eq!(app.selected, 0);

        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.view.as_ref().unwrap().metric, Metric::Lower);
        app.handle_key(KeyCode::Left).unwrap();
        app.handle_key(KeyCode::Left).unwrap();
        assert_eq!(app.metric, Metric::Upper);

        app.handle_key(KeyCode::Tab).unwrap();
        app.handle_key(KeyCode::Up).unwrap();
        assert!(!app.show_band);

        app.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(app.focus, Focus::Entities);
        app.handle_key(KeyCode::BackTab).unwrap();
        assert_eq!(app.focus, Focus::Band);
    }

    #[test]
    fn missing_bounds_status_clears_on_next_key() {
        let table = read_forecast_csv(
            "Villa,Date,Forecast\nVilla A,2025-01-31,1\nVilla B,2025-01-31,2\n".as_bytes(),
            Path::new("plain.csv"),
        )
        .unwrap();
        let mut app = App::new(Arc::new(table)).unwrap();
        let idle = app.status.clone();

        // Band starts on; off then on again warns.
        app.handle_key(KeyCode::Char(' ')).unwrap();
        assert_eq!(app.status, idle);
        app.handle_key(KeyCode::Char(' ')).unwrap();
        assert!(app.status.starts_with("No confidence-bound"));

        app.handle_key(KeyCode::Down).unwrap();
        assert_eq!(app.status, idle);
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn empty_table_has_no_view() {
        let table = read_forecast_csv("Villa,Date,Forecast\n".as_bytes(), Path::new("e.csv")).unwrap();
        let mut app = App::new(Arc::new(table)).unwrap();
        assert!(app.view.is_none());
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::End).unwrap();
        assert!(app.view.is_none());
    }

    #[test]
    fn line_chart_bounds_include_band() {
        let app = app();
        let data = chart_series(app.view.as_ref().unwrap());
        let ChartShape::Line { forecast, band } = &data.shape else {
            panic!("expected line");
        };
        assert_eq!(forecast.len(), 2);
        assert_eq!(band.as_ref().unwrap().len(), 2);
        assert!(data.y_bounds[0] < 700_000.0);
        assert!(data.y_bounds[1] > 1_560_000.0);
        assert!(data.x_bounds[0] < data.x_bounds[1]);
    }

    #[test]
    fn bar_chart_bounds_include_zero() {
        let mut app = app();
        app.handle_key(KeyCode::Right).unwrap();
        let data = chart_series(app.view.as_ref().unwrap());
        let ChartShape::Bars { bars, half_width } = &data.shape else {
            panic!("expected bars");
        };
        assert_eq!(bars.len(), 2);
        assert!(*half_width > 0.0);
        assert!(data.y_bounds[0] < 0.0);
        // Bars are padded on both sides.
        assert!(data.x_bounds[0] < bars[0].0);
        assert!(data.x_bounds[1] > bars[1].0);
    }

    #[test]
    fn axis_dates_format_as_month() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        assert_eq!(fmt_axis_date(day_number(d)), "2025-03");
    }
}
