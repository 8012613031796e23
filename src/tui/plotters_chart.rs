//! Plotters-powered forecast chart widget for Ratatui.
//!
//! Plotters output is rendered into the Ratatui buffer using
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
// `ratatui::style::Color` below shadows the Plotters trait name.
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// What to draw inside the plotting area. X values are day numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartShape {
    /// Forecast line, optionally over a filled `(x, lower, upper)` band.
    Line {
        forecast: Vec<(f64, f64)>,
        band: Option<Vec<(f64, f64, f64)>>,
    },
    /// One bar per date, centred on `x` and `2 * half_width` days wide.
    Bars { bars: Vec<(f64, f64)>, half_width: f64 },
}

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct ForecastPlottersChart<'a> {
    pub shape: &'a ChartShape,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    /// Formatting of tick labels.
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for ForecastPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255); // cyan
            let band_color = RGBColor(0, 128, 255); // blue
            let bar_color = RGBColor(0, 200, 120); // green

            match self.shape {
                ChartShape::Line { forecast, band } => {
                    // Band first so the line stays on top.
                    if let Some(band) = band {
                        let mut outline: Vec<(f64, f64)> = band.iter().map(|&(x, _, hi)| (x, hi)).collect();
                        outline.extend(band.iter().rev().map(|&(x, lo, _)| (x, lo)));
                        if outline.len() >= 3 {
                            chart.draw_series(std::iter::once(Polygon::new(
                                outline,
                                band_color.mix(0.3).filled(),
                            )))?;
                        }
                    }

                    chart.draw_series(LineSeries::new(forecast.iter().copied(), &line_color))?;

                    // `Circle` radii are mis-scaled by the ratatui backend; a
                    // pixel marks each month instead.
                    chart.draw_series(forecast.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;
                }
                ChartShape::Bars { bars, half_width } => {
                    chart.draw_series(bars.iter().map(|&(x, v)| {
                        Rectangle::new([(x - half_width, 0.0), (x + half_width, v)], bar_color.filled())
                    }))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
