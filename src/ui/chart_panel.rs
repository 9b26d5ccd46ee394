use egui_plot::{Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoints, Points};

use crate::state::app_state::{ChartView, PlotKind};
use crate::state::theme::Theme;
use crate::ui::stats_panel::show_stats_grid;

/// Render the chart (or its table) followed by the statistics grid.
/// Returns the screen rect of the chart, used to crop image exports.
pub fn show_chart_panel(
    view: &ChartView,
    show_table: bool,
    theme: &Theme,
    ui: &mut egui::Ui,
) -> egui::Rect {
    ui.horizontal(|ui| {
        ui.heading(view.dataset.label());
        ui.label(egui::RichText::new(view.plot_kind.label()).weak());
    });
    ui.add_space(4.0);

    if let Some(e) = &view.error {
        ui.colored_label(theme.error_color(), format!("Cannot compute this view: {e}"));
        return ui.min_rect();
    }

    let stats_height = 190.0;
    let chart_height = (ui.available_height() - stats_height).max(240.0);

    let chart_rect = if show_table {
        ui.allocate_ui(egui::vec2(ui.available_width(), chart_height), |ui| {
            show_table_view(view, ui);
        })
        .response
        .rect
    } else {
        show_plot(view, theme, chart_height, ui)
    };

    ui.add_space(8.0);
    ui.separator();
    ui.label(egui::RichText::new("Statistics (smoothed values)").strong());
    if let Some(stats) = &view.stats {
        show_stats_grid(ui, "chart_stats_grid", stats);
    }

    chart_rect
}

fn show_plot(view: &ChartView, theme: &Theme, height: f32, ui: &mut egui::Ui) -> egui::Rect {
    let color = theme.series_color();
    let raw: Vec<[f64; 2]> = view.series.points().map(|(x, y)| [x, y]).collect();
    let smoothed: Vec<[f64; 2]> = view
        .series
        .x()
        .iter()
        .zip(&view.smoothed)
        .map(|(&x, &y)| [x, y])
        .collect();
    let smoothing = view.smoothed.as_slice() != view.series.y();

    let response = Plot::new("chart_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label(view.x_label())
        .y_axis_label(view.y_label())
        .show(ui, |plot_ui| {
            match view.plot_kind {
                PlotKind::Histogram => {
                    if let Some(hist) = &view.histogram {
                        let width = hist.bin_width();
                        let bars: Vec<Bar> = hist
                            .bars()
                            .map(|(center, count)| Bar::new(center, count as f64).width(width))
                            .collect();
                        plot_ui.bar_chart(
                            BarChart::new(bars)
                                .name("count")
                                .color(theme.histogram_color()),
                        );
                    }
                }
                PlotKind::Bar => {
                    let width = bar_width(view.series.x());
                    let bars: Vec<Bar> = smoothed
                        .iter()
                        .map(|&[x, y]| Bar::new(x, y).width(width))
                        .collect();
                    plot_ui.bar_chart(BarChart::new(bars).name("y").color(color));
                }
                PlotKind::Line | PlotKind::MarkersLine => {
                    if smoothing {
                        plot_ui.line(
                            Line::new(PlotPoints::from(raw.clone()))
                                .name("raw")
                                .color(color.gamma_multiply(0.35))
                                .width(1.0),
                        );
                    }
                    if view.plot_kind == PlotKind::MarkersLine {
                        plot_ui.points(
                            Points::new(PlotPoints::from(smoothed.clone()))
                                .name("y")
                                .color(color)
                                .radius(2.5),
                        );
                    }
                    plot_ui.line(
                        Line::new(PlotPoints::from(smoothed.clone()))
                            .name("y")
                            .color(color)
                            .width(2.0),
                    );
                }
            }

            if let Some(trend) = &view.trend {
                let fitted: Vec<[f64; 2]> = view
                    .series
                    .x()
                    .iter()
                    .zip(&trend.fitted_y)
                    .map(|(&x, &y)| [x, y])
                    .collect();
                plot_ui.line(
                    Line::new(PlotPoints::from(fitted))
                        .name(format!("trend (slope {:.3})", trend.slope))
                        .color(theme.trend_color())
                        .style(LineStyle::dashed_loose())
                        .width(1.5),
                );
            }
        });

    response.response.rect
}

/// Bars fill 80% of the typical x spacing.
fn bar_width(x: &[f64]) -> f64 {
    match (x.first(), x.last()) {
        (Some(first), Some(last)) if x.len() > 1 && last > first => {
            0.8 * (last - first) / (x.len() - 1) as f64
        }
        _ => 0.8,
    }
}

fn show_table_view(view: &ChartView, ui: &mut egui::Ui) {
    if view.series.is_empty() {
        ui.label("No data.");
        return;
    }

    use egui_extras::{Column, TableBuilder};

    let trend = view.trend.as_ref().map(|t| t.fitted_y.as_slice());
    let num_cols = if trend.is_some() { 4 } else { 3 };
    let x = view.series.x();
    let y = view.series.y();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().at_least(100.0), num_cols)
        .min_scrolled_height(300.0)
        .header(20.0, |mut header| {
            for title in ["x", "y", "smoothed", "trend"].into_iter().take(num_cols) {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, view.series.len(), |mut row| {
                let i = row.index();
                row.col(|ui| {
                    ui.label(format!("{:.3}", x[i]));
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", y[i]));
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", view.smoothed[i]));
                });
                if let Some(fitted) = trend {
                    row.col(|ui| {
                        ui.label(format!("{:.3}", fitted[i]));
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bar_width_follows_spacing() {
        assert_relative_eq!(bar_width(&[0.0, 1.0, 2.0]), 0.8);
        assert_relative_eq!(bar_width(&[0.0, 10.0]), 8.0);
        assert_eq!(bar_width(&[5.0]), 0.8);
        assert_eq!(bar_width(&[]), 0.8);
    }
}
