use egui_plot::{Bar, BarChart, Plot};

use crate::data::energy::PhotonVariable;
use crate::state::energy_state::EnergyState;
use crate::state::theme::Theme;
use crate::ui::stats_panel::show_stats_grid;

/// Render the energy-cut page. `texture` is the distribution image for the
/// current cut and variable, if one was loaded.
pub fn show_energy_panel(
    energy: &mut EnergyState,
    texture: Option<&egui::TextureHandle>,
    theme: &Theme,
    ui: &mut egui::Ui,
) {
    if energy.cuts().is_empty() {
        ui.add_space(20.0);
        ui.vertical_centered(|ui| {
            ui.heading("No energy-cut statistics found");
            ui.label(
                egui::RichText::new("Point energy.stats_dir in statscope.json at the analysis output directory.")
                    .weak(),
            );
        });
        return;
    }

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Energy cut").strong());
        let mut index = energy.selected_index();
        let max = energy.cuts().len().saturating_sub(1);
        ui.add(egui::Slider::new(&mut index, 0..=max).show_value(false));
        if let Some(cut) = energy.selected_cut() {
            ui.monospace(format!("pT > {cut}"));
        }
        if index != energy.selected_index() {
            energy.select(index);
        }

        ui.separator();

        ui.label(egui::RichText::new("Variable").strong());
        let mut variable = energy.variable();
        egui::ComboBox::from_id_salt("photon_variable_selector")
            .selected_text(variable.label())
            .show_ui(ui, |ui| {
                for v in PhotonVariable::ALL {
                    ui.selectable_value(&mut variable, v, v.label());
                }
            });
        energy.select_variable(variable);

        if energy.is_loading() {
            ui.spinner();
        }
    });
    ui.separator();

    if let Some(err) = &energy.error {
        ui.colored_label(theme.error_color(), err.as_str());
        return;
    }

    ui.columns(2, |cols| {
        let left = &mut cols[0];
        match texture {
            Some(tex) => {
                left.add(
                    egui::Image::from_texture(egui::load::SizedTexture::from_handle(tex))
                        .shrink_to_fit(),
                );
            }
            None if energy.snapshot().is_some() => {
                left.label(egui::RichText::new("No distribution image for this variable.").weak());
            }
            None => {}
        }

        if let Some(run) = energy.scan_run() {
            left.add_space(8.0);
            left.label(
                egui::RichText::new(format!(
                    "Invariant mass scan, run {} ({} events)",
                    run.run_id, run.events
                ))
                .strong(),
            );
            let hist = run.histogram_gev();
            let width = hist.bin_width();
            let bars: Vec<Bar> = hist
                .bars()
                .map(|(center, count)| Bar::new(center, count as f64).width(width))
                .collect();
            Plot::new("scan_plot")
                .height(200.0)
                .x_axis_label("m [GeV]")
                .y_axis_label("events / bin")
                .show(left, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).color(theme.histogram_color()));
                });
        }

        let right = &mut cols[1];
        right.label(egui::RichText::new(energy.variable().label()).strong());
        match energy.current_stats() {
            Some(stats) => show_stats_grid(right, "energy_stats_grid", stats),
            None if energy.snapshot().is_some() => {
                right.label(egui::RichText::new("Not recorded at this cut.").weak());
            }
            None => {}
        }

        right.add_space(10.0);
        show_insight(energy, theme, right);
    });
}

fn show_insight(energy: &mut EnergyState, theme: &Theme, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let ready = energy.current_stats().is_some() && !energy.insight.is_pending();
        if ui
            .add_enabled(ready, egui::Button::new("Generate insight"))
            .clicked()
        {
            energy.request_insight();
        }
        ui.label(
            egui::RichText::new(format!("via {}", energy.insight.service_name()))
                .weak()
                .small(),
        );
        if energy.insight.is_pending() {
            ui.spinner();
        }
    });

    match &energy.insight.outcome {
        Some(Ok(text)) => {
            ui.add_space(4.0);
            ui.label(text.as_str());
        }
        Some(Err(e)) => {
            ui.colored_label(theme.error_color(), format!("Insight failed: {e}"));
        }
        None => {}
    }
}
