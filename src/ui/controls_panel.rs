use crate::config::{POINT_COUNT_RANGE, SMOOTHING_RANGE};
use crate::processing::generator::DatasetKind;
use crate::state::app_state::{ChartControls, PlotKind};

/// Actions that the controls panel can request from the parent.
pub enum ControlAction {
    None,
    Regenerate,
    ExportImageSave,
    ExportImageClipboard,
    ExportCsv,
}

/// Helper to create a button with consistent min size.
fn panel_btn(ui: &mut egui::Ui, label: &str) -> egui::Response {
    ui.add(egui::Button::new(label).min_size(egui::vec2(ui.available_width(), 26.0)))
}

/// Render the chart inputs. Edits go straight into `controls`; everything
/// else comes back as an action.
pub fn show_controls_panel(
    controls: &mut ChartControls,
    show_table: &mut bool,
    ui: &mut egui::Ui,
) -> ControlAction {
    let mut action = ControlAction::None;

    ui.add_space(4.0);
    ui.label(egui::RichText::new("Dataset").strong());
    let mut dataset = controls.dataset;
    egui::ComboBox::from_id_salt("dataset_selector")
        .width(ui.available_width())
        .selected_text(dataset.label())
        .show_ui(ui, |ui| {
            for kind in DatasetKind::ALL {
                ui.selectable_value(&mut dataset, kind, kind.label());
            }
        });
    if dataset != controls.dataset {
        controls.select_dataset(dataset);
    }

    ui.add_space(6.0);
    ui.label(egui::RichText::new("Plot type").strong());
    let forced = controls.dataset == DatasetKind::HistogramMixture;
    ui.add_enabled_ui(!forced, |ui| {
        egui::ComboBox::from_id_salt("plot_kind_selector")
            .width(ui.available_width())
            .selected_text(controls.plot_kind.label())
            .show_ui(ui, |ui| {
                for kind in PlotKind::ALL {
                    ui.selectable_value(&mut controls.plot_kind, kind, kind.label());
                }
            });
    });
    if forced {
        ui.label(egui::RichText::new("Mixture data is always binned").weak().small());
    }

    ui.add_space(6.0);
    ui.label(egui::RichText::new("Points").strong());
    ui.add(egui::Slider::new(&mut controls.point_count, POINT_COUNT_RANGE).logarithmic(true));

    ui.add_space(6.0);
    ui.label(egui::RichText::new("Smoothing window").strong());
    ui.add(egui::Slider::new(&mut controls.smoothing_window, SMOOTHING_RANGE));

    ui.add_space(6.0);
    ui.add_enabled(
        controls.plot_kind != PlotKind::Histogram,
        egui::Checkbox::new(&mut controls.show_trend, "Show linear trend"),
    );
    ui.add_enabled(
        controls.plot_kind == PlotKind::Histogram,
        egui::Checkbox::new(&mut controls.clip_outliers, "Clip to 2nd-98th percentile"),
    );
    ui.checkbox(show_table, "Table view");

    ui.add_space(10.0);
    if panel_btn(ui, "Regenerate").clicked() {
        action = ControlAction::Regenerate;
    }

    ui.separator();
    ui.label(egui::RichText::new("Export").strong());
    if panel_btn(ui, "Save PNG...").clicked() {
        action = ControlAction::ExportImageSave;
    }
    if panel_btn(ui, "Copy image").clicked() {
        action = ControlAction::ExportImageClipboard;
    }
    if panel_btn(ui, "Save CSV...").clicked() {
        action = ControlAction::ExportCsv;
    }

    action
}
