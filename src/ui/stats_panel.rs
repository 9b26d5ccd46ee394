use crate::processing::statistics::DescriptiveStats;

/// Two-column grid of summary statistics, three decimals.
pub fn show_stats_grid(ui: &mut egui::Ui, id: &str, stats: &DescriptiveStats) {
    egui::Grid::new(id)
        .num_columns(2)
        .striped(true)
        .spacing([16.0, 4.0])
        .show(ui, |ui| {
            row(ui, "Count", stats.count.to_string());
            for (label, value) in [
                ("Mean", stats.mean),
                ("Median", stats.median),
                ("Std dev", stats.std),
                ("Min", stats.min),
                ("Max", stats.max),
                ("Q1", stats.q1),
                ("Q3", stats.q3),
            ] {
                let text = if value.is_finite() {
                    format!("{value:.3}")
                } else {
                    "n/a".to_string()
                };
                row(ui, label, text);
            }
        });
}

fn row(ui: &mut egui::Ui, label: &str, value: String) {
    ui.label(egui::RichText::new(label).weak());
    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        ui.monospace(value);
    });
    ui.end_row();
}
