mod app;
mod config;
mod data;
mod error;
mod insight;
mod processing;
mod state;
mod ui;

use std::sync::Arc;

use app::StatScopeApp;
use config::Settings;
use data::energy::DirectoryStatsSource;
use data::scan::HistogramScan;
use eframe::egui;
use insight::LocalInsight;
use processing::generator::DatasetKind;
use state::app_state::AppState;
use state::energy_state::EnergyState;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let mut settings = Settings::load();
    if let Some(arg) = std::env::args().nth(1) {
        match arg.parse::<DatasetKind>() {
            Ok(kind) => settings.dataset = kind,
            Err(e) => tracing::warn!("{e}, starting with {}", settings.dataset),
        }
    }
    let source = DirectoryStatsSource::new(settings.energy.stats_dir.clone(), settings.energy.cuts());
    tracing::info!("Reading energy-cut statistics from {:?}", source.dir());

    let mut energy = EnergyState::new(Arc::new(source), Arc::new(LocalInsight));
    if let Some(path) = &settings.energy.scan_file {
        match HistogramScan::from_file(path) {
            Ok(scan) => energy = energy.with_scan(scan),
            Err(e) => tracing::warn!("Ignoring scan file {:?}: {e}", path),
        }
    }
    let state = AppState::new(&settings, energy);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("StatScope")
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "StatScope",
        options,
        Box::new(|cc| Ok(Box::new(StatScopeApp::new(cc, state)))),
    )
}
