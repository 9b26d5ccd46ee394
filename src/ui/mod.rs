pub mod chart_panel;
pub mod controls_panel;
pub mod energy_panel;
pub mod stats_panel;
