pub mod app_state;
pub mod energy_state;
pub mod theme;
