use egui::{Color32, Visuals};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            Theme::Dark => Visuals::dark(),
            Theme::Light => Visuals::light(),
        }
    }

    /// Main data trace.
    pub fn series_color(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(90, 160, 255),
            Theme::Light => Color32::from_rgb(31, 119, 180),
        }
    }

    /// Dashed trend overlay.
    pub fn trend_color(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgba_unmultiplied(235, 235, 235, 200),
            Theme::Light => Color32::from_rgba_unmultiplied(0, 0, 0, 180),
        }
    }

    pub fn histogram_color(&self) -> Color32 {
        self.series_color().gamma_multiply(0.8)
    }

    pub fn error_color(&self) -> Color32 {
        Color32::from_rgb(255, 80, 80)
    }

    /// Label for the toggle button, naming the theme it switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Dark => "Light Mode",
            Theme::Light => "Dark Mode",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Dark
    }
}
