use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::energy::EnergyCut;
use crate::error::ConfigError;
use crate::processing::generator::DatasetKind;
use crate::state::theme::Theme;

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "STATSCOPE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "statscope.json";

pub const POINT_COUNT_RANGE: std::ops::RangeInclusive<usize> = 1..=5000;
pub const SMOOTHING_RANGE: std::ops::RangeInclusive<usize> = 1..=101;

/// Step used when the settings omit `cut_step` or give a non-positive one.
pub const DEFAULT_CUT_STEP: f64 = 5.0;

/// Upper bound on the number of cuts a range may produce.
pub const MAX_CUTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dataset: DatasetKind,
    pub point_count: usize,
    pub smoothing_window: usize,
    pub show_trend: bool,
    /// Seed for dataset generation; entropy is used when absent.
    pub seed: Option<u64>,
    pub theme: Theme,
    pub energy: EnergySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::default(),
            point_count: 200,
            smoothing_window: 1,
            show_trend: false,
            seed: None,
            theme: Theme::default(),
            energy: EnergySettings::default(),
        }
    }
}

/// Where the per-cut statistics live and which cuts to offer, in GeV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergySettings {
    pub stats_dir: PathBuf,
    pub cut_min: f64,
    pub cut_max: f64,
    pub cut_step: Option<f64>,
    /// Optional consolidated histogram scan (one mass histogram per cut).
    pub scan_file: Option<PathBuf>,
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            stats_dir: PathBuf::from("photon_analysis_outputs"),
            cut_min: 10.0,
            cut_max: 100.0,
            cut_step: Some(DEFAULT_CUT_STEP),
            scan_file: None,
        }
    }
}

impl EnergySettings {
    pub fn effective_step(&self) -> f64 {
        match self.cut_step {
            Some(step) if step > 0.0 => step,
            other => {
                tracing::warn!(
                    "cut_step {:?} is not usable, falling back to {DEFAULT_CUT_STEP} GeV",
                    other
                );
                DEFAULT_CUT_STEP
            }
        }
    }

    /// Number of steps between `cut_min` and `cut_max`, counting the last
    /// one when `cut_max` is within half a step.
    fn step_count(&self, step: f64) -> f64 {
        ((self.cut_max - self.cut_min) / step + 0.5).floor()
    }

    /// Cuts from `cut_min` through `cut_max`, inclusive within half a step.
    /// Never yields more than [`MAX_CUTS`] entries.
    pub fn cuts(&self) -> Vec<EnergyCut> {
        let step = self.effective_step();
        let steps = self.step_count(step).clamp(0.0, (MAX_CUTS - 1) as f64) as u32;
        let mut cuts: Vec<EnergyCut> = Vec::new();
        for i in 0..=steps {
            let cut = EnergyCut::from_gev(self.cut_min + f64::from(i) * step);
            if cuts.last() != Some(&cut) {
                cuts.push(cut);
            }
        }
        cuts
    }
}

impl Settings {
    /// Load settings from `$STATSCOPE_CONFIG` or `statscope.json`.
    /// A missing file yields defaults; a broken one is logged and ignored.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            tracing::info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring settings file {:?}: {e}", path);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        settings.point_count = settings
            .point_count
            .clamp(*POINT_COUNT_RANGE.start(), *POINT_COUNT_RANGE.end());
        settings.smoothing_window = settings
            .smoothing_window
            .clamp(*SMOOTHING_RANGE.start(), *SMOOTHING_RANGE.end());
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let energy = &self.energy;
        if !energy.cut_min.is_finite() || !energy.cut_max.is_finite() || energy.cut_min < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "energy cut range {}..{} is not valid",
                energy.cut_min, energy.cut_max
            )));
        }
        if energy.cut_max < energy.cut_min {
            return Err(ConfigError::Invalid(format!(
                "cut_max ({}) is below cut_min ({})",
                energy.cut_max, energy.cut_min
            )));
        }
        let steps = energy.step_count(energy.effective_step());
        if steps + 1.0 > MAX_CUTS as f64 {
            return Err(ConfigError::Invalid(format!(
                "cut range {}..{} with step {:?} gives more than {MAX_CUTS} cuts",
                energy.cut_min, energy.cut_max, energy.cut_step
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn default_cut_range_has_nineteen_cuts() {
        let cuts = EnergySettings::default().cuts();
        assert_eq!(cuts.len(), 19);
        assert_eq!(cuts.first(), Some(&EnergyCut::new(10)));
        assert_eq!(cuts.last(), Some(&EnergyCut::new(100)));
    }

    #[test]
    fn missing_or_bad_step_falls_back() {
        for step in [None, Some(0.0), Some(-2.5)] {
            let energy = EnergySettings {
                cut_min: 20.0,
                cut_max: 30.0,
                cut_step: step,
                ..Default::default()
            };
            assert_eq!(energy.effective_step(), DEFAULT_CUT_STEP);
            assert_eq!(energy.cuts().len(), 3);
        }
    }

    #[test]
    fn max_is_included_within_half_a_step() {
        let energy = EnergySettings {
            cut_min: 10.0,
            cut_max: 19.0,
            cut_step: Some(4.0),
            ..Default::default()
        };
        let gev: Vec<u32> = energy.cuts().iter().map(|c| c.gev()).collect();
        assert_eq!(gev, vec![10, 14, 18]);
    }

    #[test]
    fn values_are_clamped_and_parsed() {
        let s = Settings::from_json(
            r#"{"dataset": "hist", "point_count": 999999, "smoothing_window": 0,
                "seed": 9, "theme": "light", "energy": {"cut_min": 50, "cut_max": 60}}"#,
        )
        .unwrap();
        assert_eq!(s.dataset, DatasetKind::HistogramMixture);
        assert_eq!(s.point_count, 5000);
        assert_eq!(s.smoothing_window, 1);
        assert_eq!(s.seed, Some(9));
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.energy.cuts().len(), 3);
    }

    #[test]
    fn inverted_range_is_invalid() {
        let err = Settings::from_json(r#"{"energy": {"cut_min": 80, "cut_max": 20}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn tiny_step_is_rejected() {
        let err = Settings::from_json(r#"{"energy": {"cut_step": 1e-9}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        // a thousand cuts is still fine
        let ok = Settings::from_json(r#"{"energy": {"cut_min": 0, "cut_max": 999, "cut_step": 1}}"#)
            .unwrap();
        assert_eq!(ok.energy.cuts().len(), MAX_CUTS);
    }

    #[test]
    fn cut_list_is_bounded_without_validation() {
        let energy = EnergySettings {
            cut_step: Some(1e-9),
            ..Default::default()
        };
        assert!(energy.cuts().len() <= MAX_CUTS);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(Settings::from_json("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            Settings::from_json(r#"{"dataset": "cosine"}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
