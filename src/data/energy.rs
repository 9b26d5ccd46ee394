//! Externally generated photon statistics, keyed by energy cut.
//!
//! An offline analysis writes one statistics file per transverse-momentum
//! threshold (`photon_50GeV_stats.js`) plus one distribution image per
//! variable (`photon_50GeV_distribution_masses.png`). The statistics file is a
//! JavaScript assignment wrapping a single JSON object:
//!
//! ```text
//! // Auto-generated photon statistics
//!
//! const photon_50GeV_stats = { "masses": { "count": 812, ... }, ... };
//! ```
//!
//! Plain JSON files with the same object are accepted too.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::processing::statistics::DescriptiveStats;

/// An energy threshold in whole GeV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnergyCut(u32);

impl EnergyCut {
    pub fn new(gev: u32) -> Self {
        Self(gev)
    }

    /// Round a fractional threshold to the whole-GeV key used in file names.
    pub fn from_gev(value: f64) -> Self {
        Self(value.max(0.0).round() as u32)
    }

    pub fn gev(&self) -> u32 {
        self.0
    }

    pub fn stats_file_name(&self) -> String {
        format!("photon_{}GeV_stats.js", self.0)
    }

    pub fn image_file_name(&self, variable: PhotonVariable) -> String {
        format!("photon_{}GeV_distribution_{}.png", self.0, variable.key())
    }
}

impl fmt::Display for EnergyCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} GeV", self.0)
    }
}

/// Diphoton quantities described in every statistics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhotonVariable {
    #[serde(rename = "pt_sum")]
    PtSum,
    #[serde(rename = "delta_eta")]
    DeltaEta,
    #[serde(rename = "delta_phi")]
    DeltaPhi,
    #[serde(rename = "E_sum")]
    EnergySum,
    #[serde(rename = "masses")]
    Mass,
}

impl PhotonVariable {
    pub const ALL: [PhotonVariable; 5] = [
        PhotonVariable::PtSum,
        PhotonVariable::DeltaEta,
        PhotonVariable::DeltaPhi,
        PhotonVariable::EnergySum,
        PhotonVariable::Mass,
    ];

    /// Key used inside statistics files and image names.
    pub fn key(&self) -> &'static str {
        match self {
            PhotonVariable::PtSum => "pt_sum",
            PhotonVariable::DeltaEta => "delta_eta",
            PhotonVariable::DeltaPhi => "delta_phi",
            PhotonVariable::EnergySum => "E_sum",
            PhotonVariable::Mass => "masses",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhotonVariable::PtSum => "Diphoton pT [GeV]",
            PhotonVariable::DeltaEta => "Δη",
            PhotonVariable::DeltaPhi => "Δφ",
            PhotonVariable::EnergySum => "Energy [GeV]",
            PhotonVariable::Mass => "Invariant mass m_γγ [GeV]",
        }
    }
}

/// Statistics of every variable at one energy cut.
pub type CutReport = BTreeMap<PhotonVariable, DescriptiveStats>;

/// Data access for per-cut statistics and distribution images.
pub trait StatsSource: Send + Sync {
    /// Cuts for which a statistics file exists.
    fn available_cuts(&self) -> Vec<EnergyCut>;

    fn load_report(&self, cut: EnergyCut) -> Result<CutReport, DataError>;

    /// Location of the distribution image, whether or not it exists.
    fn image_path(&self, cut: EnergyCut, variable: PhotonVariable) -> PathBuf;
}

/// Reads statistics files and images from a single directory.
pub struct DirectoryStatsSource {
    dir: PathBuf,
    candidates: Vec<EnergyCut>,
}

impl DirectoryStatsSource {
    pub fn new(dir: impl Into<PathBuf>, candidates: Vec<EnergyCut>) -> Self {
        Self {
            dir: dir.into(),
            candidates,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StatsSource for DirectoryStatsSource {
    fn available_cuts(&self) -> Vec<EnergyCut> {
        self.candidates
            .iter()
            .copied()
            .filter(|cut| self.dir.join(cut.stats_file_name()).is_file())
            .collect()
    }

    fn load_report(&self, cut: EnergyCut) -> Result<CutReport, DataError> {
        let path = self.dir.join(cut.stats_file_name());
        if !path.is_file() {
            return Err(DataError::MissingStats { cut });
        }
        let text = std::fs::read_to_string(&path)?;
        let report = parse_stats_script(&text)?;
        tracing::info!("Loaded {} variables for {cut} from {:?}", report.len(), path);
        Ok(report)
    }

    fn image_path(&self, cut: EnergyCut, variable: PhotonVariable) -> PathBuf {
        self.dir.join(cut.image_file_name(variable))
    }
}

/// Parse a statistics file, stripping an optional `const name = ...;` wrapper
/// and `//` comment lines. Unknown variables in the file are ignored.
pub fn parse_stats_script(text: &str) -> Result<CutReport, DataError> {
    let body: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut json = body.trim();
    if !json.starts_with('{') {
        if let Some(brace) = json.find('{') {
            json = &json[brace..];
        }
    }
    let json = null_non_finite_literals(json.trim_end().trim_end_matches(';'));

    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&json)?;
    let mut report = CutReport::new();
    for variable in PhotonVariable::ALL {
        if let Some(value) = raw.get(variable.key()) {
            let stats: DescriptiveStats = serde_json::from_value(value.clone())?;
            report.insert(variable, stats);
        }
    }
    Ok(report)
}

/// Python's `json.dump` writes `NaN`, `Infinity` and `-Infinity` as bare
/// literals. Rewrite them to `null` everywhere outside string values.
fn null_non_finite_literals(json: &str) -> String {
    const LITERALS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = json;
    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(lit) = LITERALS.iter().find(|lit| rest.starts_with(**lit)) {
            out.push_str("null");
            rest = &rest[lit.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Decoded RGBA pixels of a distribution image.
pub struct RgbaPixels {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn load_image(path: &Path) -> Result<RgbaPixels, DataError> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(RgbaPixels {
        width: width as usize,
        height: height as usize,
        rgba: img.into_raw(),
    })
}

/// Everything shown for one energy cut.
pub struct CutSnapshot {
    pub cut: EnergyCut,
    pub report: CutReport,
    /// Variables whose image is missing or unreadable have no entry.
    pub images: BTreeMap<PhotonVariable, RgbaPixels>,
}

/// Load the report and every available image for `cut`.
pub fn load_snapshot(source: &dyn StatsSource, cut: EnergyCut) -> Result<CutSnapshot, DataError> {
    let report = source.load_report(cut)?;
    let mut images = BTreeMap::new();
    for variable in report.keys().copied() {
        let path = source.image_path(cut, variable);
        if !path.is_file() {
            continue;
        }
        match load_image(&path) {
            Ok(pixels) => {
                images.insert(variable, pixels);
            }
            Err(e) => tracing::warn!("Skipping image {:?}: {e}", path),
        }
    }
    Ok(CutSnapshot { cut, report, images })
}
