use std::path::Path;

use serde::Deserialize;

use crate::data::energy::EnergyCut;
use crate::error::DataError;
use crate::processing::histogram::Histogram;

/// A threshold scan: one precomputed invariant-mass histogram per pT cut.
///
/// Cut values and bin edges in the file are in MeV.
#[derive(Debug, Clone, Deserialize)]
pub struct HistogramScan {
    pub metadata: ScanMetadata,
    pub histograms: Vec<ScanRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanMetadata {
    pub title: String,
    #[serde(rename = "eje_x_title", alias = "x_title", default)]
    pub x_title: String,
    #[serde(rename = "eje_y_title", alias = "y_title", default)]
    pub y_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRun {
    pub run_id: u32,
    #[serde(rename = "corte_pt", alias = "cut_mev")]
    pub cut_mev: f64,
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
    #[serde(rename = "num_eventos", alias = "events", default)]
    pub events: usize,
}

impl ScanRun {
    pub fn cut(&self) -> EnergyCut {
        EnergyCut::from_gev(self.cut_mev / 1000.0)
    }

    /// The histogram with edges converted to GeV.
    pub fn histogram_gev(&self) -> Histogram {
        Histogram {
            edges: self.edges.iter().map(|e| e / 1000.0).collect(),
            counts: self.counts.clone(),
        }
    }
}

impl HistogramScan {
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path)?;
        let scan = Self::from_json(&text)?;
        tracing::info!("Loaded {} scan runs from {:?}", scan.histograms.len(), path);
        Ok(scan)
    }

    pub fn from_json(text: &str) -> Result<Self, DataError> {
        let scan: HistogramScan = serde_json::from_str(text)?;
        Ok(scan)
    }

    /// The run whose cut is closest to `cut`.
    pub fn nearest(&self, cut: EnergyCut) -> Option<&ScanRun> {
        let target = f64::from(cut.gev()) * 1000.0;
        self.histograms
            .iter()
            .filter(|run| run.edges.len() == run.counts.len() + 1)
            .min_by(|a, b| {
                (a.cut_mev - target)
                    .abs()
                    .total_cmp(&(b.cut_mev - target).abs())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: &str = r#"{
        "metadata": {"title": "Diphoton scan", "eje_x_title": "Masa Invariante (MeV)",
                     "eje_y_title": "Eventos / Bin", "pt_step_used": 2500, "num_steps": 3},
        "histograms": [
            {"run_id": 1, "corte_pt": 20000.0, "counts": [1, 2], "edges": [50000.0, 60000.0, 70000.0], "num_eventos": 3},
            {"run_id": 2, "corte_pt": 22500.0, "counts": [0, 5], "edges": [50000.0, 60000.0, 70000.0], "num_eventos": 5},
            {"run_id": 3, "corte_pt": 25000.0, "counts": [4], "edges": [50000.0], "num_eventos": 4}
        ]
    }"#;

    #[test]
    fn parses_scan_file() {
        let scan = HistogramScan::from_json(SCAN).unwrap();
        assert_eq!(scan.metadata.title, "Diphoton scan");
        assert_eq!(scan.metadata.y_title, "Eventos / Bin");
        assert_eq!(scan.histograms.len(), 3);
        assert_eq!(scan.histograms[1].events, 5);
    }

    #[test]
    fn nearest_skips_malformed_runs() {
        let scan = HistogramScan::from_json(SCAN).unwrap();
        assert_eq!(scan.nearest(EnergyCut::new(22)).map(|r| r.run_id), Some(2));
        // run 3 is closest to 25 GeV but has inconsistent edges
        assert_eq!(scan.nearest(EnergyCut::new(25)).map(|r| r.run_id), Some(2));
    }

    #[test]
    fn converts_edges_to_gev() {
        let scan = HistogramScan::from_json(SCAN).unwrap();
        let run = &scan.histograms[0];
        assert_eq!(run.cut(), EnergyCut::new(20));
        let h = run.histogram_gev();
        assert_eq!(h.edges, vec![50.0, 60.0, 70.0]);
        assert_eq!(h.total(), 3);
    }
}
