use std::sync::{Arc, Mutex};

use crate::data::energy::{load_snapshot, CutSnapshot, EnergyCut, PhotonVariable, StatsSource};
use crate::data::scan::{HistogramScan, ScanRun};
use crate::error::DataError;
use crate::insight::{InsightRequest, InsightService, InsightState};
use crate::processing::statistics::DescriptiveStats;

type SnapshotSlot = Arc<Mutex<Option<Result<CutSnapshot, DataError>>>>;

/// Snapshot load running on a worker thread.
struct PendingSnapshot {
    cut: EnergyCut,
    result: SnapshotSlot,
}

/// State of the energy-cut page: which cut and variable are selected, the
/// data loaded for that cut, and the insight shown for it.
pub struct EnergyState {
    source: Arc<dyn StatsSource>,
    cuts: Vec<EnergyCut>,
    selected: usize,
    variable: PhotonVariable,
    snapshot: Option<CutSnapshot>,
    pending: Option<PendingSnapshot>,
    pub scan: Option<HistogramScan>,
    pub insight: InsightState,
    /// Last load failure for the selected cut.
    pub error: Option<String>,
}

impl EnergyState {
    pub fn new(source: Arc<dyn StatsSource>, service: Arc<dyn InsightService>) -> Self {
        let cuts = source.available_cuts();
        if cuts.is_empty() {
            tracing::warn!("No energy-cut statistics found");
        } else {
            tracing::info!("Found statistics for {} energy cuts", cuts.len());
        }
        Self {
            source,
            cuts,
            selected: 0,
            variable: PhotonVariable::Mass,
            snapshot: None,
            pending: None,
            scan: None,
            insight: InsightState::new(service),
            error: None,
        }
    }

    pub fn with_scan(mut self, scan: HistogramScan) -> Self {
        self.scan = Some(scan);
        self
    }

    pub fn cuts(&self) -> &[EnergyCut] {
        &self.cuts
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_cut(&self) -> Option<EnergyCut> {
        self.cuts.get(self.selected).copied()
    }

    pub fn variable(&self) -> PhotonVariable {
        self.variable
    }

    pub fn snapshot(&self) -> Option<&CutSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Select the cut at `index`. Any insight for the previous cut is dropped.
    pub fn select(&mut self, index: usize) {
        if index >= self.cuts.len() || (index == self.selected && self.snapshot.is_some()) {
            return;
        }
        self.selected = index;
        self.insight.invalidate();
        self.load_selected();
    }

    pub fn select_variable(&mut self, variable: PhotonVariable) {
        if variable != self.variable {
            self.variable = variable;
            self.insight.invalidate();
        }
    }

    /// Load the selected cut in the background unless it is already shown.
    pub fn ensure_loaded(&mut self) {
        let Some(cut) = self.selected_cut() else {
            return;
        };
        let shown = self.snapshot.as_ref().map(|s| s.cut) == Some(cut);
        let loading = self.pending.as_ref().map(|p| p.cut) == Some(cut);
        if !shown && !loading && self.error.is_none() {
            self.load_selected();
        }
    }

    fn load_selected(&mut self) {
        let Some(cut) = self.selected_cut() else {
            return;
        };
        self.error = None;
        let result: SnapshotSlot = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&result);
        let source = Arc::clone(&self.source);

        std::thread::spawn(move || {
            let loaded = load_snapshot(source.as_ref(), cut);
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(loaded);
            }
        });

        self.pending = Some(PendingSnapshot { cut, result });
    }

    /// Pick up a finished load. Returns `true` when the page changed.
    pub fn poll(&mut self) -> bool {
        let changed = self.insight.poll();

        let Some(pending) = &self.pending else {
            return changed;
        };
        let finished = match pending.result.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => Some(Err(DataError::Io(std::io::Error::other(
                "snapshot loader panicked",
            )))),
        };
        let Some(result) = finished else {
            return changed;
        };

        let cut = pending.cut;
        self.pending = None;
        if Some(cut) != self.selected_cut() {
            tracing::debug!("Dropping snapshot for {cut}, selection moved on");
            return changed;
        }
        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(e) => {
                tracing::error!("Failed to load {cut}: {e}");
                self.snapshot = None;
                self.error = Some(e.to_string());
            }
        }
        true
    }

    /// Statistics of the selected variable at the shown cut.
    pub fn current_stats(&self) -> Option<&DescriptiveStats> {
        let snapshot = self.snapshot.as_ref()?;
        if Some(snapshot.cut) != self.selected_cut() {
            return None;
        }
        snapshot.report.get(&self.variable)
    }

    pub fn insight_request(&self) -> Option<InsightRequest> {
        let stats = self.current_stats()?;
        let cut = self.selected_cut()?;
        Some(InsightRequest::new(
            format!("{} at {cut}", self.variable.label()),
            *stats,
        ))
    }

    /// Start an insight for the current selection, if there is one.
    pub fn request_insight(&mut self) -> bool {
        match self.insight_request() {
            Some(request) => {
                self.insight.request(request);
                true
            }
            None => false,
        }
    }

    /// The scan run closest to the selected cut.
    pub fn scan_run(&self) -> Option<&ScanRun> {
        let cut = self.selected_cut()?;
        self.scan.as_ref()?.nearest(cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::energy::CutReport;
    use crate::insight::LocalInsight;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    /// Serves reports from memory; cut 30 is listed but fails to load.
    struct MemorySource;

    impl StatsSource for MemorySource {
        fn available_cuts(&self) -> Vec<EnergyCut> {
            vec![EnergyCut::new(10), EnergyCut::new(20), EnergyCut::new(30)]
        }

        fn load_report(&self, cut: EnergyCut) -> Result<CutReport, DataError> {
            if cut.gev() == 30 {
                return Err(DataError::MissingStats { cut });
            }
            let base = f64::from(cut.gev());
            let stats = DescriptiveStats::compute(&[base, base + 1.0, base + 2.0]).unwrap();
            Ok(CutReport::from([(PhotonVariable::Mass, stats)]))
        }

        fn image_path(&self, _cut: EnergyCut, _variable: PhotonVariable) -> PathBuf {
            PathBuf::from("/nonexistent/statscope.png")
        }
    }

    fn state() -> EnergyState {
        EnergyState::new(Arc::new(MemorySource), Arc::new(LocalInsight))
    }

    fn settle(state: &mut EnergyState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while (state.is_loading() || state.insight.is_pending()) && Instant::now() < deadline {
            state.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn loads_first_cut_on_demand() {
        let mut state = state();
        assert_eq!(state.cuts().len(), 3);
        assert!(state.current_stats().is_none());

        state.ensure_loaded();
        settle(&mut state);
        assert_eq!(state.snapshot().map(|s| s.cut), Some(EnergyCut::new(10)));
        assert_eq!(state.current_stats().unwrap().median, 11.0);
        assert!(state.snapshot().unwrap().images.is_empty());
    }

    #[test]
    fn missing_variable_has_no_stats() {
        let mut state = state();
        state.ensure_loaded();
        settle(&mut state);
        state.select_variable(PhotonVariable::DeltaEta);
        assert!(state.current_stats().is_none());
        assert!(state.insight_request().is_none());
        assert!(!state.request_insight());
    }

    #[test]
    fn failed_load_reports_error() {
        let mut state = state();
        state.select(2);
        settle(&mut state);
        assert!(state.snapshot().is_none());
        assert!(state.error.as_deref().unwrap().contains("30 GeV"));

        // no automatic retry until the selection changes
        state.ensure_loaded();
        assert!(!state.is_loading());
    }

    #[test]
    fn insight_describes_selected_cut() {
        let mut state = state();
        state.select(1);
        settle(&mut state);
        let request = state.insight_request().unwrap();
        assert!(request.title.contains("20 GeV"));

        assert!(state.request_insight());
        settle(&mut state);
        let text = state.insight.outcome.clone().unwrap().unwrap();
        assert!(text.contains("20 GeV"));
    }

    #[test]
    fn changing_cut_clears_insight() {
        let mut state = state();
        state.ensure_loaded();
        settle(&mut state);
        state.request_insight();
        settle(&mut state);
        assert!(state.insight.outcome.is_some());

        state.select(1);
        assert!(state.insight.outcome.is_none());
        assert!(state.current_stats().is_none());
        settle(&mut state);
        assert_eq!(state.current_stats().unwrap().min, 20.0);
    }

    #[test]
    fn scan_run_tracks_selection() {
        let scan = HistogramScan::from_json(
            r#"{"metadata": {"title": "scan"},
                "histograms": [
                    {"run_id": 1, "corte_pt": 10000.0, "counts": [1], "edges": [0.0, 1.0]},
                    {"run_id": 2, "corte_pt": 21000.0, "counts": [2], "edges": [0.0, 1.0]}
                ]}"#,
        )
        .unwrap();
        let mut state = state().with_scan(scan);
        assert_eq!(state.scan_run().map(|r| r.run_id), Some(1));
        state.select(1);
        assert_eq!(state.scan_run().map(|r| r.run_id), Some(2));
    }
}
