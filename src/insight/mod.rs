use std::panic::AssertUnwindSafe;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::error::InsightError;
use crate::processing::statistics::DescriptiveStats;

/// What gets described: a title plus the statistics behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub title: String,
    pub stats: DescriptiveStats,
}

impl InsightRequest {
    pub fn new(title: impl Into<String>, stats: DescriptiveStats) -> Self {
        Self {
            title: title.into(),
            stats,
        }
    }

    /// The plain-text summary handed to text-generation services.
    pub fn summary(&self) -> String {
        let s = &self.stats;
        format!(
            "Statistics for {}: count={}, mean={:.3}, median={:.3}, std={:.3}, min={:.3}, max={:.3}, q1={:.3}, q3={:.3}.",
            self.title, s.count, s.mean, s.median, s.std, s.min, s.max, s.q1, s.q3
        )
    }
}

/// Something that turns a statistics summary into prose.
pub trait InsightService: Send + Sync {
    fn name(&self) -> &str;

    fn describe(&self, request: &InsightRequest) -> Result<String, InsightError>;
}

/// Offline, rule-based descriptions of shape and spread.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalInsight;

impl InsightService for LocalInsight {
    fn name(&self) -> &str {
        "local"
    }

    fn describe(&self, request: &InsightRequest) -> Result<String, InsightError> {
        let s = &request.stats;
        if s.count == 0 {
            return Err(InsightError::EmptySummary);
        }

        let mut sentences = vec![format!(
            "{} has {} entries centred near {:.3} (median {:.3}).",
            request.title, s.count, s.mean, s.median
        )];

        let shape = [s.mean, s.median, s.std, s.min, s.max, s.q1, s.q3];
        if shape.iter().any(|v| !v.is_finite()) {
            sentences.push("Some statistics are missing at this cut, so shape and spread are not described.".to_string());
            return Ok(sentences.join(" "));
        }

        if s.std == 0.0 {
            sentences.push("Every value is identical, so there is no spread to describe.".to_string());
            return Ok(sentences.join(" "));
        }

        // Pearson's second skewness coefficient.
        let skew = 3.0 * (s.mean - s.median) / s.std;
        sentences.push(
            if skew > 0.3 {
                "The distribution is right-skewed: a tail of large values pulls the mean above the median."
            } else if skew < -0.3 {
                "The distribution is left-skewed: a tail of small values pulls the mean below the median."
            } else {
                "The distribution is roughly symmetric around its centre."
            }
            .to_string(),
        );

        let iqr = s.iqr();
        sentences.push(format!(
            "The middle half of the data spans {:.3} to {:.3} (IQR {:.3}), against a full range of {:.3}.",
            s.q1,
            s.q3,
            iqr,
            s.range()
        ));

        let low_fence = s.q1 - 1.5 * iqr;
        let high_fence = s.q3 + 1.5 * iqr;
        match (s.min < low_fence, s.max > high_fence) {
            (true, true) => sentences.push("Both tails reach past the 1.5×IQR fences, so outliers are likely on each side.".to_string()),
            (false, true) => sentences.push(format!("The maximum {:.3} lies beyond the upper fence {:.3}, hinting at high outliers.", s.max, high_fence)),
            (true, false) => sentences.push(format!("The minimum {:.3} lies beyond the lower fence {:.3}, hinting at low outliers.", s.min, low_fence)),
            (false, false) => {}
        }

        if s.mean != 0.0 {
            let cv = s.std / s.mean.abs();
            if cv > 1.0 {
                sentences.push(format!("Spread is large relative to the mean (CV {cv:.2})."));
            }
        }

        Ok(sentences.join(" "))
    }
}

type Outcome = Result<String, InsightError>;

/// Tracks insight requests running on worker threads.
///
/// Every request is tagged with a generation number. Results that arrive for
/// an older generation (because the selection changed meanwhile) are dropped.
pub struct InsightState {
    service: Arc<dyn InsightService>,
    generation: u64,
    pending: bool,
    tx: Sender<(u64, Outcome)>,
    rx: Receiver<(u64, Outcome)>,
    pub outcome: Option<Outcome>,
}

impl InsightState {
    pub fn new(service: Arc<dyn InsightService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            service,
            generation: 0,
            pending: false,
            tx,
            rx,
            outcome: None,
        }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Start a request on a worker thread, superseding any in flight.
    pub fn request(&mut self, request: InsightRequest) {
        self.generation += 1;
        self.pending = true;
        self.outcome = None;

        let generation = self.generation;
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        tracing::info!("Requesting insight #{generation} from {}", service.name());
        tracing::debug!("{}", request.summary());

        std::thread::spawn(move || {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| service.describe(&request)))
                .unwrap_or(Err(InsightError::WorkerLost));
            // The receiver only disappears when the app shuts down.
            let _ = tx.send((generation, outcome));
        });
    }

    /// Forget the current outcome and any request still running.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pending = false;
        self.outcome = None;
    }

    /// Drain finished requests. Returns `true` when the outcome changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((generation, outcome)) = self.rx.try_recv() {
            if generation != self.generation {
                tracing::debug!("Dropping stale insight #{generation}");
                continue;
            }
            if let Err(e) = &outcome {
                tracing::error!("Insight request failed: {e}");
            }
            self.outcome = Some(outcome);
            self.pending = false;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn stats(values: &[f64]) -> DescriptiveStats {
        DescriptiveStats::compute(values).unwrap()
    }

    /// Echoes the title, optionally waiting on a gate first.
    struct Scripted {
        gate: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl InsightService for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn describe(&self, request: &InsightRequest) -> Result<String, InsightError> {
            if request.title == "boom" {
                panic!("service crashed");
            }
            if request.title == "fail" {
                return Err(InsightError::service("quota exceeded"));
            }
            if request.title == "slow" {
                let gate = self.gate.lock().unwrap().take();
                if let Some(gate) = gate {
                    let _ = gate.recv();
                }
            }
            Ok(format!("about {}", request.title))
        }
    }

    fn wait_for(state: &mut InsightState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.is_pending() && Instant::now() < deadline {
            state.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn scripted() -> (InsightState, mpsc::Sender<()>) {
        let (open, gate) = mpsc::channel();
        let service = Scripted {
            gate: Mutex::new(Some(gate)),
        };
        (InsightState::new(Arc::new(service)), open)
    }

    #[test]
    fn summary_lists_every_metric() {
        let text = InsightRequest::new("masses @ 50 GeV", stats(&[1.0, 2.0, 3.0])).summary();
        assert!(text.starts_with("Statistics for masses @ 50 GeV:"));
        for key in ["count=3", "mean=2.000", "median=2.000", "min=1.000", "max=3.000", "q1=1.000", "q3=3.000"] {
            assert!(text.contains(key), "missing {key} in {text}");
        }
    }

    #[test]
    fn local_insight_reports_skew_and_outliers() {
        let mut values = vec![1.0; 20];
        values.extend([2.0, 2.0, 3.0, 50.0]);
        let text = LocalInsight
            .describe(&InsightRequest::new("pt", stats(&values)))
            .unwrap();
        assert!(text.contains("right-skewed"), "{text}");
        assert!(text.contains("upper fence"), "{text}");
    }

    #[test]
    fn local_insight_handles_constant_data() {
        let text = LocalInsight
            .describe(&InsightRequest::new("flat", stats(&[4.0; 5])))
            .unwrap();
        assert!(text.contains("identical"));
    }

    #[test]
    fn local_insight_skips_shape_when_metrics_are_missing() {
        let mut s = stats(&[125.0]);
        s.std = f64::NAN;
        let text = LocalInsight
            .describe(&InsightRequest::new("masses", s))
            .unwrap();
        assert!(text.contains("missing"));
        assert!(!text.contains("skewed") && !text.contains("symmetric"));
    }

    #[test]
    fn local_insight_sees_symmetry() {
        let values: Vec<f64> = (-10..=10).map(f64::from).collect();
        let text = LocalInsight
            .describe(&InsightRequest::new("sym", stats(&values)))
            .unwrap();
        assert!(text.contains("roughly symmetric"));
        assert!(!text.contains("fence"));
    }

    #[test]
    fn request_delivers_outcome() {
        let (mut state, _open) = scripted();
        state.request(InsightRequest::new("masses", stats(&[1.0])));
        assert!(state.is_pending());
        wait_for(&mut state);
        assert_eq!(state.outcome, Some(Ok("about masses".to_string())));
    }

    #[test]
    fn stale_result_is_discarded() {
        let (mut state, open) = scripted();
        state.request(InsightRequest::new("slow", stats(&[1.0])));
        state.request(InsightRequest::new("fresh", stats(&[1.0])));
        wait_for(&mut state);
        assert_eq!(state.outcome, Some(Ok("about fresh".to_string())));

        // let the superseded request finish; it must not replace the outcome
        open.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(!state.poll());
        assert_eq!(state.outcome, Some(Ok("about fresh".to_string())));
    }

    #[test]
    fn invalidate_drops_in_flight_request() {
        let (mut state, _open) = scripted();
        state.request(InsightRequest::new("masses", stats(&[1.0])));
        state.invalidate();
        std::thread::sleep(Duration::from_millis(50));
        state.poll();
        assert!(state.outcome.is_none());
        assert!(!state.is_pending());
    }

    #[test]
    fn failures_and_panics_become_errors() {
        let (mut state, _open) = scripted();
        state.request(InsightRequest::new("fail", stats(&[1.0])));
        wait_for(&mut state);
        assert_eq!(
            state.outcome,
            Some(Err(InsightError::Service("quota exceeded".to_string())))
        );

        state.request(InsightRequest::new("boom", stats(&[1.0])));
        wait_for(&mut state);
        assert_eq!(state.outcome, Some(Err(InsightError::WorkerLost)));
    }
}
