//! Per-stage timing returned by predictions.

use std::time::Duration;

/// Wall-clock time spent in each stage of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageTimings {
    /// Resizing and tensor layout conversion.
    pub preprocess: Duration,
    /// Time inside the inference runtime.
    pub inference: Duration,
    /// Output decoding and drawing.
    pub postprocess: Duration,
}

impl StageTimings {
    /// Sum of all stages.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.preprocess + self.inference + self.postprocess
    }
}

/// Running totals over many predictions, owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingTotals {
    /// Cumulative preprocessing time.
    pub preprocess: Duration,
    /// Cumulative inference time.
    pub inference: Duration,
    /// Cumulative postprocessing time.
    pub postprocess: Duration,
    /// Number of recorded predictions.
    pub calls: u32,
}

impl TimingTotals {
    /// Creates empty totals.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            preprocess: Duration::ZERO,
            inference: Duration::ZERO,
            postprocess: Duration::ZERO,
            calls: 0,
        }
    }

    /// Adds one prediction's timings.
    pub fn record(&mut self, timings: &StageTimings) {
        self.preprocess += timings.preprocess;
        self.inference += timings.inference;
        self.postprocess += timings.postprocess;
        self.calls = self.calls.saturating_add(1);
    }

    /// Returns `(preprocess, inference, postprocess)`.
    #[must_use]
    pub const fn stages(&self) -> (Duration, Duration, Duration) {
        (self.preprocess, self.inference, self.postprocess)
    }

    /// Mean inference time per call, if any call was recorded.
    #[must_use]
    pub fn mean_inference(&self) -> Option<Duration> {
        (self.calls > 0).then(|| self.inference / self.calls)
    }
}
