//! Injectable stage timers.
//!
//! Components never read a global clock for instrumentation. Callers pass
//! a [`Stopwatch`]; [`NoopTimer`] discards everything and [`StageTimer`]
//! keeps an ordered list of stage durations.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Sink for stage timings.
pub trait Stopwatch {
    /// Record that `stage` took `elapsed`.
    fn record(&mut self, stage: &'static str, elapsed: Duration);

    /// Run `f`, recording its wall time under `stage`.
    fn time<T>(&mut self, stage: &'static str, f: impl FnOnce() -> T) -> T
    where
        Self: Sized,
    {
        let start = Instant::now();
        let out = f();
        self.record(stage, start.elapsed());
        out
    }
}

/// Discards all timings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTimer;

impl Stopwatch for NoopTimer {
    fn record(&mut self, _stage: &'static str, _elapsed: Duration) {}
}

/// One recorded stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    #[serde(serialize_with = "as_micros")]
    pub elapsed: Duration,
}

fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_micros())
}

/// Records stages in call order and logs each one at debug level.
#[derive(Debug, Default, Clone, Serialize)]
pub struct StageTimer {
    stages: Vec<StageTiming>,
}

impl StageTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    /// Sum of all recorded stages.
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }

    /// Duration of the first stage named `stage`.
    pub fn get(&self, stage: &str) -> Option<Duration> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.elapsed)
    }
}

impl Stopwatch for StageTimer {
    fn record(&mut self, stage: &'static str, elapsed: Duration) {
        tracing::debug!(stage, elapsed = %format_elapsed(elapsed), "stage finished");
        self.stages.push(StageTiming { stage, elapsed });
    }
}

/// Human-readable duration: microseconds below 2ms, milliseconds from there.
pub fn format_elapsed(d: Duration) -> String {
    if d < Duration::from_millis(2) {
        format!("{}µs", d.as_micros())
    } else {
        format!("{}ms", d.as_millis())
    }
}
