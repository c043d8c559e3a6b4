use std::collections::HashMap;
use std::time::Instant;

use crate::pipeline::pipeline_driver::TickOutcome;

/// Observer for pipeline orchestration.
///
/// Keeps stage timings and tick bookkeeping out of the driver so the CLI
/// can report them while tests stay silent.
pub trait PipelineLogger: Send {
    /// Report the outcome of one tick.
    fn tick(&mut self, tick: u64, outcome: &TickOutcome);

    /// Record how long a named stage took during one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. mean intensity).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn tick(&mut self, _tick: u64, _outcome: &TickOutcome) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and metrics and
/// reports a summary when the run ends.
///
/// Tick lines are throttled to every `throttle_ticks` ticks.
pub struct StdoutPipelineLogger {
    throttle_ticks: u64,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    ticks: u64,
    published: u64,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_ticks: u64) -> Self {
        Self {
            throttle_ticks: throttle_ticks.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            ticks: 0,
            published: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing ran.
    pub fn summary_string(&self) -> Option<String> {
        if self.ticks == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = Vec::new();

        lines.push(format!(
            "Pipeline summary ({} ticks, {} frames published, {:.1}s total):",
            self.ticks,
            self.published,
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.2}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if self.published > 0 && elapsed_ms > 0.0 {
            let fps = self.published as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn tick(&mut self, tick: u64, outcome: &TickOutcome) {
        self.ticks += 1;
        if matches!(outcome, TickOutcome::Published { .. }) {
            self.published += 1;
        }
        if tick % self.throttle_ticks == 0 {
            log::info!("Tick {tick}: {outcome:?} ({} published)", self.published);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
