use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for analysis pass events.
///
/// Use cases report through this trait instead of printing, so the CLI,
/// tests and embedding services can each observe a pass their own way.
pub trait PipelineLogger: Send {
    /// Report how many analyses of the pass have finished.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named analysis took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. track count, events found).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-pass summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that keeps per-analysis timings and metrics and
/// prints a summary report when the pass completes.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    completed: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            completed: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = Vec::new();

        lines.push(format!(
            "Analysis summary ({} analyses, {:.3}s total):",
            self.completed,
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let total_ms: f64 = self.timings[stage].iter().sum();
            lines.push(format!("  {stage:12}: {total_ms:8.2}ms"));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let last = values.last().copied().unwrap_or(0.0);
            lines.push(format!("  {name}: {last}"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.completed = current;
        log::info!("Completed {current}/{total} analyses");
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // --- NullPipelineLogger ---

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 4);
        logger.timing("speeds", 5.0);
        logger.metric("tracks", 3.0);
        logger.info("hello");
        logger.summary();
    }

    // --- StdoutPipelineLogger ---

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("near-misses", 20.0);
        logger.timing("near-misses", 30.0);
        logger.timing("speeds", 5.0);

        let near = logger.timings_for("near-misses").unwrap();
        assert_eq!(near.len(), 2);
        assert_relative_eq!(near[1], 30.0);
        assert_eq!(logger.timings_for("speeds").unwrap().len(), 1);
        assert!(logger.timings_for("lane-events").is_none());
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.metric("tracks", 12.0);
        assert_eq!(logger.metrics_for("tracks").unwrap(), &[12.0]);
    }

    #[test]
    fn test_summary_includes_timings_and_metrics() {
        let mut logger = StdoutPipelineLogger::new();
        logger.progress(2, 2);
        logger.timing("line-counts", 1.5);
        logger.timing("speeds", 2.5);
        logger.metric("tracks", 7.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Analysis summary (2 analyses"));
        assert!(summary.contains("line-counts"));
        assert!(summary.contains("speeds"));
        assert!(summary.contains("tracks: 7"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new().summary_string().is_none());
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::default();
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }
}
