use std::time::Instant;

use crate::analytics::domain::analysis_results::{AnalysisKind, AnalysisResults};
use crate::analytics::domain::analytics_error::AnalyticsError;
use crate::analytics::domain::events::{
    LaneChangeEvent, LineCrossingTally, NearMissEvent, TrackSpeeds,
};

use super::pipeline_error::PipelineError;

/// Output of a single analyzer run.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisOutput {
    LineCounts(LineCrossingTally),
    LaneEvents(Vec<LaneChangeEvent>),
    NearMisses(Vec<NearMissEvent>),
    Speeds(TrackSpeeds),
}

impl AnalysisOutput {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisOutput::LineCounts(_) => AnalysisKind::LineCounts,
            AnalysisOutput::LaneEvents(_) => AnalysisKind::LaneEvents,
            AnalysisOutput::NearMisses(_) => AnalysisKind::NearMisses,
            AnalysisOutput::Speeds(_) => AnalysisKind::Speeds,
        }
    }

    /// Move this output into its slot of `results`.
    pub fn store_into(self, results: &mut AnalysisResults) {
        match self {
            AnalysisOutput::LineCounts(t) => results.line_counts = Some(t),
            AnalysisOutput::LaneEvents(e) => results.lane_events = Some(e),
            AnalysisOutput::NearMisses(e) => results.near_misses = Some(e),
            AnalysisOutput::Speeds(s) => results.speeds = Some(s),
        }
    }
}

type TaskFn<'a> = Box<dyn FnOnce() -> Result<AnalysisOutput, AnalyticsError> + Send + 'a>;

/// One analyzer invocation, borrowing the pass's tracks and geometry.
pub struct AnalysisTask<'a> {
    kind: AnalysisKind,
    run: TaskFn<'a>,
}

impl<'a> AnalysisTask<'a> {
    pub fn new(
        kind: AnalysisKind,
        run: impl FnOnce() -> Result<AnalysisOutput, AnalyticsError> + Send + 'a,
    ) -> Self {
        Self {
            kind,
            run: Box::new(run),
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    /// Run the analyzer and time it.
    pub fn run(self) -> Result<CompletedAnalysis, AnalyticsError> {
        let start = Instant::now();
        let output = (self.run)()?;
        Ok(CompletedAnalysis {
            kind: self.kind,
            output,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

#[derive(Debug)]
pub struct CompletedAnalysis {
    pub kind: AnalysisKind,
    pub output: AnalysisOutput,
    pub elapsed_ms: f64,
}

/// Abstracts how the analyses of one pass are scheduled.
///
/// This is a port (application-layer interface). Implementations return
/// completed analyses in task order, or the first error in task order.
pub trait AnalyticsExecutor: Send + Sync {
    fn execute<'a>(
        &self,
        tasks: Vec<AnalysisTask<'a>>,
    ) -> Result<Vec<CompletedAnalysis>, PipelineError>;
}

/// Runs analyses one after another on the calling thread.
pub struct SequentialAnalyticsExecutor;

impl SequentialAnalyticsExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SequentialAnalyticsExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsExecutor for SequentialAnalyticsExecutor {
    fn execute<'a>(
        &self,
        tasks: Vec<AnalysisTask<'a>>,
    ) -> Result<Vec<CompletedAnalysis>, PipelineError> {
        tasks
            .into_iter()
            .map(|task| task.run().map_err(PipelineError::from))
            .collect()
    }
}
