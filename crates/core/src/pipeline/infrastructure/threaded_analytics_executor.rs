use crate::analytics::domain::analysis_results::AnalysisKind;
use crate::analytics::domain::analytics_error::AnalyticsError;
use crate::pipeline::analytics_executor::{AnalysisTask, AnalyticsExecutor, CompletedAnalysis};
use crate::pipeline::pipeline_error::PipelineError;

type TaskResult = (usize, Result<CompletedAnalysis, AnalyticsError>);

/// Runs every analysis of a pass on its own scoped thread.
///
/// Layout: `task thread x N -> channel -> caller`
///
/// Analyzers only read the shared tracks and geometry, so they can run
/// side by side within one video. Results are gathered as they finish and
/// handed back in task order.
pub struct ThreadedAnalyticsExecutor;

impl ThreadedAnalyticsExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedAnalyticsExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsExecutor for ThreadedAnalyticsExecutor {
    fn execute<'a>(
        &self,
        tasks: Vec<AnalysisTask<'a>>,
    ) -> Result<Vec<CompletedAnalysis>, PipelineError> {
        let (done_tx, done_rx) = crossbeam_channel::bounded::<TaskResult>(tasks.len().max(1));
        let mut panicked: Option<AnalysisKind> = None;

        std::thread::scope(|s| {
            let handles: Vec<_> = tasks
                .into_iter()
                .enumerate()
                .map(|(index, task)| {
                    let kind = task.kind();
                    let done_tx = done_tx.clone();
                    let handle = s.spawn(move || {
                        let result = task.run();
                        if let Ok(done) = &result {
                            log::debug!("{kind} finished in {:.2}ms", done.elapsed_ms);
                        }
                        // The receiver outlives the scope.
                        let _ = done_tx.send((index, result));
                    });
                    (kind, handle)
                })
                .collect();

            for (kind, handle) in handles {
                if handle.join().is_err() && panicked.is_none() {
                    panicked = Some(kind);
                }
            }
        });
        drop(done_tx);

        if let Some(kind) = panicked {
            return Err(PipelineError::WorkerPanicked(kind));
        }

        let mut finished: Vec<TaskResult> = done_rx.iter().collect();
        finished.sort_by_key(|(index, _)| *index);
        finished
            .into_iter()
            .map(|(_, result)| result.map_err(PipelineError::from))
            .collect()
    }
}
