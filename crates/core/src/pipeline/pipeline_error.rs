use thiserror::Error;

use crate::analytics::domain::analysis_results::AnalysisKind;
use crate::analytics::domain::analytics_error::AnalyticsError;
use crate::storage::domain::analytics_store::StoreError;

/// Failure of one analysis pass. Nothing is committed when a pass fails.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0} analysis thread panicked")]
    WorkerPanicked(AnalysisKind),
}
