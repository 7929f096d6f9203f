use std::path::PathBuf;

use thiserror::Error;

use crate::analytics::domain::analysis_results::AnalysisResults;
use crate::analytics::domain::analytics_config::AnalyticsConfig;
use crate::analytics::domain::events::{LaneChangeEvent, LaneEventType, NearMissEvent, Severity};
use crate::shared::detection::Detection;
use crate::shared::scene::Scene;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown video {0}")]
    UnknownVideo(u32),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("video {0} is already registered")]
    DuplicateVideo(u32),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Persistence collaborator for one or more videos.
///
/// This is a port (domain interface). Infrastructure provides the
/// concrete in-memory and file-backed stores.
pub trait AnalyticsStore: Send + Sync {
    fn load_metadata(&self, video_id: u32) -> Result<VideoMetadata, StoreError>;

    /// Stored detections, in stored order.
    fn load_detections(&self, video_id: u32) -> Result<Vec<Detection>, StoreError>;

    /// Analytics lines and lane zones configured for the video.
    fn load_scene(&self, video_id: u32) -> Result<Scene, StoreError>;

    /// Thresholds stored with the video. Stores without one use defaults.
    fn load_config(&self, video_id: u32) -> Result<AnalyticsConfig, StoreError> {
        let _ = video_id;
        Ok(AnalyticsConfig::default())
    }

    /// Replace every output kind present in `results` in one atomic step.
    ///
    /// Kinds that are `None` keep their stored output. Either the whole
    /// replacement lands or nothing changes.
    fn replace_results(&self, video_id: u32, results: &AnalysisResults)
        -> Result<(), StoreError>;

    /// Stored lane events ordered by frame, optionally of one type.
    fn lane_events(
        &self,
        video_id: u32,
        event_type: Option<LaneEventType>,
    ) -> Result<Vec<LaneChangeEvent>, StoreError>;

    /// Stored near-miss events ordered by frame, optionally of one severity.
    fn near_miss_events(
        &self,
        video_id: u32,
        severity: Option<Severity>,
    ) -> Result<Vec<NearMissEvent>, StoreError>;
}
