use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::analytics::domain::analysis_results::AnalysisResults;
use crate::analytics::domain::analytics_config::AnalyticsConfig;
use crate::analytics::domain::events::{LaneChangeEvent, LaneEventType, NearMissEvent, Severity};
use crate::shared::detection::Detection;
use crate::shared::scene::Scene;
use crate::shared::video_metadata::VideoMetadata;
use crate::storage::domain::analytics_store::{AnalyticsStore, StoreError};
use crate::storage::domain::video_document::VideoDocument;

/// Holds video documents in process memory.
///
/// `replace_results` applies the whole result set under one lock, so
/// readers never observe a partial replacement.
#[derive(Default)]
pub struct InMemoryStore {
    videos: Mutex<HashMap<u32, VideoDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a video document, keyed by its video id.
    pub fn insert(&self, document: VideoDocument) -> Result<(), StoreError> {
        self.lock()?.insert(document.video.id, document);
        Ok(())
    }

    /// Snapshot of the stored document.
    pub fn document(&self, video_id: u32) -> Result<VideoDocument, StoreError> {
        self.with_document(video_id, |doc| doc.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<u32, VideoDocument>>, StoreError> {
        self.videos.lock().map_err(|_| StoreError::Poisoned)
    }

    fn with_document<T>(
        &self,
        video_id: u32,
        f: impl FnOnce(&VideoDocument) -> T,
    ) -> Result<T, StoreError> {
        let videos = self.lock()?;
        videos
            .get(&video_id)
            .map(f)
            .ok_or(StoreError::UnknownVideo(video_id))
    }
}

impl AnalyticsStore for InMemoryStore {
    fn load_metadata(&self, video_id: u32) -> Result<VideoMetadata, StoreError> {
        self.with_document(video_id, |doc| doc.video.clone())
    }

    fn load_detections(&self, video_id: u32) -> Result<Vec<Detection>, StoreError> {
        self.with_document(video_id, |doc| doc.detections.clone())
    }

    fn load_scene(&self, video_id: u32) -> Result<Scene, StoreError> {
        self.with_document(video_id, VideoDocument::scene)
    }

    fn load_config(&self, video_id: u32) -> Result<AnalyticsConfig, StoreError> {
        self.with_document(video_id, |doc| doc.config.clone())
    }

    fn replace_results(
        &self,
        video_id: u32,
        results: &AnalysisResults,
    ) -> Result<(), StoreError> {
        let mut videos = self.lock()?;
        let doc = videos
            .get_mut(&video_id)
            .ok_or(StoreError::UnknownVideo(video_id))?;
        doc.apply(results);
        Ok(())
    }

    fn lane_events(
        &self,
        video_id: u32,
        event_type: Option<LaneEventType>,
    ) -> Result<Vec<LaneChangeEvent>, StoreError> {
        self.with_document(video_id, |doc| doc.lane_events_of(event_type))
    }

    fn near_miss_events(
        &self,
        video_id: u32,
        severity: Option<Severity>,
    ) -> Result<Vec<NearMissEvent>, StoreError> {
        self.with_document(video_id, |doc| doc.near_misses_of(severity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_video(id: u32) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert(VideoDocument::new(VideoMetadata::new(id, 25.0)))
            .unwrap();
        store
    }

    #[test]
    fn test_load_metadata() {
        let store = store_with_video(4);
        assert_eq!(store.load_metadata(4).unwrap().fps, 25.0);
    }

    #[test]
    fn test_unknown_video() {
        let store = store_with_video(4);
        assert!(matches!(
            store.load_detections(5),
            Err(StoreError::UnknownVideo(5))
        ));
        assert!(matches!(
            store.replace_results(5, &AnalysisResults::default()),
            Err(StoreError::UnknownVideo(5))
        ));
    }

    #[test]
    fn test_replace_results_visible_in_queries() {
        let store = store_with_video(1);
        let event = NearMissEvent {
            frame_index: 12,
            track_id_1: 1,
            track_id_2: 2,
            ttc: 0.5,
            distance: 20.0,
            relative_speed: 40.0,
            severity: Severity::Critical,
        };
        store
            .replace_results(
                1,
                &AnalysisResults {
                    near_misses: Some(vec![event.clone()]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.near_miss_events(1, None).unwrap(), vec![event]);
        assert!(store
            .near_miss_events(1, Some(Severity::Warning))
            .unwrap()
            .is_empty());
        assert!(store.lane_events(1, None).unwrap().is_empty());
    }
}
