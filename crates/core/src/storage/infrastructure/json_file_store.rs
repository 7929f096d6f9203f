use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;

use crate::analytics::domain::analysis_results::AnalysisResults;
use crate::analytics::domain::analytics_config::AnalyticsConfig;
use crate::analytics::domain::events::{LaneChangeEvent, LaneEventType, NearMissEvent, Severity};
use crate::shared::detection::Detection;
use crate::shared::scene::Scene;
use crate::shared::video_metadata::VideoMetadata;
use crate::storage::domain::analytics_store::{AnalyticsStore, StoreError};
use crate::storage::domain::video_document::VideoDocument;

/// Reads a video document from disk.
pub fn load_document(path: &Path) -> Result<VideoDocument, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes a video document atomically.
///
/// The document goes to a temp file in the destination directory which is
/// then renamed over `path`; on any failure the old file is untouched and
/// the temp file is removed.
pub fn save_document(path: &Path, document: &VideoDocument) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, document).map_err(|e| StoreError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        writer.flush().map_err(write_err)?;
    }
    temp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// One JSON document per video on disk.
///
/// Documents are read fresh on every call. Writes hold the store lock for
/// the whole read-modify-write, so passes through one store instance never
/// interleave.
#[derive(Default)]
pub struct JsonFileStore {
    paths: Mutex<HashMap<u32, PathBuf>>,
}

impl JsonFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document file and return the video id it holds.
    pub fn add_document(&self, path: impl Into<PathBuf>) -> Result<u32, StoreError> {
        let path = path.into();
        let video_id = load_document(&path)?.video.id;

        let mut paths = self.lock()?;
        if let Some(existing) = paths.get(&video_id) {
            if *existing != path {
                return Err(StoreError::DuplicateVideo(video_id));
            }
        }
        log::info!("Registered video {video_id} at {}", path.display());
        paths.insert(video_id, path);
        Ok(video_id)
    }

    pub fn path_of(&self, video_id: u32) -> Result<PathBuf, StoreError> {
        self.lock()?
            .get(&video_id)
            .cloned()
            .ok_or(StoreError::UnknownVideo(video_id))
    }

    pub fn document(&self, video_id: u32) -> Result<VideoDocument, StoreError> {
        load_document(&self.path_of(video_id)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<u32, PathBuf>>, StoreError> {
        self.paths.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl AnalyticsStore for JsonFileStore {
    fn load_metadata(&self, video_id: u32) -> Result<VideoMetadata, StoreError> {
        Ok(self.document(video_id)?.video)
    }

    fn load_detections(&self, video_id: u32) -> Result<Vec<Detection>, StoreError> {
        Ok(self.document(video_id)?.detections)
    }

    fn load_scene(&self, video_id: u32) -> Result<Scene, StoreError> {
        Ok(self.document(video_id)?.scene())
    }

    fn load_config(&self, video_id: u32) -> Result<AnalyticsConfig, StoreError> {
        Ok(self.document(video_id)?.config)
    }

    fn replace_results(
        &self,
        video_id: u32,
        results: &AnalysisResults,
    ) -> Result<(), StoreError> {
        let paths = self.lock()?;
        let path = paths
            .get(&video_id)
            .ok_or(StoreError::UnknownVideo(video_id))?;

        let mut document = load_document(path)?;
        document.apply(results);
        save_document(path, &document)?;
        log::debug!("Wrote results for video {video_id} to {}", path.display());
        Ok(())
    }

    fn lane_events(
        &self,
        video_id: u32,
        event_type: Option<LaneEventType>,
    ) -> Result<Vec<LaneChangeEvent>, StoreError> {
        Ok(self.document(video_id)?.lane_events_of(event_type))
    }

    fn near_miss_events(
        &self,
        video_id: u32,
        severity: Option<Severity>,
    ) -> Result<Vec<NearMissEvent>, StoreError> {
        Ok(self.document(video_id)?.near_misses_of(severity))
    }
}
