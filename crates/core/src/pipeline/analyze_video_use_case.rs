use std::collections::BTreeSet;

use crate::analytics::domain::analysis_results::{AnalysisKind, AnalysisResults};
use crate::analytics::domain::analytics_config::AnalyticsConfig;
use crate::analytics::domain::collision_risk_detector::CollisionRiskDetector;
use crate::analytics::domain::lane_zone_classifier::LaneZoneClassifier;
use crate::analytics::domain::line_crossing_counter::LineCrossingCounter;
use crate::analytics::domain::speed_estimator::SpeedEstimator;
use crate::shared::scene::{CountingLine, LaneZone};
use crate::shared::track::TrackSet;
use crate::storage::domain::analytics_store::AnalyticsStore;

use super::analytics_executor::{AnalysisOutput, AnalysisTask, AnalyticsExecutor};
use super::pipeline_error::PipelineError;
use super::pipeline_logger::PipelineLogger;

/// Analyzers configured for one pass, built only after every requested
/// analysis has passed its configuration checks.
enum PreparedAnalysis {
    LineCounts(Vec<CountingLine>),
    LaneEvents(LaneZoneClassifier, Vec<LaneZone>),
    NearMisses(CollisionRiskDetector, f64),
    Speeds(SpeedEstimator),
}

impl PreparedAnalysis {
    fn kind(&self) -> AnalysisKind {
        match self {
            PreparedAnalysis::LineCounts(_) => AnalysisKind::LineCounts,
            PreparedAnalysis::LaneEvents(..) => AnalysisKind::LaneEvents,
            PreparedAnalysis::NearMisses(..) => AnalysisKind::NearMisses,
            PreparedAnalysis::Speeds(_) => AnalysisKind::Speeds,
        }
    }

    fn into_task(self, tracks: &TrackSet) -> AnalysisTask<'_> {
        let kind = self.kind();
        AnalysisTask::new(kind, move || match self {
            PreparedAnalysis::LineCounts(lines) => Ok(AnalysisOutput::LineCounts(
                LineCrossingCounter::new().count(tracks, &lines),
            )),
            PreparedAnalysis::LaneEvents(classifier, zones) => Ok(AnalysisOutput::LaneEvents(
                classifier.detect(tracks, &zones)?,
            )),
            PreparedAnalysis::NearMisses(detector, fps) => {
                Ok(AnalysisOutput::NearMisses(detector.detect(tracks, fps)?))
            }
            PreparedAnalysis::Speeds(estimator) => {
                Ok(AnalysisOutput::Speeds(estimator.estimate(tracks)))
            }
        })
    }
}

/// Runs one analysis pass for one video.
///
/// Loads inputs from the store, checks the configuration of every
/// requested analysis before touching any track, runs the analyzers
/// through an `AnalyticsExecutor` and commits all outputs with a single
/// `replace_results` call. A failed pass leaves the store untouched.
///
/// Passes for the same video must not run concurrently.
pub struct AnalyzeVideoUseCase<'s> {
    store: &'s dyn AnalyticsStore,
    executor: Box<dyn AnalyticsExecutor>,
    logger: Box<dyn PipelineLogger>,
    config: Option<AnalyticsConfig>,
    fps: Option<f64>,
}

impl<'s> AnalyzeVideoUseCase<'s> {
    pub fn new(
        store: &'s dyn AnalyticsStore,
        executor: Box<dyn AnalyticsExecutor>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            store,
            executor,
            logger,
            config: None,
            fps: None,
        }
    }

    /// Use `config` instead of the configuration stored with the video.
    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use `fps` instead of the stored frame rate.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn logger(&self) -> &dyn PipelineLogger {
        self.logger.as_ref()
    }

    /// Run `kinds`, or every analysis the scene has geometry for when
    /// `kinds` is `None`.
    pub fn execute(
        &mut self,
        video_id: u32,
        kinds: Option<&[AnalysisKind]>,
    ) -> Result<AnalysisResults, PipelineError> {
        let mut metadata = self.store.load_metadata(video_id)?;
        if let Some(fps) = self.fps {
            metadata.fps = fps;
        }
        let scene = self.store.load_scene(video_id)?;
        let config = match &self.config {
            Some(config) => config.clone(),
            None => self.store.load_config(video_id)?,
        };

        let kinds: BTreeSet<AnalysisKind> = match kinds {
            Some(kinds) => kinds.iter().copied().collect(),
            None => AnalysisKind::applicable(&scene).into_iter().collect(),
        };
        if kinds.is_empty() {
            log::warn!("No analyses requested for video {video_id}");
            return Ok(AnalysisResults::default());
        }

        config.validate()?;
        let prepared = kinds
            .iter()
            .map(|&kind| -> Result<PreparedAnalysis, PipelineError> {
                Ok(match kind {
                    AnalysisKind::LineCounts => {
                        PreparedAnalysis::LineCounts(scene.counting_lines())
                    }
                    AnalysisKind::LaneEvents => {
                        LaneZoneClassifier::validate_zones(&scene.zones)?;
                        PreparedAnalysis::LaneEvents(
                            LaneZoneClassifier::new(config.min_frames_in_zone),
                            scene.zones.clone(),
                        )
                    }
                    AnalysisKind::NearMisses => PreparedAnalysis::NearMisses(
                        CollisionRiskDetector::new((&config).into()),
                        metadata.checked_fps()?,
                    ),
                    AnalysisKind::Speeds => {
                        let calibration = scene.calibration_line()?;
                        PreparedAnalysis::Speeds(
                            SpeedEstimator::new(&calibration, metadata.checked_fps()?)?
                                .with_max_speed(config.max_speed_kmh),
                        )
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                log::warn!("Video {video_id} not analyzed: {e}");
                e
            })?;

        let detections = self.store.load_detections(video_id)?;
        let tracks = TrackSet::from_detections(&detections);
        self.logger.metric("tracks", tracks.len() as f64);
        self.logger.metric("detections", detections.len() as f64);
        self.logger.info(&format!(
            "Analyzing video {video_id}: {} tracks, {} analyses",
            tracks.len(),
            prepared.len()
        ));

        let tasks: Vec<AnalysisTask<'_>> =
            prepared.into_iter().map(|p| p.into_task(&tracks)).collect();
        let total = tasks.len();
        let completed = self.executor.execute(tasks)?;

        let mut results = AnalysisResults::default();
        for (i, done) in completed.into_iter().enumerate() {
            self.logger.timing(done.kind.as_str(), done.elapsed_ms);
            self.logger.progress(i + 1, total);
            done.output.store_into(&mut results);
        }

        self.store.replace_results(video_id, &results)?;
        for kind in results.kinds() {
            self.logger.metric(kind.as_str(), results.count(kind) as f64);
        }
        self.logger
            .info(&format!("Committed results for video {video_id}"));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::analytics_error::AnalyticsError;
    use crate::pipeline::analytics_executor::SequentialAnalyticsExecutor;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::detection::Detection;
    use crate::shared::scene::{AnalyticsLine, LineType, ZoneType};
    use crate::shared::video_metadata::VideoMetadata;
    use crate::storage::domain::video_document::VideoDocument;
    use crate::storage::infrastructure::memory_store::InMemoryStore;
    use serde_json::Map;

    // --- Helpers ---

    fn count_line() -> AnalyticsLine {
        AnalyticsLine {
            id: 1,
            name: "gate".into(),
            line_type: LineType::Count,
            points: vec![[100.0, 0.0], [100.0, 200.0]],
            meta_data: Map::new(),
        }
    }

    /// One track crossing the count line left to right.
    fn document() -> VideoDocument {
        let mut doc = VideoDocument::new(VideoMetadata::new(1, 30.0));
        doc.lines = vec![count_line()];
        doc.detections = [0.0, 50.0, 150.0, 200.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| Detection::new(Some(1), i, [x - 10.0, 90.0, x + 10.0, 110.0]))
            .collect();
        doc
    }

    fn use_case(store: &InMemoryStore) -> AnalyzeVideoUseCase<'_> {
        AnalyzeVideoUseCase::new(
            store,
            Box::new(SequentialAnalyticsExecutor::new()),
            Box::new(NullPipelineLogger),
        )
    }

    // --- Tests ---

    #[test]
    fn test_default_kinds_follow_scene() {
        let store = InMemoryStore::new();
        store.insert(document()).unwrap();

        let results = use_case(&store).execute(1, None).unwrap();

        assert_eq!(
            results.kinds(),
            vec![AnalysisKind::LineCounts, AnalysisKind::NearMisses]
        );
        assert_eq!(results.line_counts.unwrap()[&1].outbound, 1);
    }

    #[test]
    fn test_missing_ego_zone_commits_nothing() {
        let store = InMemoryStore::new();
        let mut doc = document();
        doc.zones = vec![LaneZone::new(
            1,
            ZoneType::AdjacentLeft,
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]],
        )];
        store.insert(doc.clone()).unwrap();

        let err = use_case(&store)
            .execute(1, Some(&[AnalysisKind::LineCounts, AnalysisKind::LaneEvents]))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Analytics(AnalyticsError::MissingEgoZone)
        ));
        assert_eq!(store.document(1).unwrap(), doc);
    }

    #[test]
    fn test_speeds_without_calibration_is_error() {
        let store = InMemoryStore::new();
        store.insert(document()).unwrap();

        let err = use_case(&store)
            .execute(1, Some(&[AnalysisKind::Speeds]))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Analytics(AnalyticsError::MissingCalibrationLine)
        ));
    }

    #[test]
    fn test_invalid_fps_override_rejected() {
        let store = InMemoryStore::new();
        store.insert(document()).unwrap();

        let err = use_case(&store)
            .with_fps(0.0)
            .execute(1, Some(&[AnalysisKind::NearMisses]))
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Analytics(AnalyticsError::InvalidFps(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let store = InMemoryStore::new();
        store.insert(document()).unwrap();
        let config = AnalyticsConfig {
            min_frames_in_zone: 0,
            ..Default::default()
        };

        let err = use_case(&store)
            .with_config(config)
            .execute(1, None)
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Analytics(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_video_is_store_error() {
        let store = InMemoryStore::new();
        assert!(matches!(
            use_case(&store).execute(9, None),
            Err(PipelineError::Store(_))
        ));
    }

    #[test]
    fn test_empty_kind_list_is_noop() {
        let store = InMemoryStore::new();
        store.insert(document()).unwrap();

        let results = use_case(&store).execute(1, Some(&[])).unwrap();

        assert!(results.is_empty());
        assert_eq!(store.document(1).unwrap(), document());
    }
}
