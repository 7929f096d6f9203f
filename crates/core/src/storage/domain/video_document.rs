use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analytics::domain::analysis_results::AnalysisResults;
use crate::analytics::domain::analytics_config::AnalyticsConfig;
use crate::analytics::domain::events::{
    LaneChangeEvent, LaneEventType, LineCrossingTally, NearMissEvent, Severity, TrackSpeeds,
};
use crate::shared::constants::SPEED_META_KEY;
use crate::shared::detection::Detection;
use crate::shared::scene::{AnalyticsLine, LaneZone, LineType, Scene};
use crate::shared::video_metadata::VideoMetadata;

/// Everything stored for one video: inputs and the latest derived outputs.
///
/// Both store adapters keep one of these per video; the file store
/// serializes it as a single JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoDocument {
    pub video: VideoMetadata,
    #[serde(default)]
    pub config: AnalyticsConfig,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub lines: Vec<AnalyticsLine>,
    #[serde(default)]
    pub zones: Vec<LaneZone>,
    #[serde(default)]
    pub lane_events: Vec<LaneChangeEvent>,
    #[serde(default)]
    pub near_miss_events: Vec<NearMissEvent>,
}

impl VideoDocument {
    pub fn new(video: VideoMetadata) -> Self {
        Self {
            video,
            config: AnalyticsConfig::default(),
            detections: Vec::new(),
            lines: Vec::new(),
            zones: Vec::new(),
            lane_events: Vec::new(),
            near_miss_events: Vec::new(),
        }
    }

    pub fn scene(&self) -> Scene {
        Scene {
            lines: self.lines.clone(),
            zones: self.zones.clone(),
        }
    }

    /// Write every present output kind over the stored one.
    pub fn apply(&mut self, results: &AnalysisResults) {
        if let Some(tallies) = &results.line_counts {
            self.apply_line_counts(tallies);
        }
        if let Some(events) = &results.lane_events {
            self.lane_events = events.clone();
        }
        if let Some(events) = &results.near_misses {
            self.near_miss_events = events.clone();
        }
        if let Some(speeds) = &results.speeds {
            self.apply_speeds(speeds);
        }
    }

    /// Merge `in`/`out` into each tallied count line's metadata. Other
    /// metadata keys survive.
    fn apply_line_counts(&mut self, tallies: &LineCrossingTally) {
        for line in self
            .lines
            .iter_mut()
            .filter(|l| l.line_type == LineType::Count)
        {
            if let Some(tally) = tallies.get(&line.id) {
                line.meta_data
                    .insert("in".to_string(), Value::from(tally.inbound));
                line.meta_data
                    .insert("out".to_string(), Value::from(tally.outbound));
            }
        }
    }

    /// Annotate detections with their speed sample, dropping annotations
    /// from earlier passes first.
    fn apply_speeds(&mut self, speeds: &TrackSpeeds) {
        let lookup: HashMap<(u32, usize), f64> = speeds
            .values()
            .flatten()
            .map(|s| ((s.track_id, s.frame_index), s.speed_kmh))
            .collect();

        for det in &mut self.detections {
            det.extra_meta.remove(SPEED_META_KEY);
            let Some(tid) = det.track_id else {
                continue;
            };
            if let Some(&kmh) = lookup.get(&(tid, det.frame_index)) {
                det.extra_meta
                    .insert(SPEED_META_KEY.to_string(), Value::from(kmh));
            }
        }
    }

    pub fn lane_events_of(&self, event_type: Option<LaneEventType>) -> Vec<LaneChangeEvent> {
        let mut events: Vec<LaneChangeEvent> = self
            .lane_events
            .iter()
            .filter(|e| event_type.map_or(true, |t| e.event_type == t))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.frame_index);
        events
    }

    pub fn near_misses_of(&self, severity: Option<Severity>) -> Vec<NearMissEvent> {
        let mut events: Vec<NearMissEvent> = self
            .near_miss_events
            .iter()
            .filter(|e| severity.map_or(true, |s| e.severity == s))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.frame_index);
        events
    }
}
