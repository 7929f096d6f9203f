use std::collections::BTreeMap;

use serde::Serialize;

use crate::shared::constants::COLLISION_DISTANCE_EPSILON;
use crate::shared::geometry::{bbox_center, distance, BBox, Point};
use crate::shared::track::TrackSet;

use super::analytics_config::AnalyticsConfig;
use super::analytics_error::AnalyticsError;
use super::events::{NearMissEvent, Severity};

/// A vehicle's box at one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    pub frame_index: usize,
    pub track_id: u32,
    pub bbox: BBox,
    pub timestamp: f64,
}

impl VehicleState {
    pub fn center(&self) -> Point {
        bbox_center(&self.bbox)
    }
}

/// Time-to-collision from the change in center distance between frames.
///
/// Returns `Some(0.0)` when the centers already coincide, `None` when the
/// pair is not converging, otherwise `dist_curr / closing_speed`.
pub fn time_to_collision(dist_prev: f64, dist_curr: f64, fps: f64) -> Option<f64> {
    if dist_curr < COLLISION_DISTANCE_EPSILON {
        return Some(0.0);
    }
    let closing_speed = (dist_prev - dist_curr) * fps;
    if closing_speed <= 0.0 {
        return None;
    }
    Some(dist_curr / closing_speed)
}

/// Thresholds used by [`CollisionRiskDetector`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionThresholds {
    pub ttc_warning_s: f64,
    pub ttc_critical_s: f64,
    pub proximity_px: f64,
    pub max_frame_gap: usize,
    pub cluster_gap_frames: usize,
}

impl From<&AnalyticsConfig> for CollisionThresholds {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            ttc_warning_s: config.ttc_warning_s,
            ttc_critical_s: config.ttc_critical_s,
            proximity_px: config.proximity_px,
            max_frame_gap: config.max_frame_gap,
            cluster_gap_frames: config.cluster_gap_frames,
        }
    }
}

impl Default for CollisionThresholds {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

type FrameLookup = BTreeMap<usize, BTreeMap<u32, VehicleState>>;

/// Near-miss detection between pairs of tracks via time-to-collision.
pub struct CollisionRiskDetector {
    thresholds: CollisionThresholds,
}

impl CollisionRiskDetector {
    pub fn new(thresholds: CollisionThresholds) -> Self {
        Self { thresholds }
    }

    /// Consolidated near-miss events, sorted by frame index.
    pub fn detect(&self, tracks: &TrackSet, fps: f64) -> Result<Vec<NearMissEvent>, AnalyticsError> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(AnalyticsError::InvalidFps(fps));
        }
        let raw = self.raw_events(tracks, fps);
        let raw_count = raw.len();
        let events = self.consolidate(raw);
        log::info!(
            "Detected {} near-miss events ({raw_count} raw) across {} tracks",
            events.len(),
            tracks.len()
        );
        Ok(events)
    }

    /// Every frame-pair event under the warning threshold, unconsolidated.
    pub fn raw_events(&self, tracks: &TrackSet, fps: f64) -> Vec<NearMissEvent> {
        let frames = build_frame_lookup(tracks, fps);
        let indices: Vec<usize> = frames.keys().copied().collect();

        let mut events = Vec::new();
        for window in indices.windows(2) {
            let (prev_idx, curr_idx) = (window[0], window[1]);
            if curr_idx - prev_idx > self.thresholds.max_frame_gap {
                continue;
            }
            let prev = &frames[&prev_idx];
            let curr = &frames[&curr_idx];
            let present: Vec<(&VehicleState, &VehicleState)> = curr
                .iter()
                .filter_map(|(tid, state)| prev.get(tid).map(|p| (state, p)))
                .collect();

            for (i, &(a_curr, a_prev)) in present.iter().enumerate() {
                for &(b_curr, b_prev) in &present[i + 1..] {
                    if let Some(event) = self.score_pair(a_curr, a_prev, b_curr, b_prev, fps) {
                        events.push(event);
                    }
                }
            }
        }
        events
    }

    fn score_pair(
        &self,
        a_curr: &VehicleState,
        a_prev: &VehicleState,
        b_curr: &VehicleState,
        b_prev: &VehicleState,
        fps: f64,
    ) -> Option<NearMissEvent> {
        let dist_curr = distance(a_curr.center(), b_curr.center());
        if dist_curr > self.thresholds.proximity_px {
            return None;
        }
        let dist_prev = distance(a_prev.center(), b_prev.center());
        let ttc = time_to_collision(dist_prev, dist_curr, fps)?;
        if ttc >= self.thresholds.ttc_warning_s {
            return None;
        }

        let severity = if ttc < self.thresholds.ttc_critical_s {
            Severity::Critical
        } else {
            Severity::Warning
        };
        Some(NearMissEvent {
            frame_index: a_curr.frame_index,
            track_id_1: a_curr.track_id,
            track_id_2: b_curr.track_id,
            ttc,
            distance: dist_curr,
            relative_speed: if ttc > 0.0 { dist_curr / ttc } else { 0.0 },
            severity,
        })
    }

    /// Collapses bursts of raw events into one representative per episode.
    ///
    /// Events are grouped by unordered track pair and split into clusters
    /// wherever consecutive events are more than `cluster_gap_frames`
    /// apart. The minimum-TTC event of each cluster is kept (the earliest
    /// on ties). Applying this to its own output is a no-op.
    pub fn consolidate(&self, raw: Vec<NearMissEvent>) -> Vec<NearMissEvent> {
        let mut groups: BTreeMap<(u32, u32), Vec<NearMissEvent>> = BTreeMap::new();
        for event in raw {
            groups.entry(event.pair()).or_default().push(event);
        }

        let mut result = Vec::new();
        for (_, mut group) in groups {
            group.sort_by_key(|e| e.frame_index);
            let mut cluster_start = 0;
            for i in 1..=group.len() {
                let boundary = i == group.len()
                    || group[i].frame_index - group[i - 1].frame_index
                        > self.thresholds.cluster_gap_frames;
                if boundary {
                    if let Some(best) = group[cluster_start..i]
                        .iter()
                        .min_by(|a, b| a.ttc.total_cmp(&b.ttc))
                    {
                        result.push(best.clone());
                    }
                    cluster_start = i;
                }
            }
        }

        result.sort_by_key(|e| (e.frame_index, e.pair()));
        result
    }
}

impl Default for CollisionRiskDetector {
    fn default() -> Self {
        Self::new(CollisionThresholds::default())
    }
}

fn build_frame_lookup(tracks: &TrackSet, fps: f64) -> FrameLookup {
    let mut frames: FrameLookup = BTreeMap::new();
    for track in tracks.with_min_frames(2) {
        for f in track.frames() {
            frames.entry(f.frame_index).or_default().insert(
                track.id(),
                VehicleState {
                    frame_index: f.frame_index,
                    track_id: track.id(),
                    bbox: f.bbox,
                    timestamp: f.timestamp(fps),
                },
            );
        }
    }
    frames
}

/// Headline numbers for a set of near-miss events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SafetySummary {
    pub events_detected: usize,
    pub critical_events: usize,
}

impl SafetySummary {
    pub fn from_events(events: &[NearMissEvent]) -> Self {
        Self {
            events_detected: events.len(),
            critical_events: events
                .iter()
                .filter(|e| e.severity == Severity::Critical)
                .count(),
        }
    }
}
