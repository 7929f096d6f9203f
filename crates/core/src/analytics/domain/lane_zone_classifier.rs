use crate::shared::constants::{CONFIDENCE_SATURATION_FRAMES, DEFAULT_MIN_FRAMES_IN_ZONE};
use crate::shared::geometry::{BBox, Point};
use crate::shared::scene::{LaneZone, ZoneType};
use crate::shared::track::{Track, TrackSet};

use super::analytics_error::AnalyticsError;
use super::events::{LaneChangeEvent, LaneEventType};

/// Zone membership of one track observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneObservation {
    pub frame_index: usize,
    pub zone: Option<ZoneType>,
    pub bbox: BBox,
}

/// A maximal stretch of consecutive observations in the same zone.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ZoneRun {
    zone: Option<ZoneType>,
    start: usize,
    len: usize,
}

/// Detects cut-in / cut-out events from track positions relative to
/// polygonal lane zones.
///
/// A track's ground-contact point (bottom-center of its box) is classified
/// into the first zone that contains it. A change of zone becomes an event
/// only when both the zone left and the zone entered are held for at least
/// `min_frames_in_zone` consecutive observations, which suppresses
/// single-frame flicker between neighbouring lanes.
pub struct LaneZoneClassifier {
    min_frames_in_zone: usize,
}

impl LaneZoneClassifier {
    pub fn new(min_frames_in_zone: usize) -> Self {
        Self {
            min_frames_in_zone: min_frames_in_zone.max(1),
        }
    }

    /// Zones must contain exactly one ego zone. An empty list is accepted
    /// and simply yields no events.
    pub fn validate_zones(zones: &[LaneZone]) -> Result<(), AnalyticsError> {
        if zones.is_empty() {
            return Ok(());
        }
        match zones.iter().filter(|z| z.zone_type.is_ego()).count() {
            0 => Err(AnalyticsError::MissingEgoZone),
            1 => Ok(()),
            n => Err(AnalyticsError::MultipleEgoZones(n)),
        }
    }

    /// First zone containing `point`, in configuration order.
    pub fn classify_point(point: Point, zones: &[LaneZone]) -> Option<ZoneType> {
        zones.iter().find(|z| z.contains(point)).map(|z| z.zone_type)
    }

    pub fn zone_history(track: &Track, zones: &[LaneZone]) -> Vec<ZoneObservation> {
        track
            .frames()
            .map(|f| ZoneObservation {
                frame_index: f.frame_index,
                zone: Self::classify_point(f.bottom_center(), zones),
                bbox: f.bbox,
            })
            .collect()
    }

    pub fn detect(
        &self,
        tracks: &TrackSet,
        zones: &[LaneZone],
    ) -> Result<Vec<LaneChangeEvent>, AnalyticsError> {
        Self::validate_zones(zones)?;
        if zones.is_empty() {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for track in tracks.with_min_frames(2) {
            let history = Self::zone_history(track, zones);
            events.extend(self.transitions(track.id(), &history));
        }
        events.sort_by_key(|e| (e.frame_index, e.track_id));

        log::info!(
            "Detected {} lane events across {} tracks",
            events.len(),
            tracks.len()
        );
        Ok(events)
    }

    /// Lane events for one track's zone history.
    pub fn transitions(&self, track_id: u32, history: &[ZoneObservation]) -> Vec<LaneChangeEvent> {
        let runs = zone_runs(history);
        runs.windows(2)
            .filter_map(|pair| {
                let (from, to) = (pair[0], pair[1]);
                if from.len < self.min_frames_in_zone || to.len < self.min_frames_in_zone {
                    return None;
                }
                let (from_zone, to_zone) = (from.zone?, to.zone?);
                let event_type = match (from_zone.is_ego(), to_zone.is_ego()) {
                    (false, true) => LaneEventType::CutIn,
                    (true, false) => LaneEventType::CutOut,
                    _ => return None,
                };
                let entry = &history[to.start];
                log::debug!(
                    "Detected {event_type}: track={track_id}, frame={}, {from_zone} -> {to_zone}",
                    entry.frame_index
                );
                Some(LaneChangeEvent {
                    track_id,
                    event_type,
                    frame_index: entry.frame_index,
                    from_zone,
                    to_zone,
                    confidence: (from.len as f64 / CONFIDENCE_SATURATION_FRAMES).min(1.0),
                    bbox: entry.bbox,
                })
            })
            .collect()
    }
}

impl Default for LaneZoneClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FRAMES_IN_ZONE)
    }
}

fn zone_runs(history: &[ZoneObservation]) -> Vec<ZoneRun> {
    let mut runs: Vec<ZoneRun> = Vec::new();
    for (i, obs) in history.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.zone == obs.zone => run.len += 1,
            _ => runs.push(ZoneRun {
                zone: obs.zone,
                start: i,
                len: 1,
            }),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Three side-by-side vertical lanes, 100 px wide, 0..=300 tall.
    fn lanes() -> Vec<LaneZone> {
        vec![
            LaneZone::new(
                1,
                ZoneType::AdjacentLeft,
                vec![[0.0, 0.0], [100.0, 0.0], [100.0, 300.0], [0.0, 300.0]],
            ),
            LaneZone::new(
                2,
                ZoneType::Ego,
                vec![[100.0, 0.0], [200.0, 0.0], [200.0, 300.0], [100.0, 300.0]],
            ),
            LaneZone::new(
                3,
                ZoneType::AdjacentRight,
                vec![[200.0, 0.0], [300.0, 0.0], [300.0, 300.0], [200.0, 300.0]],
            ),
        ]
    }

    const LEFT_X: f64 = 50.0;
    const EGO_X: f64 = 150.0;
    const RIGHT_X: f64 = 250.0;
    const OFF_X: f64 = 500.0;

    /// A box whose bottom-center sits at `(x, 200)`.
    fn box_at(x: f64) -> BBox {
        [x - 20.0, 160.0, x + 20.0, 200.0]
    }

    fn track_with_positions(id: u32, xs: &[f64]) -> TrackSet {
        let mut tracks = TrackSet::new();
        for (i, &x) in xs.iter().enumerate() {
            tracks.insert(id, i, box_at(x));
        }
        tracks
    }

    fn repeat(x: f64, n: usize) -> Vec<f64> {
        vec![x; n]
    }

    #[test]
    fn test_cut_in_after_dwell() {
        let xs = [repeat(LEFT_X, 5), repeat(EGO_X, 5)].concat();
        let tracks = track_with_positions(1, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.event_type, LaneEventType::CutIn);
        assert_eq!(e.frame_index, 5);
        assert_eq!(e.from_zone, ZoneType::AdjacentLeft);
        assert_eq!(e.to_zone, ZoneType::Ego);
        assert_relative_eq!(e.confidence, 0.5);
        assert_eq!(e.bbox, box_at(EGO_X));
    }

    #[test]
    fn test_single_frame_flicker_into_ego_ignored() {
        let xs = [repeat(LEFT_X, 4), vec![EGO_X], repeat(LEFT_X, 4)].concat();
        let tracks = track_with_positions(1, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_cut_out_to_right_lane() {
        let xs = [repeat(EGO_X, 12), repeat(RIGHT_X, 3)].concat();
        let tracks = track_with_positions(4, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, LaneEventType::CutOut);
        assert_eq!(events[0].frame_index, 12);
        assert_eq!(events[0].to_zone, ZoneType::AdjacentRight);
        // Dwell of 12 frames saturates confidence.
        assert_relative_eq!(events[0].confidence, 1.0);
    }

    #[test]
    fn test_short_dwell_before_transition_ignored() {
        let xs = [repeat(LEFT_X, 2), repeat(EGO_X, 5)].concat();
        let tracks = track_with_positions(1, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_adjacent_to_adjacent_emits_nothing() {
        let xs = [repeat(LEFT_X, 5), repeat(RIGHT_X, 5)].concat();
        let tracks = track_with_positions(1, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_transition_through_no_zone_emits_nothing() {
        let xs = [repeat(LEFT_X, 5), repeat(OFF_X, 5), repeat(EGO_X, 5)].concat();
        let tracks = track_with_positions(1, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        assert!(events.is_empty());
    }

    #[test]
    fn test_cut_in_then_cut_out() {
        let xs = [repeat(RIGHT_X, 4), repeat(EGO_X, 6), repeat(LEFT_X, 3)].concat();
        let tracks = track_with_positions(2, &xs);

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        let kinds: Vec<(LaneEventType, usize)> =
            events.iter().map(|e| (e.event_type, e.frame_index)).collect();
        assert_eq!(
            kinds,
            vec![(LaneEventType::CutIn, 4), (LaneEventType::CutOut, 10)]
        );
        assert_relative_eq!(events[1].confidence, 0.6);
    }

    #[test]
    fn test_events_sorted_across_tracks() {
        let mut tracks = TrackSet::new();
        for (i, x) in [repeat(LEFT_X, 8), repeat(EGO_X, 4)].concat().iter().enumerate() {
            tracks.insert(1, i, box_at(*x));
        }
        for (i, x) in [repeat(LEFT_X, 3), repeat(EGO_X, 4)].concat().iter().enumerate() {
            tracks.insert(2, i, box_at(*x));
        }

        let events = LaneZoneClassifier::new(3).detect(&tracks, &lanes()).unwrap();

        let order: Vec<(usize, u32)> = events.iter().map(|e| (e.frame_index, e.track_id)).collect();
        assert_eq!(order, vec![(3, 2), (8, 1)]);
    }

    #[test]
    fn test_missing_ego_zone_is_error() {
        let zones: Vec<LaneZone> = lanes()
            .into_iter()
            .filter(|z| z.zone_type != ZoneType::Ego)
            .collect();
        let tracks = track_with_positions(1, &[LEFT_X, LEFT_X]);

        let result = LaneZoneClassifier::default().detect(&tracks, &zones);

        assert_eq!(result, Err(AnalyticsError::MissingEgoZone));
    }

    #[test]
    fn test_duplicate_ego_zone_is_error() {
        let mut zones = lanes();
        zones.push(LaneZone::new(
            9,
            ZoneType::Ego,
            vec![[0.0, 400.0], [10.0, 400.0], [10.0, 410.0]],
        ));

        let result = LaneZoneClassifier::validate_zones(&zones);

        assert_eq!(result, Err(AnalyticsError::MultipleEgoZones(2)));
    }

    #[test]
    fn test_no_zones_is_empty_result() {
        let tracks = track_with_positions(1, &[LEFT_X, EGO_X]);
        let events = LaneZoneClassifier::default().detect(&tracks, &[]).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_bottom_center_drives_classification() {
        // Box straddles lanes 1 and 2 but its bottom-center is in ego.
        let bbox = [60.0, 160.0, 180.0, 200.0];
        let zone = LaneZoneClassifier::classify_point([120.0, bbox[3]], &lanes());
        assert_eq!(zone, Some(ZoneType::Ego));
        let mut track = Track::new(1);
        track.insert(0, bbox);
        let history = LaneZoneClassifier::zone_history(&track, &lanes());
        assert_eq!(history[0].zone, Some(ZoneType::Ego));
    }

    #[test]
    fn test_first_matching_zone_wins() {
        let mut zones = lanes();
        zones.insert(
            0,
            LaneZone::new(
                7,
                ZoneType::AdjacentRight,
                vec![[0.0, 0.0], [300.0, 0.0], [300.0, 300.0], [0.0, 300.0]],
            ),
        );
        assert_eq!(
            LaneZoneClassifier::classify_point([150.0, 150.0], &zones),
            Some(ZoneType::AdjacentRight)
        );
    }
}
