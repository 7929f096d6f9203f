use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::shared::scene::Scene;

use super::events::{LaneChangeEvent, LineCrossingTally, NearMissEvent, TrackSpeeds};

/// One analyzer's output kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisKind {
    LineCounts,
    LaneEvents,
    NearMisses,
    Speeds,
}

impl AnalysisKind {
    pub fn all() -> [AnalysisKind; 4] {
        [
            AnalysisKind::LineCounts,
            AnalysisKind::LaneEvents,
            AnalysisKind::NearMisses,
            AnalysisKind::Speeds,
        ]
    }

    /// Kinds the scene has geometry for. Near-miss detection needs none.
    pub fn applicable(scene: &Scene) -> Vec<AnalysisKind> {
        let mut kinds = Vec::new();
        if !scene.counting_lines().is_empty() {
            kinds.push(AnalysisKind::LineCounts);
        }
        if !scene.zones.is_empty() {
            kinds.push(AnalysisKind::LaneEvents);
        }
        kinds.push(AnalysisKind::NearMisses);
        if scene.has_calibration_line() {
            kinds.push(AnalysisKind::Speeds);
        }
        kinds
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::LineCounts => "line-counts",
            AnalysisKind::LaneEvents => "lane-events",
            AnalysisKind::NearMisses => "near-misses",
            AnalysisKind::Speeds => "speeds",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "line-counts" | "lines" => Ok(AnalysisKind::LineCounts),
            "lane-events" | "lanes" => Ok(AnalysisKind::LaneEvents),
            "near-misses" | "collisions" => Ok(AnalysisKind::NearMisses),
            "speeds" => Ok(AnalysisKind::Speeds),
            other => Err(format!(
                "unknown analysis '{other}' (expected line-counts, lane-events, near-misses or speeds)"
            )),
        }
    }
}

/// Outputs of one analysis pass.
///
/// `None` means the kind was not run and its stored output stays as is.
/// `Some` (even when empty) replaces the stored output of that kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnalysisResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_counts: Option<LineCrossingTally>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane_events: Option<Vec<LaneChangeEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_misses: Option<Vec<NearMissEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speeds: Option<TrackSpeeds>,
}

impl AnalysisResults {
    pub fn kinds(&self) -> Vec<AnalysisKind> {
        let mut kinds = Vec::new();
        if self.line_counts.is_some() {
            kinds.push(AnalysisKind::LineCounts);
        }
        if self.lane_events.is_some() {
            kinds.push(AnalysisKind::LaneEvents);
        }
        if self.near_misses.is_some() {
            kinds.push(AnalysisKind::NearMisses);
        }
        if self.speeds.is_some() {
            kinds.push(AnalysisKind::Speeds);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Output size of `kind`: lines tallied, events found or samples taken.
    pub fn count(&self, kind: AnalysisKind) -> usize {
        match kind {
            AnalysisKind::LineCounts => self.line_counts.as_ref().map_or(0, |t| t.len()),
            AnalysisKind::LaneEvents => self.lane_events.as_ref().map_or(0, Vec::len),
            AnalysisKind::NearMisses => self.near_misses.as_ref().map_or(0, Vec::len),
            AnalysisKind::Speeds => self
                .speeds
                .as_ref()
                .map_or(0, |s| s.values().map(Vec::len).sum()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::scene::{AnalyticsLine, LaneZone, LineType, ZoneType};
    use rstest::rstest;
    use serde_json::{json, Map};

    fn line(id: u32, line_type: LineType) -> AnalyticsLine {
        let mut meta_data = Map::new();
        if line_type == LineType::Calibration {
            meta_data.insert("distance_meters".into(), json!(10.0));
        }
        AnalyticsLine {
            id,
            name: String::new(),
            line_type,
            points: vec![[0.0, 0.0], [100.0, 0.0]],
            meta_data,
        }
    }

    #[rstest]
    #[case::line_counts("line-counts", AnalysisKind::LineCounts)]
    #[case::underscore("lane_events", AnalysisKind::LaneEvents)]
    #[case::alias("collisions", AnalysisKind::NearMisses)]
    #[case::uppercase("SPEEDS", AnalysisKind::Speeds)]
    fn test_parse_kind(#[case] input: &str, #[case] expected: AnalysisKind) {
        assert_eq!(input.parse::<AnalysisKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "heatmap".parse::<AnalysisKind>().unwrap_err();
        assert!(err.contains("heatmap"));
    }

    #[test]
    fn test_display_round_trips_parse() {
        for kind in AnalysisKind::all() {
            assert_eq!(kind.to_string().parse::<AnalysisKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_applicable_empty_scene_only_near_misses() {
        assert_eq!(
            AnalysisKind::applicable(&Scene::default()),
            vec![AnalysisKind::NearMisses]
        );
    }

    #[test]
    fn test_applicable_full_scene() {
        let scene = Scene {
            lines: vec![line(1, LineType::Count), line(2, LineType::Calibration)],
            zones: vec![LaneZone::new(
                1,
                ZoneType::Ego,
                vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
            )],
        };
        assert_eq!(AnalysisKind::applicable(&scene), AnalysisKind::all().to_vec());
    }

    #[test]
    fn test_results_kinds_and_counts() {
        let mut speeds = TrackSpeeds::new();
        speeds.insert(1, Vec::new());
        let results = AnalysisResults {
            near_misses: Some(Vec::new()),
            speeds: Some(speeds),
            ..Default::default()
        };
        assert_eq!(
            results.kinds(),
            vec![AnalysisKind::NearMisses, AnalysisKind::Speeds]
        );
        assert_eq!(results.count(AnalysisKind::NearMisses), 0);
        assert_eq!(results.count(AnalysisKind::LineCounts), 0);
        assert!(!results.is_empty());
        assert!(AnalysisResults::default().is_empty());
    }

    #[test]
    fn test_results_skip_absent_kinds_when_serialized() {
        let results = AnalysisResults {
            lane_events: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({"lane_events": []})
        );
    }
}
