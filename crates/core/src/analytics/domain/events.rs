//! Derived records produced by the analyzers.
//!
//! All of these are recomputed from scratch on each pass and replace
//! whatever the store held for the same video.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::geometry::BBox;
use crate::shared::scene::ZoneType;

/// Directional crossing counts for one counting line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTally {
    #[serde(rename = "in")]
    pub inbound: usize,
    #[serde(rename = "out")]
    pub outbound: usize,
}

impl LineTally {
    pub fn total(&self) -> usize {
        self.inbound + self.outbound
    }
}

/// Tallies keyed by counting line id.
pub type LineCrossingTally = BTreeMap<u32, LineTally>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneEventType {
    CutIn,
    CutOut,
}

impl LaneEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneEventType::CutIn => "cut_in",
            LaneEventType::CutOut => "cut_out",
        }
    }
}

impl fmt::Display for LaneEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneChangeEvent {
    pub track_id: u32,
    pub event_type: LaneEventType,
    pub frame_index: usize,
    pub from_zone: ZoneType,
    pub to_zone: ZoneType,
    pub confidence: f64,
    pub bbox: BBox,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NearMissEvent {
    pub frame_index: usize,
    pub track_id_1: u32,
    pub track_id_2: u32,
    /// Seconds until contact at the current closing speed.
    pub ttc: f64,
    /// Center distance in pixels at `frame_index`.
    pub distance: f64,
    /// Closing speed in pixels per second.
    pub relative_speed: f64,
    pub severity: Severity,
}

impl NearMissEvent {
    /// Track pair with the smaller id first.
    pub fn pair(&self) -> (u32, u32) {
        if self.track_id_1 <= self.track_id_2 {
            (self.track_id_1, self.track_id_2)
        } else {
            (self.track_id_2, self.track_id_1)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeedSample {
    pub track_id: u32,
    pub frame_index: usize,
    pub speed_kmh: f64,
    pub speed_ms: f64,
}

/// Speed samples keyed by track id. Tracks without samples are absent.
pub type TrackSpeeds = BTreeMap<u32, Vec<SpeedSample>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn near_miss(a: u32, b: u32) -> NearMissEvent {
        NearMissEvent {
            frame_index: 0,
            track_id_1: a,
            track_id_2: b,
            ttc: 1.0,
            distance: 10.0,
            relative_speed: 10.0,
            severity: Severity::Critical,
        }
    }

    #[test]
    fn test_pair_is_normalized() {
        assert_eq!(near_miss(7, 3).pair(), (3, 7));
        assert_eq!(near_miss(3, 7).pair(), (3, 7));
    }

    #[test]
    fn test_line_tally_serializes_as_in_out() {
        let tally = LineTally {
            inbound: 2,
            outbound: 5,
        };
        assert_eq!(serde_json::to_value(tally).unwrap(), json!({"in": 2, "out": 5}));
        assert_eq!(tally.total(), 7);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(LaneEventType::CutIn).unwrap(),
            json!("cut_in")
        );
        assert_eq!(
            serde_json::to_value(Severity::Critical).unwrap(),
            json!("critical")
        );
        assert_eq!(LaneEventType::CutOut.to_string(), "cut_out");
    }
}
