use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analytics::domain::analytics_error::AnalyticsError;

use super::constants::{CALIBRATION_DISTANCE_KEY, DEFAULT_ZONE_COLOR};
use super::geometry::{distance, point_in_polygon, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Count,
    Calibration,
}

/// A user-drawn line as stored by the geometry collaborator.
///
/// `meta_data` is opaque to the store: calibration lines keep their
/// real-world length there, counting lines receive their `in`/`out` tallies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsLine {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub line_type: LineType,
    pub points: Vec<Point>,
    #[serde(default)]
    pub meta_data: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CountingLine {
    pub id: u32,
    pub start: Point,
    pub end: Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationLine {
    pub id: u32,
    pub start: Point,
    pub end: Point,
    pub real_distance_meters: f64,
}

impl CalibrationLine {
    pub fn pixel_length(&self) -> f64 {
        distance(self.start, self.end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Ego,
    AdjacentLeft,
    AdjacentRight,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::Ego => "ego",
            ZoneType::AdjacentLeft => "adjacent_left",
            ZoneType::AdjacentRight => "adjacent_right",
        }
    }

    pub fn is_ego(&self) -> bool {
        matches!(self, ZoneType::Ego)
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polygonal lane region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneZone {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub zone_type: ZoneType,
    pub points: Vec<Point>,
    #[serde(default = "default_zone_color")]
    pub color: String,
}

fn default_zone_color() -> String {
    DEFAULT_ZONE_COLOR.to_string()
}

impl LaneZone {
    pub fn new(id: u32, zone_type: ZoneType, points: Vec<Point>) -> Self {
        Self {
            id,
            name: zone_type.as_str().to_string(),
            zone_type,
            points,
            color: default_zone_color(),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.points)
    }
}

/// Geometry configured for one video.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub lines: Vec<AnalyticsLine>,
    #[serde(default)]
    pub zones: Vec<LaneZone>,
}

impl Scene {
    /// Counting lines with exactly two points. Malformed rows are skipped.
    pub fn counting_lines(&self) -> Vec<CountingLine> {
        self.lines
            .iter()
            .filter(|l| l.line_type == LineType::Count)
            .filter_map(|l| match l.points.as_slice() {
                [start, end] => Some(CountingLine {
                    id: l.id,
                    start: *start,
                    end: *end,
                }),
                other => {
                    log::warn!(
                        "Skipping counting line {} with {} points (need 2)",
                        l.id,
                        other.len()
                    );
                    None
                }
            })
            .collect()
    }

    pub fn has_calibration_line(&self) -> bool {
        self.lines
            .iter()
            .any(|l| l.line_type == LineType::Calibration)
    }

    /// The first calibration line, validated.
    pub fn calibration_line(&self) -> Result<CalibrationLine, AnalyticsError> {
        let line = self
            .lines
            .iter()
            .find(|l| l.line_type == LineType::Calibration)
            .ok_or(AnalyticsError::MissingCalibrationLine)?;

        let [start, end] = match line.points.as_slice() {
            [start, end] => [*start, *end],
            other => {
                return Err(AnalyticsError::CalibrationPointCount {
                    id: line.id,
                    count: other.len(),
                })
            }
        };

        let real_distance_meters = line
            .meta_data
            .get(CALIBRATION_DISTANCE_KEY)
            .and_then(Value::as_f64)
            .ok_or(AnalyticsError::MissingCalibrationDistance(line.id))?;
        if !(real_distance_meters.is_finite() && real_distance_meters > 0.0) {
            return Err(AnalyticsError::InvalidCalibrationDistance(
                real_distance_meters,
            ));
        }

        let calibration = CalibrationLine {
            id: line.id,
            start,
            end,
            real_distance_meters,
        };
        if calibration.pixel_length() <= 0.0 {
            return Err(AnalyticsError::DegenerateCalibrationLine(line.id));
        }
        Ok(calibration)
    }
}
