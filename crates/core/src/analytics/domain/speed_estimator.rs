use serde::Serialize;

use crate::shared::constants::{MAX_SPEED_KMH, MS_TO_KMH};
use crate::shared::geometry::distance;
use crate::shared::scene::CalibrationLine;
use crate::shared::track::{Track, TrackSet};

use super::analytics_error::AnalyticsError;
use super::events::{SpeedSample, TrackSpeeds};

/// Converts per-frame pixel displacement of box centers to km/h using a
/// calibration line of known real-world length.
pub struct SpeedEstimator {
    pixels_per_meter: f64,
    fps: f64,
    max_speed_kmh: f64,
}

impl SpeedEstimator {
    pub fn new(calibration: &CalibrationLine, fps: f64) -> Result<Self, AnalyticsError> {
        if !(calibration.real_distance_meters.is_finite() && calibration.real_distance_meters > 0.0)
        {
            return Err(AnalyticsError::InvalidCalibrationDistance(
                calibration.real_distance_meters,
            ));
        }
        let pixel_length = calibration.pixel_length();
        if !(pixel_length > 0.0) {
            return Err(AnalyticsError::DegenerateCalibrationLine(calibration.id));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(AnalyticsError::InvalidFps(fps));
        }

        let pixels_per_meter = pixel_length / calibration.real_distance_meters;
        log::info!("Calibration: {pixels_per_meter:.2} pixels/meter");
        Ok(Self {
            pixels_per_meter,
            fps,
            max_speed_kmh: MAX_SPEED_KMH,
        })
    }

    /// Upper clamp for reported speeds.
    pub fn with_max_speed(mut self, max_speed_kmh: f64) -> Self {
        self.max_speed_kmh = max_speed_kmh;
        self
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    /// One sample per consecutive frame pair, stamped with the later frame.
    pub fn track_speeds(&self, track: &Track) -> Vec<SpeedSample> {
        track
            .consecutive_pairs()
            .filter_map(|(prev, curr)| {
                let frame_diff = curr.frame_index.checked_sub(prev.frame_index)?;
                if frame_diff == 0 {
                    return None;
                }
                let meters = distance(prev.center(), curr.center()) / self.pixels_per_meter;
                let seconds = frame_diff as f64 / self.fps;
                let speed_kmh = (meters / seconds * MS_TO_KMH).clamp(0.0, self.max_speed_kmh);
                Some(SpeedSample {
                    track_id: track.id(),
                    frame_index: curr.frame_index,
                    speed_kmh,
                    speed_ms: speed_kmh / MS_TO_KMH,
                })
            })
            .collect()
    }

    pub fn estimate(&self, tracks: &TrackSet) -> TrackSpeeds {
        let speeds: TrackSpeeds = tracks
            .with_min_frames(2)
            .map(|t| (t.id(), self.track_speeds(t)))
            .filter(|(_, samples)| !samples.is_empty())
            .collect();
        log::info!("Calculated speeds for {} tracks", speeds.len());
        speeds
    }
}

/// Aggregate over speed samples.
///
/// `min` is the smallest strictly positive speed, so stationary frames do
/// not pin it to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SpeedStats {
    pub count: usize,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

impl SpeedStats {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a SpeedSample>) -> Self {
        let speeds: Vec<f64> = samples.into_iter().map(|s| s.speed_kmh).collect();
        if speeds.is_empty() {
            return Self::default();
        }
        let sum: f64 = speeds.iter().sum();
        let max = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = speeds
            .iter()
            .copied()
            .filter(|&s| s > 0.0)
            .fold(f64::INFINITY, f64::min);
        Self {
            count: speeds.len(),
            avg: sum / speeds.len() as f64,
            max,
            min: if min.is_finite() { min } else { 0.0 },
        }
    }

    pub fn from_track_speeds(speeds: &TrackSpeeds) -> Self {
        Self::from_samples(speeds.values().flatten())
    }
}
