use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    CLUSTER_GAP_FRAMES, DEFAULT_MIN_FRAMES_IN_ZONE, MAX_SPEED_KMH, MAX_TTC_FRAME_GAP,
    PROXIMITY_THRESHOLD_PX, TTC_CRITICAL_SECONDS, TTC_WARNING_SECONDS,
};

use super::analytics_error::AnalyticsError;

/// Tunable thresholds for one analysis pass.
///
/// Every field has a default, so a stored document may carry a partial
/// `config` object or none at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub min_frames_in_zone: usize,
    pub ttc_warning_s: f64,
    pub ttc_critical_s: f64,
    pub proximity_px: f64,
    pub max_frame_gap: usize,
    pub cluster_gap_frames: usize,
    pub max_speed_kmh: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_frames_in_zone: DEFAULT_MIN_FRAMES_IN_ZONE,
            ttc_warning_s: TTC_WARNING_SECONDS,
            ttc_critical_s: TTC_CRITICAL_SECONDS,
            proximity_px: PROXIMITY_THRESHOLD_PX,
            max_frame_gap: MAX_TTC_FRAME_GAP,
            cluster_gap_frames: CLUSTER_GAP_FRAMES,
            max_speed_kmh: MAX_SPEED_KMH,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.min_frames_in_zone == 0 {
            return Err(invalid("min_frames_in_zone must be at least 1"));
        }
        if !(self.ttc_critical_s > 0.0 && self.ttc_critical_s <= self.ttc_warning_s) {
            return Err(invalid(format!(
                "ttc thresholds must satisfy 0 < critical ({}) <= warning ({})",
                self.ttc_critical_s, self.ttc_warning_s
            )));
        }
        if !(self.proximity_px > 0.0) {
            return Err(invalid(format!(
                "proximity_px must be positive, got {}",
                self.proximity_px
            )));
        }
        if !(self.max_speed_kmh > 0.0) {
            return Err(invalid(format!(
                "max_speed_kmh must be positive, got {}",
                self.max_speed_kmh
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AnalyticsError {
    AnalyticsError::InvalidConfig(message.into())
}
