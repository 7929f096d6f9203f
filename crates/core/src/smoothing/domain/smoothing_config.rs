use serde::{Deserialize, Serialize};

use super::temporal_smoother::{
    AdaptiveSmoother, BoxSmoother, TemporalSmoother, DEFAULT_ALPHA, DEFAULT_MAX_ALPHA,
    DEFAULT_MIN_ALPHA, DEFAULT_MOTION_THRESHOLD_PX,
};

/// Smoother selection and parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub alpha: f64,
    pub adaptive: bool,
    pub min_alpha: f64,
    pub max_alpha: f64,
    pub motion_threshold_px: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            adaptive: false,
            min_alpha: DEFAULT_MIN_ALPHA,
            max_alpha: DEFAULT_MAX_ALPHA,
            motion_threshold_px: DEFAULT_MOTION_THRESHOLD_PX,
        }
    }
}

/// Build a fresh smoother for one processing session.
pub fn create_smoother(config: &SmoothingConfig) -> Box<dyn BoxSmoother> {
    if config.adaptive {
        Box::new(AdaptiveSmoother::new(
            config.min_alpha,
            config.max_alpha,
            config.motion_threshold_px,
        ))
    } else {
        Box::new(TemporalSmoother::new(config.alpha))
    }
}
