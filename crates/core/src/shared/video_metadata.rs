use serde::{Deserialize, Serialize};

use crate::analytics::domain::analytics_error::AnalyticsError;

use super::constants::DEFAULT_FPS;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub total_frames: usize,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}

impl VideoMetadata {
    pub fn new(id: u32, fps: f64) -> Self {
        Self {
            id,
            fps,
            width: 0,
            height: 0,
            total_frames: 0,
        }
    }

    /// Frame rate, rejected unless finite and positive.
    pub fn checked_fps(&self) -> Result<f64, AnalyticsError> {
        if self.fps.is_finite() && self.fps > 0.0 {
            Ok(self.fps)
        } else {
            Err(AnalyticsError::InvalidFps(self.fps))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1920,
            height: 1080,
            total_frames: 900,
            ..VideoMetadata::new(3, 25.0)
        };
        assert_eq!(meta.id, 3);
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.fps, 25.0);
        assert_eq!(meta.total_frames, 900);
    }

    #[test]
    fn test_missing_fps_defaults() {
        let meta: VideoMetadata = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(meta.fps, DEFAULT_FPS);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-30.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_invalid_fps_rejected(#[case] fps: f64) {
        let meta = VideoMetadata::new(1, fps);
        assert!(matches!(meta.checked_fps(), Err(AnalyticsError::InvalidFps(_))));
    }

    #[test]
    fn test_valid_fps_accepted() {
        assert_eq!(VideoMetadata::new(1, 29.97).checked_fps().unwrap(), 29.97);
    }
}
