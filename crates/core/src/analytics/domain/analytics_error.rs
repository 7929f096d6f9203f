use thiserror::Error;

/// Configuration problems that stop an analysis before any per-track work.
///
/// Sparse data (no tracks, single-frame tracks, no geometry of a kind) is
/// never an error; analyzers return an empty result for it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("no ego lane zone defined; cannot detect lane events")]
    MissingEgoZone,
    #[error("expected exactly one ego lane zone, found {0}")]
    MultipleEgoZones(usize),
    #[error("no calibration line defined; cannot estimate speeds")]
    MissingCalibrationLine,
    #[error("calibration line {id} must have exactly 2 points, got {count}")]
    CalibrationPointCount { id: u32, count: usize },
    #[error("calibration line {0} has zero pixel length")]
    DegenerateCalibrationLine(u32),
    #[error("calibration line {0} has no real-world distance")]
    MissingCalibrationDistance(u32),
    #[error("calibration distance must be positive, got {0} m")]
    InvalidCalibrationDistance(f64),
    #[error("frame rate must be positive, got {0}")]
    InvalidFps(f64),
    #[error("invalid analytics configuration: {0}")]
    InvalidConfig(String),
}
