/// Frame rate assumed when a video record carries none.
pub const DEFAULT_FPS: f64 = 30.0;

/// Consecutive frames a zone must be held before a transition out of it counts.
pub const DEFAULT_MIN_FRAMES_IN_ZONE: usize = 3;
/// Dwell (in frames) at which lane-change confidence saturates at 1.0.
pub const CONFIDENCE_SATURATION_FRAMES: f64 = 10.0;

pub const TTC_WARNING_SECONDS: f64 = 3.0;
pub const TTC_CRITICAL_SECONDS: f64 = 1.5;
/// Pairs farther apart than this (center to center) are never scored.
pub const PROXIMITY_THRESHOLD_PX: f64 = 200.0;
/// Largest gap between present frame indices that TTC is computed across.
pub const MAX_TTC_FRAME_GAP: usize = 3;
/// Raw near-miss events further apart than this start a new cluster.
pub const CLUSTER_GAP_FRAMES: usize = 30;
/// Center distance below which two boxes are treated as already touching.
pub const COLLISION_DISTANCE_EPSILON: f64 = 1e-3;

pub const MAX_SPEED_KMH: f64 = 300.0;
pub const MS_TO_KMH: f64 = 3.6;
/// Key under which a calibration line stores its real-world length.
pub const CALIBRATION_DISTANCE_KEY: &str = "distance_meters";
/// Key under which speed annotations are merged into detection metadata.
pub const SPEED_META_KEY: &str = "speed_kmh";

pub const DEFAULT_ZONE_COLOR: &str = "#22c55e";
