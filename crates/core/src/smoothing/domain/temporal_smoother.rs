use std::collections::HashMap;

use crate::shared::geometry::{bbox_center, distance, BBox, Point};

pub const DEFAULT_ALPHA: f64 = 0.7;
pub const DEFAULT_MIN_ALPHA: f64 = 0.3;
pub const DEFAULT_MAX_ALPHA: f64 = 0.9;
pub const DEFAULT_MOTION_THRESHOLD_PX: f64 = 20.0;

/// Domain interface for per-track bounding-box smoothing.
///
/// Implementations own their per-track state. One instance belongs to one
/// processing session and is fed frames in increasing order.
pub trait BoxSmoother: Send {
    fn smooth(&mut self, track_id: u32, bbox: BBox) -> BBox;

    /// Drop state for a finished track.
    fn remove_track(&mut self, track_id: u32);

    fn clear(&mut self);

    /// Number of tracks with live state.
    fn track_count(&self) -> usize;
}

/// EMA (Exponential Moving Average) smoother with per-track state.
///
/// Formula: `ema[t] = alpha * current + (1 - alpha) * ema[t-1]`
/// Default alpha: 0.7. The first box of a track is returned unchanged.
pub struct TemporalSmoother {
    alpha: f64,
    state: HashMap<u32, BBox>,
}

impl TemporalSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            state: HashMap::new(),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn smooth_with_alpha(&mut self, track_id: u32, bbox: BBox, alpha: f64) -> BBox {
        let smoothed = match self.state.get(&track_id) {
            None => bbox,
            Some(prev) => {
                let mut result = [0.0; 4];
                for i in 0..4 {
                    result[i] = alpha * bbox[i] + (1.0 - alpha) * prev[i];
                }
                result
            }
        };

        self.state.insert(track_id, smoothed);
        smoothed
    }
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl BoxSmoother for TemporalSmoother {
    fn smooth(&mut self, track_id: u32, bbox: BBox) -> BBox {
        self.smooth_with_alpha(track_id, bbox, self.alpha)
    }

    fn remove_track(&mut self, track_id: u32) {
        self.state.remove(&track_id);
    }

    fn clear(&mut self) {
        self.state.clear();
    }

    fn track_count(&self) -> usize {
        self.state.len()
    }
}

/// EMA smoother whose alpha follows the raw center motion of each track.
///
/// `alpha = min_alpha + min(motion / motion_threshold, 1) * (max_alpha - min_alpha)`,
/// so fast objects are smoothed less and stationary ones more.
pub struct AdaptiveSmoother {
    inner: TemporalSmoother,
    prev_centers: HashMap<u32, Point>,
    min_alpha: f64,
    max_alpha: f64,
    motion_threshold: f64,
}

impl AdaptiveSmoother {
    pub fn new(min_alpha: f64, max_alpha: f64, motion_threshold: f64) -> Self {
        Self {
            inner: TemporalSmoother::default(),
            prev_centers: HashMap::new(),
            min_alpha,
            max_alpha,
            motion_threshold,
        }
    }

    /// Alpha for a movement of `motion` pixels between raw centers.
    pub fn alpha_for_motion(&self, motion: f64) -> f64 {
        // A non-positive threshold treats any motion as saturated.
        let ratio = if self.motion_threshold > 0.0 {
            (motion / self.motion_threshold).min(1.0)
        } else {
            1.0
        };
        self.min_alpha + ratio * (self.max_alpha - self.min_alpha)
    }
}

impl Default for AdaptiveSmoother {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_ALPHA,
            DEFAULT_MAX_ALPHA,
            DEFAULT_MOTION_THRESHOLD_PX,
        )
    }
}

impl BoxSmoother for AdaptiveSmoother {
    fn smooth(&mut self, track_id: u32, bbox: BBox) -> BBox {
        let center = bbox_center(&bbox);
        let alpha = match self.prev_centers.insert(track_id, center) {
            Some(prev) => self.alpha_for_motion(distance(center, prev)),
            None => self.inner.alpha(),
        };
        self.inner.smooth_with_alpha(track_id, bbox, alpha)
    }

    fn remove_track(&mut self, track_id: u32) {
        self.inner.remove_track(track_id);
        self.prev_centers.remove(&track_id);
    }

    fn clear(&mut self) {
        self.inner.clear();
        self.prev_centers.clear();
    }

    fn track_count(&self) -> usize {
        self.inner.track_count()
    }
}
