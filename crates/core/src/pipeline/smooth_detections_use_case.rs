use std::collections::HashMap;

use crate::shared::detection::Detection;
use crate::shared::geometry::BBox;
use crate::smoothing::domain::temporal_smoother::BoxSmoother;

/// Smooths stored detection boxes in frame order.
///
/// Detections are stably sorted by frame index. Untracked rows pass through
/// unchanged; tracked boxes go through `smoother` and are rounded to two
/// decimals. A track's state is dropped after its last detection, so the
/// smoother holds only tracks still in progress.
pub fn smooth_detections(detections: &[Detection], smoother: &mut dyn BoxSmoother) -> Vec<Detection> {
    let mut sorted = detections.to_vec();
    sorted.sort_by_key(|d| d.frame_index);

    let mut remaining: HashMap<u32, usize> = HashMap::new();
    for tid in sorted.iter().filter_map(|d| d.track_id) {
        *remaining.entry(tid).or_default() += 1;
    }

    for det in &mut sorted {
        let Some(tid) = det.track_id else {
            continue;
        };
        det.bbox = round_bbox(smoother.smooth(tid, det.bbox));

        if let Some(left) = remaining.get_mut(&tid) {
            *left -= 1;
            if *left == 0 {
                smoother.remove_track(tid);
            }
        }
    }

    sorted
}

fn round_bbox(bbox: BBox) -> BBox {
    bbox.map(|v| (v * 100.0).round() / 100.0)
}

/// Owns one smoother for a smoothing session.
pub struct SmoothDetectionsUseCase {
    smoother: Box<dyn BoxSmoother>,
}

impl SmoothDetectionsUseCase {
    pub fn new(smoother: Box<dyn BoxSmoother>) -> Self {
        Self { smoother }
    }

    pub fn execute(&mut self, detections: &[Detection]) -> Vec<Detection> {
        let smoothed = smooth_detections(detections, self.smoother.as_mut());
        log::info!(
            "Smoothed {} detections",
            smoothed.iter().filter(|d| d.track_id.is_some()).count()
        );
        smoothed
    }
}
