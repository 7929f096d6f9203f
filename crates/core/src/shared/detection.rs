use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geometry::BBox;

/// A stored per-frame detection, as produced by the detection/tracking
/// collaborator.
///
/// Detections without a `track_id` never contribute to trajectories.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub track_id: Option<u32>,
    pub frame_index: usize,
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_label: Option<String>,
    #[serde(default)]
    pub extra_meta: Map<String, Value>,
}

impl Detection {
    pub fn new(track_id: Option<u32>, frame_index: usize, bbox: BBox) -> Self {
        Self {
            track_id,
            frame_index,
            bbox,
            class_label: None,
            extra_meta: Map::new(),
        }
    }
}
