use std::collections::BTreeMap;

use super::detection::Detection;
use super::geometry::{bbox_bottom_center, bbox_center, BBox, Point};

/// One observation of a track: the box at a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackFrame {
    pub frame_index: usize,
    pub bbox: BBox,
}

impl TrackFrame {
    pub fn timestamp(&self, fps: f64) -> f64 {
        self.frame_index as f64 / fps
    }

    pub fn center(&self) -> Point {
        bbox_center(&self.bbox)
    }

    pub fn bottom_center(&self) -> Point {
        bbox_bottom_center(&self.bbox)
    }
}

/// Time-ordered box history of a single tracking identity.
///
/// Frames are keyed by index, so iteration is always in frame order
/// regardless of insertion order. Re-inserting a frame index replaces
/// the earlier box.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    id: u32,
    frames: BTreeMap<usize, BBox>,
}

impl Track {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            frames: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn insert(&mut self, frame_index: usize, bbox: BBox) {
        self.frames.insert(frame_index, bbox);
    }

    pub fn get(&self, frame_index: usize) -> Option<TrackFrame> {
        self.frames
            .get(&frame_index)
            .map(|&bbox| TrackFrame { frame_index, bbox })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first_frame(&self) -> Option<usize> {
        self.frames.keys().next().copied()
    }

    pub fn last_frame(&self) -> Option<usize> {
        self.frames.keys().next_back().copied()
    }

    pub fn frames(&self) -> impl Iterator<Item = TrackFrame> + '_ {
        self.frames
            .iter()
            .map(|(&frame_index, &bbox)| TrackFrame { frame_index, bbox })
    }

    /// Consecutive observation pairs `(prev, curr)` in frame order.
    pub fn consecutive_pairs(&self) -> impl Iterator<Item = (TrackFrame, TrackFrame)> + '_ {
        self.frames().zip(self.frames().skip(1))
    }
}

/// All tracks of one video, keyed by track id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackSet {
    tracks: BTreeMap<u32, Track>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups tracked detections into tracks. Untracked rows are ignored.
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut set = Self::new();
        for det in detections {
            if let Some(tid) = det.track_id {
                set.insert(tid, det.frame_index, det.bbox);
            }
        }
        set
    }

    pub fn insert(&mut self, track_id: u32, frame_index: usize, bbox: BBox) {
        self.tracks
            .entry(track_id)
            .or_insert_with(|| Track::new(track_id))
            .insert(frame_index, bbox);
    }

    pub fn get(&self, track_id: u32) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks with at least `min_frames` observations.
    pub fn with_min_frames(&self, min_frames: usize) -> impl Iterator<Item = &Track> {
        self.iter().filter(move |t| t.len() >= min_frames)
    }
}

impl FromIterator<Track> for TrackSet {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self {
            tracks: iter.into_iter().map(|t| (t.id, t)).collect(),
        }
    }
}
