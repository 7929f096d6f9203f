use crate::shared::geometry::{cross, segments_intersect, Point};
use crate::shared::scene::CountingLine;
use crate::shared::track::TrackSet;

use super::events::{LineCrossingTally, LineTally};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossingDirection {
    In,
    Out,
}

/// Direction of a movement `from -> to` across `line`.
///
/// Sign convention: `cross = line_dir x movement`, i.e.
/// `dx_line * dy_move - dy_line * dx_move`. Positive is `In`; zero or
/// negative is `Out`. In image coordinates (y down) a line drawn top to
/// bottom therefore counts right-to-left movement as `In` and
/// left-to-right movement as `Out`.
pub fn crossing_direction(line: &CountingLine, from: Point, to: Point) -> CrossingDirection {
    let line_dir = [line.end[0] - line.start[0], line.end[1] - line.start[1]];
    let movement = [to[0] - from[0], to[1] - from[1]];
    if cross(line_dir, movement) > 0.0 {
        CrossingDirection::In
    } else {
        CrossingDirection::Out
    }
}

/// Counts directional crossings of counting lines by track centers.
///
/// Each consecutive-frame segment between bounding-box centers is tested
/// against every line. A track that crosses a line repeatedly is counted
/// every time.
pub struct LineCrossingCounter;

impl LineCrossingCounter {
    pub fn new() -> Self {
        Self
    }

    /// Tallies for every line in `lines`, zero-initialized so the result
    /// fully replaces any previous counts.
    pub fn count(&self, tracks: &TrackSet, lines: &[CountingLine]) -> LineCrossingTally {
        let mut tallies: LineCrossingTally =
            lines.iter().map(|l| (l.id, LineTally::default())).collect();
        if lines.is_empty() {
            return tallies;
        }

        for track in tracks.with_min_frames(2) {
            for (prev, curr) in track.consecutive_pairs() {
                let p1 = prev.center();
                let p2 = curr.center();
                for line in lines {
                    if !segments_intersect(p1, p2, line.start, line.end) {
                        continue;
                    }
                    let direction = crossing_direction(line, p1, p2);
                    log::debug!(
                        "Track {} crossed line {} ({direction:?}) between frames {} and {}",
                        track.id(),
                        line.id,
                        prev.frame_index,
                        curr.frame_index
                    );
                    let tally = tallies.entry(line.id).or_default();
                    match direction {
                        CrossingDirection::In => tally.inbound += 1,
                        CrossingDirection::Out => tally.outbound += 1,
                    }
                }
            }
        }

        tallies
    }
}

impl Default for LineCrossingCounter {
    fn default() -> Self {
        Self::new()
    }
}
