//! Planar geometry in pixel coordinates.
//!
//! Points are `[x, y]` and boxes are `[x1, y1, x2, y2]`, matching the
//! layout the tracking collaborator stores.

/// A point in image space (y grows downward).
pub type Point = [f64; 2];

/// Axis-aligned bounding box as `[x1, y1, x2, y2]`.
pub type BBox = [f64; 4];

pub fn bbox_center(bbox: &BBox) -> Point {
    [(bbox[0] + bbox[2]) / 2.0, (bbox[1] + bbox[3]) / 2.0]
}

/// Bottom-center of a box, used as the ground-contact point of a vehicle.
pub fn bbox_bottom_center(bbox: &BBox) -> Point {
    [(bbox[0] + bbox[2]) / 2.0, bbox[3]]
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Orientation of the ordered triplet `(p, q, r)`.
pub fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q[1] - p[1]) * (r[0] - q[0]) - (q[0] - p[0]) * (r[1] - q[1]);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether `q` lies inside the bounding rectangle of segment `p`-`r`.
///
/// Only meaningful once `p`, `q`, `r` are known to be collinear.
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q[0] <= p[0].max(r[0])
        && q[0] >= p[0].min(r[0])
        && q[1] <= p[1].max(r[1])
        && q[1] >= p[1].min(r[1])
}

/// Whether segment `p1`-`q1` intersects segment `p2`-`q2`.
///
/// Handles the general (strictly crossing) case and the collinear cases
/// where an endpoint of one segment lies on the other. Touching counts.
pub fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

/// 2D cross product `a x b`.
pub fn cross(a: Point, b: Point) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Ray-casting point-in-polygon test.
///
/// A horizontal ray from `point` is cast to +x; the point is inside when
/// the ray crosses an odd number of edges. Polygons with fewer than three
/// vertices contain nothing.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let [x, y] = point;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        // (yi > y) != (yj > y) guarantees yi != yj, so the division is safe.
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    // ── Box points ───────────────────────────────────────────────────

    #[test]
    fn test_bbox_center() {
        let c = bbox_center(&[10.0, 20.0, 30.0, 60.0]);
        assert_relative_eq!(c[0], 20.0);
        assert_relative_eq!(c[1], 40.0);
    }

    #[test]
    fn test_bbox_bottom_center_uses_y2() {
        let c = bbox_bottom_center(&[10.0, 20.0, 30.0, 60.0]);
        assert_relative_eq!(c[0], 20.0);
        assert_relative_eq!(c[1], 60.0);
    }

    #[test]
    fn test_distance_345() {
        assert_relative_eq!(distance([0.0, 0.0], [3.0, 4.0]), 5.0);
    }

    // ── Orientation ──────────────────────────────────────────────────

    #[test]
    fn test_orientation_collinear() {
        assert_eq!(
            orientation([0.0, 0.0], [1.0, 1.0], [2.0, 2.0]),
            Orientation::Collinear
        );
    }

    #[test]
    fn test_orientation_turns_are_opposite() {
        let a = orientation([0.0, 0.0], [1.0, 0.0], [1.0, 1.0]);
        let b = orientation([0.0, 0.0], [1.0, 0.0], [1.0, -1.0]);
        assert_ne!(a, Orientation::Collinear);
        assert_ne!(b, Orientation::Collinear);
        assert_ne!(a, b);
    }

    // ── Segment intersection ─────────────────────────────────────────

    #[rstest]
    #[case::proper_cross([0.0, 0.0], [10.0, 10.0], [0.0, 10.0], [10.0, 0.0], true)]
    #[case::parallel([0.0, 0.0], [10.0, 0.0], [0.0, 5.0], [10.0, 5.0], false)]
    #[case::disjoint([0.0, 0.0], [1.0, 1.0], [5.0, 5.0], [6.0, 4.0], false)]
    #[case::endpoint_on_segment([0.0, 0.0], [10.0, 0.0], [5.0, 0.0], [5.0, 5.0], true)]
    #[case::collinear_overlap([0.0, 0.0], [10.0, 0.0], [5.0, 0.0], [15.0, 0.0], true)]
    #[case::collinear_gap([0.0, 0.0], [4.0, 0.0], [5.0, 0.0], [15.0, 0.0], false)]
    #[case::t_short_of_line([0.0, 0.0], [10.0, 0.0], [5.0, 1.0], [5.0, 5.0], false)]
    #[case::shared_endpoint([0.0, 0.0], [5.0, 5.0], [5.0, 5.0], [10.0, 0.0], true)]
    fn test_segments_intersect(
        #[case] p1: Point,
        #[case] q1: Point,
        #[case] p2: Point,
        #[case] q2: Point,
        #[case] expected: bool,
    ) {
        assert_eq!(segments_intersect(p1, q1, p2, q2), expected);
    }

    #[rstest]
    #[case([0.0, 0.0], [10.0, 10.0], [0.0, 10.0], [10.0, 0.0])]
    #[case([0.0, 0.0], [10.0, 0.0], [5.0, 0.0], [5.0, 5.0])]
    #[case([0.0, 0.0], [4.0, 0.0], [5.0, 0.0], [15.0, 0.0])]
    #[case([50.0, 100.0], [150.0, 100.0], [100.0, 0.0], [100.0, 200.0])]
    #[case([1.0, 2.0], [3.0, 7.0], [-4.0, 0.5], [2.5, 9.0])]
    fn test_segments_intersect_is_symmetric(
        #[case] p1: Point,
        #[case] q1: Point,
        #[case] p2: Point,
        #[case] q2: Point,
    ) {
        assert_eq!(
            segments_intersect(p1, q1, p2, q2),
            segments_intersect(p2, q2, p1, q1)
        );
        assert_eq!(
            segments_intersect(p1, q1, p2, q2),
            segments_intersect(q1, p1, q2, p2)
        );
    }

    // ── Point in polygon ─────────────────────────────────────────────

    fn square() -> Vec<Point> {
        vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]]
    }

    #[test]
    fn test_point_inside_square() {
        assert!(point_in_polygon([50.0, 50.0], &square()));
    }

    #[test]
    fn test_point_outside_square() {
        assert!(!point_in_polygon([150.0, 50.0], &square()));
        assert!(!point_in_polygon([50.0, -1.0], &square()));
    }

    #[test]
    fn test_point_in_concave_notch_is_outside() {
        // U shape with the notch opening upward between x=40..60
        let u = vec![
            [0.0, 0.0],
            [40.0, 0.0],
            [40.0, 60.0],
            [60.0, 60.0],
            [60.0, 0.0],
            [100.0, 0.0],
            [100.0, 100.0],
            [0.0, 100.0],
        ];
        assert!(!point_in_polygon([50.0, 30.0], &u));
        assert!(point_in_polygon([50.0, 80.0], &u));
        assert!(point_in_polygon([20.0, 30.0], &u));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = vec![[0.0, 0.0], [100.0, 100.0]];
        assert!(!point_in_polygon([50.0, 50.0], &line));
        assert!(!point_in_polygon([0.0, 0.0], &[]));
    }

    #[test]
    fn test_cross_sign() {
        assert!(cross([1.0, 0.0], [0.0, 1.0]) > 0.0);
        assert!(cross([0.0, 1.0], [1.0, 0.0]) < 0.0);
        assert_eq!(cross([2.0, 2.0], [1.0, 1.0]), 0.0);
    }
}
