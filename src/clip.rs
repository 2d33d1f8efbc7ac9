//! Clipping of bisectors and cells against the bounding rectangle.

use crate::config::BoundingBox;
use crate::geometry::Point;

/// The closed half-plane of the points at least as close to one site as to another.
///
/// It is kept as the midpoint of the sites and the direction to the other site rather than as
/// line coefficients, which lose precision far from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfPlane {
    origin: Point,
    normal: Point,
}

impl HalfPlane {
    pub fn closer_to(site: Point, other: Point) -> Self {
        Self {
            origin: site.midpoint(other),
            normal: other - site,
        }
    }

    /// Signed distance of `p` to the boundary, positive outside.
    pub fn signed_distance(&self, p: Point) -> f64 {
        (p - self.origin).dot(self.normal) / self.normal.length()
    }
}

/// Restrict the parameter range `[t0, t1]` of the line `origin + t·dir` to the part inside
/// `bounds` (Liang–Barsky). Either end may be infinite. Returns `None` when nothing of the range
/// lies inside.
pub fn clip_line(
    origin: Point,
    dir: Point,
    mut t0: f64,
    mut t1: f64,
    bounds: &BoundingBox,
) -> Option<(f64, f64)> {
    let checks = [
        (-dir.x, origin.x - bounds.xmin),
        (dir.x, bounds.xmax - origin.x),
        (-dir.y, origin.y - bounds.ymin),
        (dir.y, bounds.ymax - origin.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            // parallel to this side
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
    }

    (t0 <= t1).then_some((t0, t1))
}

/// Keep the part of the convex `polygon` inside `half_plane`. Vertices within `tolerance` of its
/// boundary are kept as they are.
pub fn clip_polygon(polygon: &[Point], half_plane: &HalfPlane, tolerance: f64) -> Vec<Point> {
    let Some(&last) = polygon.last() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(polygon.len() + 1);
    let mut prev = last;
    let mut prev_dist = half_plane.signed_distance(prev);
    let mut prev_inside = prev_dist <= tolerance;

    for &current in polygon {
        let curr_dist = half_plane.signed_distance(current);
        let curr_inside = curr_dist <= tolerance;
        if curr_inside != prev_inside {
            result.push(intersect(prev, current, prev_dist, curr_dist));
        }
        if curr_inside {
            result.push(current);
        }
        prev = current;
        prev_dist = curr_dist;
        prev_inside = curr_inside;
    }

    result
}

fn intersect(start: Point, end: Point, start_dist: f64, end_dist: f64) -> Point {
    let denom = start_dist - end_dist;
    let t = if denom == 0.0 {
        0.5
    } else {
        (start_dist / denom).clamp(0.0, 1.0)
    };
    start + (end - start) * t
}

/// Signed area of a polygon, positive for counter-clockwise order.
pub fn polygon_area(polygon: &[Point]) -> f64 {
    let Some(&first) = polygon.first() else {
        return 0.0;
    };
    polygon
        .windows(2)
        .map(|w| (w[0] - first).perp_dot(w[1] - first))
        .sum::<f64>()
        / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const BOX: BoundingBox = BoundingBox::new(-1.0, -1.0, 1.0, 1.0);

    #[test]
    fn clip_full_line() {
        let (t0, t1) = clip_line(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            f64::NEG_INFINITY,
            f64::INFINITY,
            &BOX,
        )
        .unwrap();
        assert_eq!((t0, t1), (-1.0, 1.0));
    }

    #[test]
    fn clip_ray_and_segment() {
        let origin = Point::new(0.0, 0.0);
        let dir = Point::new(1.0, 1.0);
        assert_eq!(
            clip_line(origin, dir, 0.5, f64::INFINITY, &BOX),
            Some((0.5, 1.0))
        );
        assert_eq!(
            clip_line(origin, dir, -0.25, 0.25, &BOX),
            Some((-0.25, 0.25))
        );
        assert_eq!(clip_line(origin, dir, 2.0, 3.0, &BOX), None);
    }

    #[test]
    fn clip_outside_line() {
        let origin = Point::new(0.0, 5.0);
        let dir = Point::new(1.0, 0.0);
        assert_eq!(
            clip_line(origin, dir, f64::NEG_INFINITY, f64::INFINITY, &BOX),
            None
        );
    }

    #[test]
    fn halve_square() {
        let square = BOX.corners();
        // keep x <= 0
        let left = HalfPlane::closer_to(Point::new(-1.0, 0.5), Point::new(1.0, 0.5));
        let half = clip_polygon(&square, &left, 0.0);
        assert_relative_eq!(polygon_area(&half), 2.0);
        assert!(half.iter().all(|p| p.x <= 0.0));
    }

    #[test]
    fn clip_away_everything() {
        let square = BOX.corners();
        let far_left = HalfPlane::closer_to(Point::new(-10.0, 0.0), Point::new(-8.0, 0.0));
        assert!(clip_polygon(&square, &far_left, 0.0).is_empty());
        assert_relative_eq!(polygon_area(&square), 4.0);
    }

    #[test]
    fn area_far_from_origin() {
        let square = BoundingBox::new(1e8, 1e8, 1e8 + 0.5, 1e8 + 0.25).corners();
        assert_eq!(polygon_area(&square), 0.125);
        let mut clockwise = square;
        clockwise.reverse();
        assert_eq!(polygon_area(&clockwise), -0.125);
    }
}
