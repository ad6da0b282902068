//! Planar geometry queries used for road adherence and checkpoints

use serde::{Deserialize, Serialize};

/// A point (or vector) in world units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Distance from `p` to the closest point of segment `ab`.
///
/// The projection of `p` onto the line through `a` and `b` is clamped to the
/// segment. A degenerate segment (`a == b`) behaves like the point `a`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let apx = p.x - a.x;
    let apy = p.y - a.y;

    let ab2 = abx * abx + aby * aby;
    let t = if ab2 > 0.0 {
        ((apx * abx + apy * aby) / ab2).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let closest = Vec2::new(a.x + abx * t, a.y + aby * t);
    p.distance(closest)
}

/// Minimum distance from `p` to a closed polyline.
///
/// Every consecutive pair is tested, plus the closing segment from the last
/// waypoint back to the first. Returns `f32::INFINITY` for an empty slice.
pub fn nearest_distance_to_polyline(p: Vec2, waypoints: &[Vec2]) -> f32 {
    let n = waypoints.len();
    (0..n)
        .map(|i| distance_to_segment(p, waypoints[i], waypoints[(i + 1) % n]))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn projection_inside_segment_is_perpendicular() {
        let d = distance_to_segment(
            Vec2::new(5.0, 3.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );
        assert!((d - 3.0).abs() < EPS);
    }

    #[test]
    fn projection_is_clamped_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!((distance_to_segment(Vec2::new(-3.0, 4.0), a, b) - 5.0).abs() < EPS);
        assert!((distance_to_segment(Vec2::new(13.0, 4.0), a, b) - 5.0).abs() < EPS);
    }

    #[test]
    fn degenerate_segment_is_a_point() {
        let a = Vec2::new(1.0, 1.0);
        let d = distance_to_segment(Vec2::new(4.0, 5.0), a, a);
        assert!((d - 5.0).abs() < EPS);
    }

    #[test]
    fn polyline_includes_closing_segment() {
        // Square with corners at 0 and 10; the closing edge is x = 0.
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let d = nearest_distance_to_polyline(Vec2::new(-2.0, 5.0), &square);
        assert!((d - 2.0).abs() < EPS);

        let centre = nearest_distance_to_polyline(Vec2::new(5.0, 5.0), &square);
        assert!((centre - 5.0).abs() < EPS);
    }

    #[test]
    fn empty_polyline_is_infinitely_far() {
        assert!(nearest_distance_to_polyline(Vec2::new(0.0, 0.0), &[]).is_infinite());
    }
}
