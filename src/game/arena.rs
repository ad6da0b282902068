//! Static world definitions: tag arena bounds and the racing track

use serde::{Deserialize, Serialize};

use super::geometry::{nearest_distance_to_polyline, Vec2};

/// Playable rectangle for tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl WorldBounds {
    /// Corners of the area at least `margin` away from every edge. An axis
    /// shorter than twice the margin collapses onto its midpoint.
    pub fn inset(&self, margin: f32) -> (Vec2, Vec2) {
        let axis = |len: f32| {
            if len >= 2.0 * margin {
                (margin, len - margin)
            } else {
                (len / 2.0, len / 2.0)
            }
        };
        let (min_x, max_x) = axis(self.width);
        let (min_y, max_y) = axis(self.height);
        (Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    /// Keeps a point at least `margin` away from every edge
    pub fn clamp(&self, p: Vec2, margin: f32) -> Vec2 {
        let (min, max) = self.inset(margin);
        Vec2::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y))
    }

    pub fn contains(&self, p: Vec2, margin: f32) -> bool {
        p.x >= margin && p.x <= self.width - margin && p.y >= margin && p.y <= self.height - margin
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 700.0,
        }
    }
}

/// Closed racing track around a centerline polyline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub width: f32,
    pub height: f32,
    /// Half the drivable corridor width around the centerline
    pub road_half_width: f32,
    /// Speed multiplier applied on every tick spent off the road
    pub offroad_friction: f32,
    /// Centerline, wraps from the last waypoint back to the first
    pub waypoints: Vec<Vec2>,
}

impl Track {
    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn next_checkpoint(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    pub fn distance_from_centerline(&self, p: Vec2) -> f32 {
        nearest_distance_to_polyline(p, &self.waypoints)
    }

    pub fn is_off_road(&self, p: Vec2) -> bool {
        self.distance_from_centerline(p) > self.road_half_width
    }

    /// Grid slot near the start line; four lanes, then repeat
    pub fn spawn_slot(&self, slot: usize) -> Vec2 {
        let start = self.waypoints.first().copied().unwrap_or_default();
        Vec2::new(start.x, start.y + (slot % 4) as f32 * 24.0)
    }
}

impl Default for Track {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
            road_half_width: 90.0,
            offroad_friction: 0.86,
            waypoints: vec![
                Vec2::new(200.0, 450.0),
                Vec2::new(350.0, 260.0),
                Vec2::new(600.0, 180.0),
                Vec2::new(900.0, 210.0),
                Vec2::new(1100.0, 350.0),
                Vec2::new(1220.0, 520.0),
                Vec2::new(1150.0, 720.0),
                Vec2::new(900.0, 800.0),
                Vec2::new(600.0, 760.0),
                Vec2::new(380.0, 650.0),
                Vec2::new(260.0, 540.0),
            ],
        }
    }
}

/// The immutable world a process serves, sent to clients on connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Arena {
    Tag(WorldBounds),
    Racing(Track),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_track_start_is_on_road() {
        let track = Track::default();
        for slot in 0..4 {
            assert!(!track.is_off_road(track.spawn_slot(slot)));
        }
    }

    #[test]
    fn spawn_slots_repeat_every_four() {
        let track = Track::default();
        assert_eq!(track.spawn_slot(1), track.spawn_slot(5));
        assert_eq!(track.spawn_slot(3).y - track.spawn_slot(0).y, 72.0);
    }

    #[test]
    fn checkpoint_index_wraps() {
        let track = Track::default();
        let last = track.waypoint_count() - 1;
        assert_eq!(track.next_checkpoint(last), 0);
        assert_eq!(track.next_checkpoint(0), 1);
    }

    #[test]
    fn far_corner_is_off_road() {
        let track = Track::default();
        assert!(track.is_off_road(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn bounds_clamp_respects_margin() {
        let bounds = WorldBounds::default();
        let p = bounds.clamp(Vec2::new(-50.0, 5000.0), 10.0);
        assert_eq!(p, Vec2::new(10.0, 690.0));
        assert!(bounds.contains(p, 10.0));
    }
}
