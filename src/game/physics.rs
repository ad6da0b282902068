//! Per-tick kinematics for runners (tag) and cars (racing)
//!
//! Both integrators use a fixed step of one tick: speeds are in world units
//! per tick and turn rates in radians per tick.

use super::arena::{Track, WorldBounds};
use super::geometry::Vec2;
use super::player::{Body, Player, TagControls};

/// Runner movement constants
#[derive(Debug, Clone, Copy)]
pub struct RunnerStats {
    /// Speed without boost
    pub walk_speed: f32,
    /// Speed while boost is held
    pub boost_speed: f32,
    /// Minimum distance kept from every arena edge
    pub edge_margin: f32,
}

impl Default for RunnerStats {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            boost_speed: 7.0,
            edge_margin: 10.0,
        }
    }
}

/// Car handling constants
#[derive(Debug, Clone, Copy)]
pub struct CarStats {
    /// Speed gained per tick at full throttle
    pub acceleration: f32,
    /// Speed lost per tick at full brake
    pub braking: f32,
    /// Fraction of speed lost to drag every tick
    pub drag: f32,
    /// Heading change per tick at full steer and full speed
    pub turn_rate: f32,
    /// Maximum forward speed
    pub max_speed: f32,
    /// Reverse speed limit as a fraction of `max_speed`
    pub reverse_ratio: f32,
}

impl Default for CarStats {
    fn default() -> Self {
        Self {
            acceleration: 0.18,
            braking: 0.35,
            drag: 0.015,
            turn_rate: 0.06,
            max_speed: 9.0,
            reverse_ratio: 0.4,
        }
    }
}

impl CarStats {
    pub fn reverse_max(&self) -> f32 {
        self.max_speed * self.reverse_ratio
    }

    /// Steering authority at `speed`: 40% when stopped, full at max speed
    pub fn turn_factor(&self, speed: f32) -> f32 {
        0.4 + 0.6 * (speed.abs() / self.max_speed).min(1.0)
    }
}

/// Physics system for advancing player bodies by one tick
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Velocity implied by the movement flags: a unit direction scaled by
    /// walk or boost speed. No flags (or opposing flags) means standing still.
    pub fn runner_velocity(controls: &TagControls, stats: &RunnerStats) -> (f32, f32) {
        let mut dx = 0.0_f32;
        let mut dy = 0.0_f32;
        if controls.left {
            dx -= 1.0;
        }
        if controls.right {
            dx += 1.0;
        }
        if controls.up {
            dy -= 1.0;
        }
        if controls.down {
            dy += 1.0;
        }

        let len = dx.hypot(dy);
        if len == 0.0 {
            return (0.0, 0.0);
        }

        let speed = if controls.boost {
            stats.boost_speed
        } else {
            stats.walk_speed
        };
        (dx / len * speed, dy / len * speed)
    }

    /// Move a runner and keep it inside the arena
    pub fn update_runner(player: &mut Player, bounds: &WorldBounds, stats: &RunnerStats) {
        let Body::Runner(runner) = &mut player.body else {
            return;
        };

        let (vel_x, vel_y) = Self::runner_velocity(&runner.controls, stats);
        runner.vel_x = vel_x;
        runner.vel_y = vel_y;

        let next = bounds.clamp(
            Vec2::new(player.x + vel_x, player.y + vel_y),
            stats.edge_margin,
        );
        player.set_position(next);
    }

    /// Drive a car for one tick. Off-road friction is applied after the move,
    /// for this tick only. Returns true if the car ended the tick off the road.
    pub fn update_car(player: &mut Player, track: &Track, stats: &CarStats) -> bool {
        let Body::Car(car) = &mut player.body else {
            return false;
        };
        let input = car.controls;

        // Turning uses the speed from the previous tick
        car.angle += input.steer * stats.turn_rate * stats.turn_factor(car.speed);

        car.speed += input.throttle * stats.acceleration;
        car.speed -= input.brake * stats.braking;
        car.speed *= 1.0 - stats.drag;
        car.speed = car.speed.clamp(-stats.reverse_max(), stats.max_speed);

        player.x += car.angle.cos() * car.speed;
        player.y += car.angle.sin() * car.speed;

        let off_road = track.is_off_road(Vec2::new(player.x, player.y));
        if off_road {
            car.speed *= track.offroad_friction;
        }
        off_road
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn runner_at(x: f32, y: f32, controls: TagControls) -> Player {
        let mut p = Player::new_runner(Uuid::new_v4(), "r".into(), "red".into(), Vec2::new(x, y), 0);
        p.runner_mut().unwrap().controls = controls;
        p
    }

    fn car_on_grid(track: &Track) -> Player {
        Player::new_car(Uuid::new_v4(), "c".into(), "blue".into(), track, 0, 0)
    }

    #[test]
    fn diagonal_runner_speed_is_normalized() {
        let stats = RunnerStats::default();
        let (vx, vy) = PhysicsSystem::runner_velocity(
            &TagControls {
                up: true,
                right: true,
                ..Default::default()
            },
            &stats,
        );
        assert!((vx.hypot(vy) - stats.walk_speed).abs() < 1e-5);
        assert!(vx > 0.0 && vy < 0.0);
    }

    #[test]
    fn boost_selects_the_faster_speed() {
        let stats = RunnerStats::default();
        let (vx, _) = PhysicsSystem::runner_velocity(
            &TagControls {
                left: true,
                boost: true,
                ..Default::default()
            },
            &stats,
        );
        assert_eq!(vx, -stats.boost_speed);
    }

    #[test]
    fn opposing_flags_cancel() {
        let (vx, vy) = PhysicsSystem::runner_velocity(
            &TagControls {
                left: true,
                right: true,
                ..Default::default()
            },
            &RunnerStats::default(),
        );
        assert_eq!((vx, vy), (0.0, 0.0));
    }

    #[test]
    fn runner_cannot_leave_the_arena() {
        let bounds = WorldBounds::default();
        let stats = RunnerStats::default();
        let mut p = runner_at(
            12.0,
            12.0,
            TagControls {
                up: true,
                left: true,
                boost: true,
                ..Default::default()
            },
        );

        for _ in 0..10 {
            PhysicsSystem::update_runner(&mut p, &bounds, &stats);
        }
        assert_eq!(p.position(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn car_speed_never_exceeds_limits() {
        let track = Track::default();
        let stats = CarStats::default();
        let mut p = car_on_grid(&track);

        p.car_mut().unwrap().controls.throttle = 1.0;
        for _ in 0..1000 {
            PhysicsSystem::update_car(&mut p, &track, &stats);
            assert!(p.car().unwrap().speed <= stats.max_speed);
        }

        let car = p.car_mut().unwrap();
        car.controls.throttle = 0.0;
        car.controls.brake = 1.0;
        for _ in 0..1000 {
            PhysicsSystem::update_car(&mut p, &track, &stats);
            assert!(p.car().unwrap().speed >= -stats.reverse_max());
        }
    }

    #[test]
    fn steering_at_standstill_has_reduced_authority() {
        let stats = CarStats::default();
        assert!((stats.turn_factor(0.0) - 0.4).abs() < 1e-6);
        assert!((stats.turn_factor(stats.max_speed) - 1.0).abs() < 1e-6);
        assert!((stats.turn_factor(-100.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn off_road_friction_slows_the_car_that_tick() {
        let track = Track::default();
        let stats = CarStats::default();
        let mut p = car_on_grid(&track);
        p.set_position(Vec2::new(5.0, 5.0));
        {
            let car = p.car_mut().unwrap();
            car.speed = 5.0;
        }

        let off_road = PhysicsSystem::update_car(&mut p, &track, &stats);
        assert!(off_road);
        let expected = 5.0 * (1.0 - stats.drag) * track.offroad_friction;
        assert!((p.car().unwrap().speed - expected).abs() < 1e-5);
    }

    #[test]
    fn wrong_body_is_left_untouched() {
        let track = Track::default();
        let mut p = runner_at(100.0, 100.0, TagControls::default());
        assert!(!PhysicsSystem::update_car(&mut p, &track, &CarStats::default()));
        assert_eq!(p.position(), Vec2::new(100.0, 100.0));
    }
}
