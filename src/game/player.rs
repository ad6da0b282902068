//! Player entity and its mode-specific body

use uuid::Uuid;

use super::arena::Track;
use super::geometry::Vec2;

/// Movement intent for tag (last received, already validated)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagControls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub boost: bool,
}

/// Driving intent for racing, clamped on receipt
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarControls {
    /// 0.0..=1.0
    pub throttle: f32,
    /// -1.0..=1.0, positive turns clockwise on screen
    pub steer: f32,
    /// 0.0..=1.0
    pub brake: f32,
}

/// Tag player: free velocity plus the "it" role
#[derive(Debug, Clone, Default)]
pub struct Runner {
    pub vel_x: f32,
    pub vel_y: f32,
    pub controls: TagControls,
    pub is_it: bool,
    pub score: u32,
}

/// Racing player: scalar speed along a heading plus lap progress
#[derive(Debug, Clone, Default)]
pub struct Car {
    pub speed: f32,
    /// Heading in radians, 0 = +x
    pub angle: f32,
    pub controls: CarControls,
    /// Grid slot assigned on connect, reused on reset
    pub spawn_slot: usize,

    pub lap: u32,
    /// Index of the next waypoint to reach, always < waypoint count
    pub checkpoint: usize,
    pub finished: bool,
    pub best_lap_ms: Option<u64>,
    pub last_lap_ms: Option<u64>,
    /// Wall-clock ms when the current lap began
    pub lap_start: u64,
}

impl Car {
    pub fn new(spawn_slot: usize) -> Self {
        Self {
            spawn_slot,
            ..Self::default()
        }
    }

    /// Clears lap counters and timings; position is left alone
    pub fn clear_race_state(&mut self) {
        self.lap = 0;
        self.checkpoint = 0;
        self.finished = false;
        self.best_lap_ms = None;
        self.last_lap_ms = None;
        self.lap_start = 0;
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    Runner(Runner),
    Car(Car),
}

/// One connected client's authoritative state
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub color: String,

    pub x: f32,
    pub y: f32,
    pub body: Body,

    // Input tracking
    pub last_seen: u64,
    pub last_input_seq: u32,
}

/// Longest display name a client may set, in characters
pub const MAX_NAME_LEN: usize = 20;

impl Player {
    pub fn new_runner(id: Uuid, name: String, color: String, spawn: Vec2, now: u64) -> Self {
        Self {
            id,
            name,
            color,
            x: spawn.x,
            y: spawn.y,
            body: Body::Runner(Runner::default()),
            last_seen: now,
            last_input_seq: 0,
        }
    }

    pub fn new_car(
        id: Uuid,
        name: String,
        color: String,
        track: &Track,
        spawn_slot: usize,
        now: u64,
    ) -> Self {
        let spawn = track.spawn_slot(spawn_slot);
        Self {
            id,
            name,
            color,
            x: spawn.x,
            y: spawn.y,
            body: Body::Car(Car::new(spawn_slot)),
            last_seen: now,
            last_input_seq: 0,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Vec2) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn runner(&self) -> Option<&Runner> {
        match &self.body {
            Body::Runner(r) => Some(r),
            Body::Car(_) => None,
        }
    }

    pub fn runner_mut(&mut self) -> Option<&mut Runner> {
        match &mut self.body {
            Body::Runner(r) => Some(r),
            Body::Car(_) => None,
        }
    }

    pub fn car(&self) -> Option<&Car> {
        match &self.body {
            Body::Car(c) => Some(c),
            Body::Runner(_) => None,
        }
    }

    pub fn car_mut(&mut self) -> Option<&mut Car> {
        match &mut self.body {
            Body::Car(c) => Some(c),
            Body::Runner(_) => None,
        }
    }

    pub fn is_it(&self) -> bool {
        self.runner().is_some_and(|r| r.is_it)
    }

    /// Puts a car back on its grid slot, stationary and facing +x
    pub fn return_to_grid(&mut self, track: &Track) {
        let spawn = match &mut self.body {
            Body::Car(car) => {
                car.speed = 0.0;
                car.angle = 0.0;
                track.spawn_slot(car.spawn_slot)
            }
            Body::Runner(_) => return,
        };
        self.set_position(spawn);
    }
}
