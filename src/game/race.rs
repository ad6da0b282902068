//! Racing rules: lobby/countdown/running/finished phases and lap counting

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::arena::Track;
use super::physics::{CarStats, PhysicsSystem};
use super::player::Player;
use super::registry::SessionRegistry;

/// Time between an accepted start request and the green light
pub const COUNTDOWN_MS: u64 = 3000;
/// Smallest checkpoint capture radius
pub const MIN_CHECKPOINT_RADIUS: f32 = 40.0;

/// Race phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RacePhase {
    /// Waiting for someone to press start
    Lobby,
    /// Green light at `countdown_end_at`
    Countdown,
    /// Cars drive, checkpoints count
    Running,
    /// Someone reached the lap target; only reset leaves this phase
    Finished,
}

/// Result of feeding one car's position to the checkpoint logic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    None,
    Checkpoint(usize),
    Lap { lap: u32, lap_ms: u64, finished: bool },
}

#[derive(Debug, Clone)]
pub struct RaceMode {
    pub track: Track,
    pub stats: CarStats,
    pub laps_to_win: u32,
    phase: RacePhase,
    countdown_end_at: u64,
}

impl RaceMode {
    pub fn new(track: Track, laps_to_win: u32) -> Self {
        Self {
            track,
            stats: CarStats::default(),
            laps_to_win,
            phase: RacePhase::Lobby,
            countdown_end_at: 0,
        }
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn countdown_end_at(&self) -> u64 {
        self.countdown_end_at
    }

    /// Starts the countdown. Ignored unless in the lobby with at least one car.
    pub fn request_start(&mut self, registry: &SessionRegistry, now: u64) -> bool {
        if self.phase != RacePhase::Lobby || registry.is_empty() {
            debug!(phase = ?self.phase, players = registry.len(), "start request ignored");
            return false;
        }
        self.phase = RacePhase::Countdown;
        self.countdown_end_at = now + COUNTDOWN_MS;
        info!(countdown_end_at = self.countdown_end_at, "race countdown started");
        true
    }

    /// Back to the lobby from any phase: every car returns to its grid slot
    /// and loses its lap, checkpoint and timing state.
    pub fn reset(&mut self, registry: &mut SessionRegistry) {
        self.phase = RacePhase::Lobby;
        self.countdown_end_at = 0;
        for player in registry.iter_mut() {
            player.return_to_grid(&self.track);
            if let Some(car) = player.car_mut() {
                car.clear_race_state();
            }
        }
        info!("race reset to lobby");
    }

    /// A car joining a race in progress starts its first lap now
    pub fn on_join(&self, registry: &mut SessionRegistry, id: Uuid, now: u64) {
        if self.phase != RacePhase::Running {
            return;
        }
        if let Some(car) = registry.get_mut(&id).and_then(|p| p.car_mut()) {
            car.lap_start = now;
            debug!(player_id = %id, "car joined a running race");
        }
    }

    /// Wall-clock phase transitions. Returns true when the race went green.
    pub fn update_phase(&mut self, registry: &mut SessionRegistry, now: u64) -> bool {
        if self.phase != RacePhase::Countdown || now < self.countdown_end_at {
            return false;
        }

        self.phase = RacePhase::Running;
        for car in registry.iter_mut().filter_map(|p| p.car_mut()) {
            car.lap = 0;
            car.checkpoint = 0;
            car.lap_start = now;
        }
        info!(players = registry.len(), "race started");
        true
    }

    /// Integrates every car, then (while running) feeds each new position to
    /// the checkpoint logic. Reaching the lap target finishes the race; cars
    /// later in the same pass still get their progress counted.
    pub fn step(&mut self, registry: &mut SessionRegistry, now: u64) {
        let counting = self.phase == RacePhase::Running;
        if !matches!(self.phase, RacePhase::Running | RacePhase::Finished) {
            return;
        }

        for player in registry.iter_mut() {
            PhysicsSystem::update_car(player, &self.track, &self.stats);
            if !counting {
                continue;
            }

            if let Progress::Lap { lap, lap_ms, finished } = self.advance_checkpoint(player, now) {
                info!(player_id = %player.id, lap, lap_ms, "lap completed");
                if finished && self.phase != RacePhase::Finished {
                    self.phase = RacePhase::Finished;
                    info!(winner = %player.id, "race finished");
                }
            }
        }
    }

    /// Capture radius for the next checkpoint: grows with speed, never below
    /// the fixed minimum.
    pub fn checkpoint_radius(speed: f32) -> f32 {
        MIN_CHECKPOINT_RADIUS.max(speed * 2.0 + 20.0)
    }

    /// Advances the car's checkpoint if it is close enough to the target
    /// waypoint. Wrapping back to index 0 completes a lap.
    pub fn advance_checkpoint(&self, player: &mut Player, now: u64) -> Progress {
        let pos = player.position();
        let Some(car) = player.car_mut() else {
            return Progress::None;
        };

        let Some(target) = self.track.waypoints.get(car.checkpoint) else {
            return Progress::None;
        };
        if pos.distance(*target) >= Self::checkpoint_radius(car.speed) {
            return Progress::None;
        }

        car.checkpoint = self.track.next_checkpoint(car.checkpoint);
        if car.checkpoint != 0 {
            return Progress::Checkpoint(car.checkpoint);
        }

        let lap_ms = now.saturating_sub(car.lap_start);
        car.lap += 1;
        car.last_lap_ms = Some(lap_ms);
        car.best_lap_ms = Some(car.best_lap_ms.map_or(lap_ms, |best| best.min(lap_ms)));
        car.lap_start = now;

        if car.lap >= self.laps_to_win {
            car.finished = true;
        }
        Progress::Lap {
            lap: car.lap,
            lap_ms,
            finished: car.finished,
        }
    }
}
