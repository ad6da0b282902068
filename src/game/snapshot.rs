//! Snapshot building for network transmission
//!
//! Every tick produces one full snapshot of every player. There is no dirty
//! tracking or delta compression, and building never mutates the world.

use crate::ws::protocol::{BodySnapshot, PlayerSnapshot, RaceStatus, ServerMsg};

use super::player::{Body, Player};
use super::race::RaceMode;
use super::registry::SessionRegistry;

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        let body = match &p.body {
            Body::Runner(r) => BodySnapshot::Runner {
                vel_x: r.vel_x,
                vel_y: r.vel_y,
                is_it: r.is_it,
                score: r.score,
            },
            Body::Car(c) => BodySnapshot::Car {
                speed: c.speed,
                angle: c.angle,
                lap: c.lap,
                checkpoint: c.checkpoint,
                finished: c.finished,
                best_lap_ms: c.best_lap_ms,
                last_lap_ms: c.last_lap_ms,
            },
        };

        Self {
            id: p.id,
            name: p.name.clone(),
            color: p.color.clone(),
            x: p.x,
            y: p.y,
            last_input_seq: p.last_input_seq,
            body,
        }
    }
}

impl From<&RaceMode> for RaceStatus {
    fn from(race: &RaceMode) -> Self {
        Self {
            phase: race.phase(),
            countdown_end_at: race.countdown_end_at(),
            laps_to_win: race.laps_to_win,
        }
    }
}

/// Builds snapshots from a read-only view of the world
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    /// All players in join order
    pub fn players(registry: &SessionRegistry) -> Vec<PlayerSnapshot> {
        registry.iter().map(PlayerSnapshot::from).collect()
    }

    /// Build a snapshot message
    pub fn build(
        tick: u64,
        now: u64,
        registry: &SessionRegistry,
        race: Option<&RaceMode>,
    ) -> ServerMsg {
        ServerMsg::Snapshot {
            tick,
            t: now,
            race: race.map(RaceStatus::from),
            players: Self::players(registry),
        }
    }
}
