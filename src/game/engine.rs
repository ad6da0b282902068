//! Authoritative game loop task and the handle connections use to reach it

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GameMode;
use crate::util::time::{tick_duration, unix_millis};
use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::world::SimulationWorld;

const COMMAND_QUEUE: usize = 256;
const EVENT_QUEUE: usize = 64;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("game loop is not running")]
    LoopClosed,
}

/// A message received from a player's connection
#[derive(Debug, Clone)]
pub struct PlayerMessage {
    pub player_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}

/// What a new connection gets back from the loop
#[derive(Debug)]
pub struct Admission {
    pub player_id: Uuid,
    pub welcome: ServerMsg,
    /// Subscribed after this player's own join was broadcast
    pub events: broadcast::Receiver<ServerMsg>,
}

pub enum WorldCommand {
    Connect { reply: oneshot::Sender<Admission> },
    Message(PlayerMessage),
    Disconnect { player_id: Uuid },
}

/// Cheap to clone; shared by the HTTP layer and every connection
#[derive(Clone)]
pub struct WorldHandle {
    cmd_tx: mpsc::Sender<WorldCommand>,
    player_count: Arc<AtomicUsize>,
    tick: Arc<AtomicU64>,
    mode: GameMode,
}

impl WorldHandle {
    pub async fn connect(&self) -> Result<Admission, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(WorldCommand::Connect { reply })
            .await
            .map_err(|_| EngineError::LoopClosed)?;
        rx.await.map_err(|_| EngineError::LoopClosed)
    }

    pub async fn send(&self, player_id: Uuid, msg: ClientMsg) -> Result<(), EngineError> {
        self.cmd_tx
            .send(WorldCommand::Message(PlayerMessage {
                player_id,
                msg,
                received_at: unix_millis(),
            }))
            .await
            .map_err(|_| EngineError::LoopClosed)
    }

    pub async fn disconnect(&self, player_id: Uuid) -> Result<(), EngineError> {
        self.cmd_tx
            .send(WorldCommand::Disconnect { player_id })
            .await
            .map_err(|_| EngineError::LoopClosed)
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }
}

/// Owns the world. Commands and ticks are handled one at a time on a single
/// task, so the world never needs a lock.
pub struct GameLoop {
    world: SimulationWorld,
    cmd_rx: mpsc::Receiver<WorldCommand>,
    events_tx: broadcast::Sender<ServerMsg>,
    player_count: Arc<AtomicUsize>,
    tick: Arc<AtomicU64>,
    tick_duration: Duration,
}

impl GameLoop {
    pub fn new(world: SimulationWorld) -> (Self, WorldHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
        let (events_tx, _) = broadcast::channel(EVENT_QUEUE);
        let player_count = Arc::new(AtomicUsize::new(world.registry().len()));
        let tick = Arc::new(AtomicU64::new(world.tick_count()));

        let handle = WorldHandle {
            cmd_tx,
            player_count: player_count.clone(),
            tick: tick.clone(),
            mode: world.game_mode(),
        };

        let game_loop = Self {
            world,
            cmd_rx,
            events_tx,
            player_count,
            tick,
            tick_duration: tick_duration(),
        };

        (game_loop, handle)
    }

    /// Runs until every handle has been dropped
    pub async fn run(mut self) {
        info!(
            mode = ?self.world.game_mode(),
            tick_ms = self.tick_duration.as_millis() as u64,
            "Game loop started"
        );

        let mut ticker = interval(self.tick_duration);
        // A late tick runs once and the schedule shifts; no catch-up bursts
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = ticker.tick() => self.run_tick(),
            }
        }

        info!(tick = self.world.tick_count(), "Game loop stopped");
    }

    fn handle_command(&mut self, cmd: WorldCommand) {
        match cmd {
            WorldCommand::Connect { reply } => {
                let (player_id, welcome) = self.world.connect(unix_millis());
                self.flush_notifications();

                let admission = Admission {
                    player_id,
                    welcome,
                    events: self.events_tx.subscribe(),
                };
                if reply.send(admission).is_err() {
                    debug!(player_id = %player_id, "Connection gone before admission");
                    self.world.disconnect(&player_id);
                    self.flush_notifications();
                }
            }
            WorldCommand::Message(PlayerMessage {
                player_id,
                msg,
                received_at,
            }) => {
                self.world.handle_message(&player_id, msg, received_at);
                self.flush_notifications();
            }
            WorldCommand::Disconnect { player_id } => {
                self.world.disconnect(&player_id);
                self.flush_notifications();
            }
        }
        self.player_count
            .store(self.world.registry().len(), Ordering::Relaxed);
    }

    fn run_tick(&mut self) {
        let snapshot = self.world.tick(unix_millis());
        self.tick.store(self.world.tick_count(), Ordering::Relaxed);
        self.flush_notifications();

        if self.world.registry().is_empty() {
            return;
        }
        // No receivers is fine: everyone may have just left
        let _ = self.events_tx.send(snapshot);
    }

    fn flush_notifications(&mut self) {
        for msg in self.world.drain_notifications() {
            if self.events_tx.send(msg).is_err() {
                debug!("Notification dropped, no subscribers");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_reports_closed_loop() {
        let (game_loop, handle) = GameLoop::new(SimulationWorld::new(GameMode::Tag, 3, 1));
        drop(game_loop);
        assert!(matches!(handle.connect().await, Err(EngineError::LoopClosed)));
        assert!(handle.disconnect(Uuid::nil()).await.is_err());
    }

    #[tokio::test]
    async fn connect_updates_player_count() {
        let (game_loop, handle) = GameLoop::new(SimulationWorld::new(GameMode::Racing, 3, 1));
        tokio::spawn(game_loop.run());

        let admission = handle.connect().await.unwrap();
        assert!(matches!(admission.welcome, ServerMsg::Welcome { id, .. } if id == admission.player_id));
        assert_eq!(handle.player_count(), 1);
        assert_eq!(handle.mode(), GameMode::Racing);
    }
}
