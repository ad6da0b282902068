//! Application state shared across routes

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::game::{GameLoop, SimulationWorld, WorldHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: WorldHandle,
}

impl AppState {
    /// Builds the world and returns the loop that must be spawned to drive it
    pub fn new(config: Config) -> (Self, GameLoop) {
        let seed = config.world_seed.unwrap_or_else(rand::random);
        info!(mode = ?config.mode, seed, laps_to_win = config.laps_to_win, "Creating world");

        let world = SimulationWorld::new(config.mode, config.laps_to_win, seed);
        let (game_loop, handle) = GameLoop::new(world);

        let state = Self {
            config: Arc::new(config),
            world: handle,
        };
        (state, game_loop)
    }
}
