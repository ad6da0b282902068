//! Game simulation modules

pub mod arena;
pub mod engine;
pub mod geometry;
pub mod input;
pub mod physics;
pub mod player;
pub mod race;
pub mod registry;
pub mod snapshot;
pub mod tag;
pub mod world;

pub use engine::{Admission, EngineError, GameLoop, PlayerMessage, WorldCommand, WorldHandle};
pub use world::SimulationWorld;
