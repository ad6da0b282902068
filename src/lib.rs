//! Arcade Game Server - authoritative real-time simulation for tag and racing
//!
//! One world per process. Clients connect over WebSocket, stream their
//! control intent, and receive a full snapshot of every player each tick.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
