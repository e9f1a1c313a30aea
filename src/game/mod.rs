//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! Hosts drive it with a timer and read it through snapshots and observer events.

pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod state;

// Re-export commonly used types
pub use config::GameConfig;
pub use direction::Direction;
pub use engine::{GameEngine, GameObserver, TickOutcome};
pub use error::GameError;
pub use state::{EndReason, GameState, GameStatus, Position, Snake, Snapshot};
