//! Host-side collaborators around the engine
//!
//! - `driver`: tokio task that owns an engine and ticks it on a self-adjusting timer
//! - `scores`: persistence of final scores and leaderboard queries

pub mod driver;
pub mod scores;

pub use driver::{GameSession, SessionHandle};
pub use scores::{JsonlScoreStore, Player, ScoreEntry, ScoreRecorder, ScoreStore};
