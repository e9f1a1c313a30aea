//! Grid Snake - a tick-driven Snake game for the terminal
//!
//! This library provides:
//! - Core game engine with no I/O (game module)
//! - Timer-driven session task and score persistence (session module)
//! - TUI rendering and keyboard input (render, input modules)
//! - Play and leaderboard modes (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod session;
