use super::error::GameError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of columns in the grid
    pub grid_width: usize,
    /// Number of rows in the grid
    pub grid_height: usize,
    /// Length of the snake at reset
    pub initial_snake_length: usize,

    /// Points awarded per food eaten
    pub food_score: u32,
    /// Tick interval at the start of a game, in milliseconds
    pub initial_tick_ms: u64,
    /// Amount the interval shrinks on every food eaten
    pub tick_step_ms: u64,
    /// The interval never drops below this
    pub min_tick_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 30,
            initial_snake_length: 3,
            food_score: 10,
            initial_tick_ms: 140,
            tick_step_ms: 2,
            min_tick_ms: 60,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Read a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that a game can actually be started with these settings
    pub fn validate(&self) -> Result<(), GameError> {
        let (cols, rows) = (self.grid_width, self.grid_height);
        if cols == 0 || rows == 0 {
            return Err(GameError::InvalidGrid { cols, rows });
        }

        // Cells are addressed with i32 coordinates
        let max_side = i32::MAX as usize;
        let cells = match cols.checked_mul(rows) {
            Some(cells) if cols <= max_side && rows <= max_side => cells,
            _ => return Err(GameError::GridTooLarge { cols, rows }),
        };

        // The starting snake lies on a single row and needs one free cell for food.
        let snake_length = self.initial_snake_length.max(1);
        if cols < snake_length || cells <= snake_length {
            return Err(GameError::GridTooSmall {
                cols,
                rows,
                snake_length,
            });
        }

        if self.min_tick_ms == 0 {
            return Err(GameError::InvalidTiming(
                "minimum tick interval must be positive".to_string(),
            ));
        }
        if self.initial_tick_ms < self.min_tick_ms {
            return Err(GameError::InvalidTiming(format!(
                "initial interval {}ms is below the {}ms floor",
                self.initial_tick_ms, self.min_tick_ms
            )));
        }

        Ok(())
    }

    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_tick_ms)
    }

    /// Interval after one more food is eaten, clamped at the floor
    pub fn next_interval(&self, current: Duration) -> Duration {
        let step = Duration::from_millis(self.tick_step_ms);
        let floor = Duration::from_millis(self.min_tick_ms);
        current.saturating_sub(step).max(floor)
    }
}
