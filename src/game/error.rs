use thiserror::Error;

/// Errors raised while configuring or resetting a game
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A grid dimension was zero
    #[error("grid must have positive dimensions, got {cols}x{rows}")]
    InvalidGrid { cols: usize, rows: usize },

    /// The grid cannot hold the initial snake plus one food cell
    #[error("a {cols}x{rows} grid cannot fit a snake of length {snake_length} and a food cell")]
    GridTooSmall {
        cols: usize,
        rows: usize,
        snake_length: usize,
    },

    /// Grid dimensions do not fit the board's integer coordinates
    #[error("a {cols}x{rows} grid is too large")]
    GridTooLarge { cols: usize, rows: usize },

    /// A board handed to the engine breaks a game invariant
    #[error("invalid board: {0}")]
    InvalidState(String),

    /// Tick interval settings are inconsistent
    #[error("invalid tick timing: {0}")]
    InvalidTiming(String),
}
