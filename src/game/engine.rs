use super::{
    config::GameConfig,
    direction::Direction,
    error::GameError,
    state::{EndReason, GameState, GameStatus, Position, Snake, Snapshot},
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Duration;

/// Receives the engine's events. Both methods default to doing nothing.
pub trait GameObserver: Send {
    /// Called after every reset and after every tick that ran
    fn on_state_updated(&mut self, _snapshot: &Snapshot) {}

    /// Called exactly once per game, when it reaches a terminal condition
    fn on_game_ended(&mut self, _final_score: u32) {}
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game was not running, nothing happened
    Idle,
    /// The snake moved one cell
    Moved,
    /// The snake moved onto the food and grew
    Ate,
    /// The game is over
    Ended(EndReason),
}

/// Tick-driven snake simulation.
///
/// The engine owns all mutable game state. Hosts drive it by calling
/// [`GameEngine::tick`] every [`GameEngine::tick_interval`] and feed input
/// through [`GameEngine::set_direction`]. The engine never schedules
/// anything itself.
pub struct GameEngine<R = StdRng> {
    config: GameConfig,
    state: GameState,
    pending_direction: Option<Direction>,
    rng: R,
    observers: Vec<Box<dyn GameObserver>>,
}

impl GameEngine<StdRng> {
    /// Create an engine seeded from system entropy
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine with reproducible food placement
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Continue from an existing board, e.g. a prepared position
    pub fn from_state(config: GameConfig, state: GameState) -> Result<Self, GameError> {
        Self::with_state(config, state, StdRng::from_entropy())
    }
}

impl<R: Rng> GameEngine<R> {
    pub fn with_rng(config: GameConfig, mut rng: R) -> Result<Self, GameError> {
        config.validate()?;
        let state = Self::fresh_state(&config, &mut rng);

        Ok(Self {
            config,
            state,
            pending_direction: None,
            rng,
            observers: Vec::new(),
        })
    }

    /// Start from `state` instead of a fresh game. The board must match the
    /// configured grid and satisfy every snake and food invariant.
    pub fn with_state(config: GameConfig, state: GameState, rng: R) -> Result<Self, GameError> {
        config.validate()?;
        check_board(&config, &state)?;

        Ok(Self {
            config,
            state,
            pending_direction: None,
            rng,
            observers: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: impl GameObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Resize the grid and start a new game on it
    pub fn reset(&mut self, cols: usize, rows: usize) -> Result<(), GameError> {
        let config = GameConfig {
            grid_width: cols,
            grid_height: rows,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        self.restart();
        Ok(())
    }

    /// Start a new game on the current grid
    pub fn restart(&mut self) {
        self.state = Self::fresh_state(&self.config, &mut self.rng);
        self.pending_direction = None;
        info!(
            "New game on {}x{} grid, head at {:?}",
            self.config.grid_width,
            self.config.grid_height,
            self.state.snake.head()
        );
        self.emit_state();
    }

    /// Buffer a turn for the next tick.
    ///
    /// Returns false when the request was ignored: a reversal of the current
    /// heading, or a game that has already ended.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.state.status == GameStatus::Ended
            || direction.is_opposite(self.state.snake.direction)
        {
            return false;
        }
        self.pending_direction = Some(direction);
        true
    }

    /// Advance the simulation by one step
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Idle;
        }

        // The pending slot is consumed whether or not the turn is legal.
        if let Some(next) = self.pending_direction.take() {
            if !next.is_opposite(self.state.snake.direction) {
                self.state.snake.direction = next;
            }
        }

        let new_head = self
            .state
            .snake
            .head()
            .moved_in_direction(self.state.snake.direction);

        if !self.state.is_in_bounds(new_head) {
            return self.finish(EndReason::Wall);
        }
        // Checked against the whole body, including the tail about to move.
        if self.state.snake.occupies(new_head) {
            return self.finish(EndReason::SelfCollision);
        }

        let ate_food = self.state.food == Some(new_head);
        self.state.snake.advance(new_head, ate_food);
        self.state.steps += 1;

        if ate_food {
            self.state.score += self.config.food_score;
            self.state.tick_interval = self.config.next_interval(self.state.tick_interval);
            self.state.food = Self::place_food(
                &self.state.snake,
                self.config.grid_width,
                self.config.grid_height,
                &mut self.rng,
            );
            debug!(
                "Food eaten, score {} interval {:?}",
                self.state.score, self.state.tick_interval
            );
            if self.state.food.is_none() {
                return self.finish(EndReason::GridFull);
            }
        }

        self.emit_state();
        if ate_food {
            TickOutcome::Ate
        } else {
            TickOutcome::Moved
        }
    }

    /// Suspend ticking. Returns true if the game was running.
    pub fn pause(&mut self) -> bool {
        if self.state.status != GameStatus::Running {
            return false;
        }
        self.state.status = GameStatus::Paused;
        debug!("Game paused at score {}", self.state.score);
        self.emit_state();
        true
    }

    /// Continue a paused game. Returns true when the host should start
    /// scheduling ticks again; an ended game stays ended.
    pub fn resume(&mut self) -> bool {
        if self.state.status != GameStatus::Paused {
            return false;
        }
        self.state.status = GameStatus::Running;
        debug!("Game resumed at score {}", self.state.score);
        self.emit_state();
        true
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn direction(&self) -> Direction {
        self.state.snake.direction
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending_direction
    }

    /// Delay the host should wait before the next tick
    pub fn tick_interval(&self) -> Duration {
        self.state.tick_interval
    }

    fn finish(&mut self, reason: EndReason) -> TickOutcome {
        self.state.status = GameStatus::Ended;
        self.state.end_reason = Some(reason);
        info!(
            "Game over ({:?}) with score {}",
            reason, self.state.score
        );

        self.emit_state();
        let score = self.state.score;
        for observer in &mut self.observers {
            observer.on_game_ended(score);
        }
        TickOutcome::Ended(reason)
    }

    fn emit_state(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.state.snapshot();
        for observer in &mut self.observers {
            observer.on_state_updated(&snapshot);
        }
    }

    fn fresh_state(config: &GameConfig, rng: &mut R) -> GameState {
        let length = config.initial_snake_length.max(1);
        // Head sits a third of the way across; pushed right if the body would
        // otherwise stick out of the left wall.
        let head = Position::new(
            (config.grid_width / 3).max(length - 1) as i32,
            (config.grid_height / 2) as i32,
        );
        let snake = Snake::new(head, Direction::Right, length);
        let food = Self::place_food(&snake, config.grid_width, config.grid_height, rng);

        GameState::new(
            snake,
            food,
            config.grid_width,
            config.grid_height,
            config.initial_interval(),
        )
    }

    /// Pick a uniformly random cell not covered by the snake
    fn place_food(snake: &Snake, cols: usize, rows: usize, rng: &mut R) -> Option<Position> {
        let occupied: HashSet<Position> = snake.cells().collect();
        let free = (cols * rows).saturating_sub(occupied.len());
        if free == 0 {
            return None;
        }

        let pick = rng.gen_range(0..free);
        (0..rows)
            .flat_map(|y| (0..cols).map(move |x| Position::new(x as i32, y as i32)))
            .filter(|pos| !occupied.contains(pos))
            .nth(pick)
    }
}

fn check_board(config: &GameConfig, state: &GameState) -> Result<(), GameError> {
    let invalid = |msg: String| Err(GameError::InvalidState(msg));

    if (state.grid_width, state.grid_height) != (config.grid_width, config.grid_height) {
        return invalid(format!(
            "board is {}x{} but the grid is configured as {}x{}",
            state.grid_width, state.grid_height, config.grid_width, config.grid_height
        ));
    }

    let cells: Vec<Position> = state.snake.cells().collect();
    if cells.is_empty() {
        return invalid("snake has no cells".to_string());
    }
    let mut seen = HashSet::with_capacity(cells.len());
    for cell in &cells {
        if !state.is_in_bounds(*cell) {
            return invalid(format!("snake cell {:?} is off the grid", cell));
        }
        if !seen.insert(*cell) {
            return invalid(format!("snake overlaps itself at {:?}", cell));
        }
    }
    if let Some(pair) = cells.windows(2).find(|pair| pair[0].manhattan_distance(pair[1]) != 1) {
        return invalid(format!("snake cells {:?} and {:?} are not adjacent", pair[0], pair[1]));
    }

    match state.food {
        Some(food) if !state.is_in_bounds(food) => {
            invalid(format!("food {:?} is off the grid", food))
        }
        Some(food) if seen.contains(&food) => invalid(format!("food {:?} is under the snake", food)),
        None if cells.len() < config.grid_width * config.grid_height => {
            invalid("no food while free cells remain".to_string())
        }
        _ => Ok(()),
    }
}
