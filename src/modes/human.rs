//! Interactive terminal play
//!
//! The engine runs on a [`GameSession`] task; this mode only forwards key
//! presses, draws the latest snapshot and hands final scores to the score store.
//!
//! # Controls
//!
//! - Arrows/WASD: steer
//! - P/Space: pause and resume
//! - R: start a new game
//! - Q/Esc/Ctrl+C: quit

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::game::{GameConfig, GameEngine};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;
use crate::session::scores::DEFAULT_LEADERBOARD_SIZE;
use crate::session::{GameSession, Player, ScoreEntry, ScoreRecorder, ScoreStore, SessionHandle};

pub struct HumanMode {
    config: GameConfig,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    recorder: ScoreRecorder,
    leaderboard: Vec<ScoreEntry>,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig, store: Arc<dyn ScoreStore>, player: Player) -> Self {
        let leaderboard = store.top(DEFAULT_LEADERBOARD_SIZE).unwrap_or_else(|err| {
            warn!("Could not load leaderboard: {:#}", err);
            Vec::new()
        });
        let best = leaderboard.first().map_or(0, |entry| entry.score);

        Self {
            config,
            metrics: GameMetrics::new().with_high_score(best),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            recorder: ScoreRecorder::new(store, player),
            leaderboard,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let engine = GameEngine::new(self.config.clone()).context("Invalid game configuration")?;
        info!(
            "Starting {}x{} game for {}",
            self.config.grid_width,
            self.config.grid_height,
            self.recorder.player().username
        );

        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen, EnableFocusChange)
            .context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_game_loop(&mut terminal, engine).await;

        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
        engine: GameEngine,
    ) -> Result<()> {
        let (session, mut game_over) = GameSession::spawn(engine);
        let mut event_stream = EventStream::new();

        // Render at 30 FPS; the game cadence lives in the session task
        let mut render_timer = interval(Duration::from_millis(33));

        let result = loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        if let Err(err) = self.handle_event(event, &session) {
                            break Err(err);
                        }
                    }
                }

                Some(score) = game_over.recv() => {
                    // Fire-and-forget; the recorder logs failures
                    drop(self.on_game_over(score));
                }

                _ = render_timer.tick() => {
                    let snapshot = session.snapshot();
                    self.metrics.observe_status(snapshot.status);
                    self.metrics.update();
                    let drawn = terminal.draw(|frame| {
                        self.renderer.render(frame, &snapshot, &self.metrics, &self.leaderboard);
                    });
                    if let Err(err) = drawn {
                        break Err(err).context("Failed to draw frame");
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        session.shutdown().await?;
        result
    }

    fn handle_event(&mut self, event: Event, session: &SessionHandle) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match self.input_handler.handle_key_event(key) {
                    KeyAction::Steer(direction) => session.set_direction(direction)?,
                    // The play clock follows the status the session publishes
                    KeyAction::TogglePause => session.toggle_pause()?,
                    KeyAction::Restart => {
                        session.restart()?;
                        self.metrics.on_game_start();
                    }
                    KeyAction::Quit => self.should_quit = true,
                    KeyAction::None => {}
                }
            }
            // Leaving the terminal pauses the game, it is resumed by hand
            Event::FocusLost => session.pause()?,
            _ => {}
        }

        Ok(())
    }

    /// Returns the pending write; the game loop never waits on it
    fn on_game_over(&mut self, score: u32) -> JoinHandle<()> {
        self.metrics.on_game_over(score);
        let write = self.recorder.submit(score);

        self.leaderboard.push(self.recorder.player().entry(score));
        self.leaderboard
            .sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp.cmp(&b.timestamp)));
        self.leaderboard.truncate(DEFAULT_LEADERBOARD_SIZE);
        write
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            terminal.backend_mut(),
            DisableFocusChange,
            LeaveAlternateScreen
        )
        .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::JsonlScoreStore;
    use tempfile::TempDir;

    fn mode_with_store(dir: &TempDir) -> (HumanMode, Arc<JsonlScoreStore>) {
        let store = Arc::new(JsonlScoreStore::new(dir.path().join("scores.jsonl")));
        let mode = HumanMode::new(
            GameConfig::default(),
            store.clone(),
            Player::from_login(Some("lee")),
        );
        (mode, store)
    }

    #[test]
    fn test_initialization_loads_leaderboard() {
        let dir = TempDir::new().unwrap();
        let store = JsonlScoreStore::new(dir.path().join("scores.jsonl"));
        store
            .record(&Player::from_login(Some("ari")).entry(90))
            .unwrap();

        let (mode, _) = mode_with_store(&dir);
        assert_eq!(mode.leaderboard.len(), 1);
        assert_eq!(mode.metrics.high_score, 90);
        assert!(!mode.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_key_round_trips_through_session() {
        use crate::game::GameStatus;
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let dir = TempDir::new().unwrap();
        let (mut mode, _) = mode_with_store(&dir);
        let engine = GameEngine::seeded(GameConfig::default(), 4).unwrap();
        let (session, _game_over) = GameSession::spawn(engine);
        let pause_key = Event::Key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::NONE));

        mode.handle_event(pause_key.clone(), &session).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(session.snapshot().status, GameStatus::Paused);

        mode.handle_event(pause_key, &session).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(session.snapshot().status, GameStatus::Running);

        mode.handle_event(Event::FocusLost, &session).unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(session.snapshot().status, GameStatus::Paused);

        session.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_game_over_updates_board() {
        let dir = TempDir::new().unwrap();
        let (mut mode, store) = mode_with_store(&dir);

        let write = mode.on_game_over(30);

        assert_eq!(mode.metrics.games_played, 1);
        assert_eq!(mode.metrics.high_score, 30);
        assert_eq!(mode.leaderboard[0].username, "lee");

        write.await.unwrap();
        let saved = store.top(10).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].score, 30);
    }
}
