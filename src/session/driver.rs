use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use rand::Rng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::game::{
    Direction, GameEngine, GameError, GameObserver, GameStatus, Snapshot, TickOutcome,
};

enum SessionCommand {
    SetDirection(Direction),
    Pause,
    Resume,
    TogglePause,
    Restart,
    Reset {
        cols: usize,
        rows: usize,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Shutdown,
}

/// Forwards engine events onto channels the host can await
struct ChannelObserver {
    snapshots: watch::Sender<Snapshot>,
    game_over: mpsc::UnboundedSender<u32>,
}

impl GameObserver for ChannelObserver {
    fn on_state_updated(&mut self, snapshot: &Snapshot) {
        self.snapshots.send_replace(snapshot.clone());
    }

    fn on_game_ended(&mut self, final_score: u32) {
        // The host may have stopped listening; scores are fire-and-forget.
        let _ = self.game_over.send(final_score);
    }
}

/// Runs a [`GameEngine`] on its own tokio task.
///
/// After every tick the timer is re-armed with the engine's current interval,
/// so the cadence speeds up as the snake eats. No timer is armed while the
/// game is paused or over, and resuming waits a full interval instead of
/// replaying missed ticks.
pub struct GameSession;

impl GameSession {
    /// Spawn the session task. Returns the command handle and a stream of
    /// final scores, one per finished game.
    pub fn spawn<R>(mut engine: GameEngine<R>) -> (SessionHandle, mpsc::UnboundedReceiver<u32>)
    where
        R: Rng + Send + 'static,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (game_over_tx, game_over_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        engine.add_observer(ChannelObserver {
            snapshots: snapshot_tx,
            game_over: game_over_tx,
        });

        let task = tokio::spawn(run_session(engine, command_rx));

        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        };
        (handle, game_over_rx)
    }
}

async fn run_session<R: Rng>(
    mut engine: GameEngine<R>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
) {
    let mut next_tick = arm(&engine);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    SessionCommand::SetDirection(direction) => {
                        engine.set_direction(direction);
                    }
                    SessionCommand::Pause => {
                        if engine.pause() {
                            next_tick = None;
                        }
                    }
                    SessionCommand::Resume => {
                        if engine.resume() {
                            next_tick = arm(&engine);
                        }
                    }
                    SessionCommand::TogglePause => {
                        if engine.pause() {
                            next_tick = None;
                        } else if engine.resume() {
                            next_tick = arm(&engine);
                        }
                    }
                    SessionCommand::Restart => {
                        engine.restart();
                        next_tick = arm(&engine);
                    }
                    SessionCommand::Reset { cols, rows, reply } => {
                        let result = engine.reset(cols, rows);
                        match &result {
                            Ok(()) => next_tick = arm(&engine),
                            Err(err) => warn!("Rejected reset to {}x{}: {}", cols, rows, err),
                        }
                        let _ = reply.send(result);
                    }
                    SessionCommand::Shutdown => break,
                }
            }

            _ = wait_until(next_tick) => {
                next_tick = match engine.tick() {
                    TickOutcome::Moved | TickOutcome::Ate => arm(&engine),
                    TickOutcome::Ended(_) | TickOutcome::Idle => None,
                };
            }
        }
    }

    debug!("Game session stopped at score {}", engine.score());
}

/// Deadline for the next tick, if the game is running
fn arm<R: Rng>(engine: &GameEngine<R>) -> Option<Instant> {
    (engine.status() == GameStatus::Running).then(|| Instant::now() + engine.tick_interval())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Commands and state access for a running [`GameSession`]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn set_direction(&self, direction: Direction) -> Result<()> {
        self.send(SessionCommand::SetDirection(direction))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(SessionCommand::Resume)
    }

    pub fn toggle_pause(&self) -> Result<()> {
        self.send(SessionCommand::TogglePause)
    }

    /// Start a new game on the current grid
    pub fn restart(&self) -> Result<()> {
        self.send(SessionCommand::Restart)
    }

    /// Resize the grid and start a new game; fails on an unusable grid
    pub async fn reset(&self, cols: usize, rows: usize) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Reset { cols, rows, reply })?;
        response
            .await
            .context("Game session dropped the reset request")?
            .with_context(|| format!("Failed to reset game to {}x{}", cols, rows))
    }

    /// Latest board published by the engine
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the session task and wait for it to exit
    pub async fn shutdown(self) -> Result<()> {
        // The task may already be gone; joining below still succeeds.
        let _ = self.commands.send(SessionCommand::Shutdown);
        self.task.await.context("Game session task panicked")
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("Game session has stopped"))
    }
}
