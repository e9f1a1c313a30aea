//! Score persistence and leaderboard queries
//!
//! Final scores are appended to a JSON-lines file, one [`ScoreEntry`] per
//! line. Writes happen off the game task and failures are only logged: a
//! lost score never stalls or ends a game.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Number of entries shown on the leaderboard by default
pub const DEFAULT_LEADERBOARD_SIZE: usize = 50;

/// One finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user_id: String,
    pub username: String,
    pub score: u32,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Who is playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub user_id: String,
    pub username: String,
}

impl Player {
    /// Build a player from an optional login name.
    ///
    /// An email address is shortened to the part before `@`. Without a name
    /// the player is `guest` with a per-session anonymous id.
    pub fn from_login(login: Option<&str>) -> Self {
        match login.map(str::trim).filter(|name| !name.is_empty()) {
            Some(login) => {
                let username = login.split('@').next().unwrap_or(login).to_string();
                Self {
                    user_id: login.to_string(),
                    username,
                }
            }
            None => Self {
                user_id: format!("anon-{}", now_millis()),
                username: "guest".to_string(),
            },
        }
    }

    pub fn entry(&self, score: u32) -> ScoreEntry {
        ScoreEntry {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            score,
            timestamp: now_millis(),
        }
    }
}

/// Durable storage for final scores
pub trait ScoreStore: Send + Sync {
    fn record(&self, entry: &ScoreEntry) -> Result<()>;

    /// Best `limit` entries, highest score first
    fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>>;
}

/// Append-only JSON-lines score file
#[derive(Debug, Clone)]
pub struct JsonlScoreStore {
    path: PathBuf,
}

impl JsonlScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScoreStore for JsonlScoreStore {
    fn record(&self, entry: &ScoreEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let mut line = serde_json::to_string(entry).context("Failed to serialize score")?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open score file {:?}", self.path))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to write score to {:?}", self.path))?;
        Ok(())
    }

    fn top(&self, limit: usize) -> Result<Vec<ScoreEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to open score file {:?}", self.path))
            }
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line =
                line.with_context(|| format!("Failed to read score file {:?}", self.path))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScoreEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(
                    "Skipping malformed line {} in {:?}: {}",
                    index + 1,
                    self.path,
                    err
                ),
            }
        }

        // Highest score first; on ties the earlier game ranks higher
        entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp.cmp(&b.timestamp)));
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Sends final scores to a [`ScoreStore`] without waiting on it
#[derive(Clone)]
pub struct ScoreRecorder {
    store: Arc<dyn ScoreStore>,
    player: Player,
}

impl ScoreRecorder {
    pub fn new(store: Arc<dyn ScoreStore>, player: Player) -> Self {
        Self { store, player }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Persist `score` on a blocking worker. The returned handle may be dropped;
    /// errors are logged there and never retried.
    pub fn submit(&self, score: u32) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let entry = self.player.entry(score);

        tokio::task::spawn_blocking(move || match store.record(&entry) {
            Ok(()) => debug!("Recorded score {} for {}", entry.score, entry.username),
            Err(err) => warn!("Failed to record score {}: {:#}", entry.score, err),
        })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
