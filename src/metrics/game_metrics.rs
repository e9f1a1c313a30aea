use std::time::{Duration, Instant};

use crate::game::GameStatus;

/// Per-process play statistics shown next to the board
pub struct GameMetrics {
    started: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
    /// Play time of the current game, excluding pauses
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    pub last_score: Option<u32>,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            paused_at: None,
            paused_total: Duration::ZERO,
            elapsed_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            last_score: None,
        }
    }

    /// Seed the high score, e.g. from the leaderboard
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    /// Refresh the clock; frozen while paused or after game over
    pub fn update(&mut self) {
        let now = self.paused_at.unwrap_or_else(Instant::now);
        self.elapsed_time = now
            .saturating_duration_since(self.started)
            .saturating_sub(self.paused_total);
    }

    pub fn on_game_start(&mut self) {
        self.started = Instant::now();
        self.paused_at = None;
        self.paused_total = Duration::ZERO;
        self.elapsed_time = Duration::ZERO;
    }

    pub fn on_pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    pub fn on_resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += paused_at.elapsed();
        }
    }

    /// Follow the status the engine last published: the clock runs only
    /// while the game does
    pub fn observe_status(&mut self, status: GameStatus) {
        match status {
            GameStatus::Running => self.on_resume(),
            GameStatus::Paused | GameStatus::Ended => self.on_pause(),
        }
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.update();
        self.on_pause();
        self.games_played += 1;
        self.last_score = Some(final_score);
        self.high_score = self.high_score.max(final_score);
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_formatting() {
        let mut metrics = GameMetrics::new();
        metrics.elapsed_time = Duration::from_secs(125);
        assert_eq!(metrics.format_time(), "02:05");

        metrics.elapsed_time = Duration::from_secs(3661);
        assert_eq!(metrics.format_time(), "61:01");
    }

    #[test]
    fn test_high_score_tracking() {
        let mut metrics = GameMetrics::new().with_high_score(20);

        metrics.on_game_over(10);
        assert_eq!(metrics.high_score, 20);
        assert_eq!(metrics.last_score, Some(10));

        metrics.on_game_over(50);
        assert_eq!(metrics.high_score, 50);
        assert_eq!(metrics.games_played, 2);
    }

    #[test]
    fn test_clock_frozen_while_paused() {
        let mut metrics = GameMetrics::new();
        metrics.on_pause();
        std::thread::sleep(Duration::from_millis(40));
        metrics.update();
        assert!(metrics.elapsed_time < Duration::from_millis(40));

        metrics.on_resume();
        metrics.on_resume();
        std::thread::sleep(Duration::from_millis(20));
        metrics.update();
        assert!(metrics.elapsed_time >= Duration::from_millis(20));
    }

    #[test]
    fn test_clock_follows_published_status() {
        let mut metrics = GameMetrics::new();

        // Two pause/resume cycles must leave the clock running
        for _ in 0..2 {
            metrics.observe_status(GameStatus::Paused);
            metrics.observe_status(GameStatus::Paused);
            metrics.observe_status(GameStatus::Running);
        }
        metrics.update();
        let before = metrics.elapsed_time;
        std::thread::sleep(Duration::from_millis(20));
        metrics.update();
        assert!(metrics.elapsed_time >= before + Duration::from_millis(20));

        metrics.observe_status(GameStatus::Ended);
        metrics.update();
        let frozen = metrics.elapsed_time;
        std::thread::sleep(Duration::from_millis(20));
        metrics.update();
        assert_eq!(metrics.elapsed_time, frozen);
    }

    #[test]
    fn test_game_start_resets_time() {
        let mut metrics = GameMetrics::new();
        std::thread::sleep(Duration::from_millis(50));
        metrics.on_game_over(0);
        assert!(metrics.elapsed_time >= Duration::from_millis(50));

        metrics.on_game_start();
        metrics.update();
        assert!(metrics.elapsed_time < Duration::from_millis(50));
    }
}
