use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::{Env, Target};
use grid_snake::game::GameConfig;
use grid_snake::modes::{HumanMode, print_leaderboard};
use grid_snake::session::scores::DEFAULT_LEADERBOARD_SIZE;
use grid_snake::session::{JsonlScoreStore, Player};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Classic Snake in the terminal")]
struct Cli {
    /// What to run
    #[arg(long, default_value = "human")]
    mode: Mode,

    /// Grid width in cells (overrides the config file)
    #[arg(long)]
    width: Option<usize>,

    /// Grid height in cells (overrides the config file)
    #[arg(long)]
    height: Option<usize>,

    /// JSON game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name recorded with your scores; "guest" when omitted
    #[arg(long)]
    player: Option<String>,

    /// Score file (JSON lines)
    #[arg(long, default_value = "scores.jsonl")]
    scores: PathBuf,

    /// Number of leaderboard entries to print
    #[arg(long, default_value_t = DEFAULT_LEADERBOARD_SIZE)]
    limit: usize,

    /// Write logs here; the terminal is busy drawing the game
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Play snake with keyboard controls
    Human,
    /// Print the best scores
    Leaderboard,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {:?}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(width) = cli.width {
        config.grid_width = width;
    }
    if let Some(height) = cli.height {
        config.grid_height = height;
    }
    config.validate().context("Invalid game configuration")?;

    let store = Arc::new(JsonlScoreStore::new(cli.scores));

    match cli.mode {
        Mode::Human => {
            let player = Player::from_login(cli.player.as_deref());
            let mut human_mode = HumanMode::new(config, store, player);
            human_mode.run().await?;
        }
        Mode::Leaderboard => {
            print_leaderboard(store.as_ref(), cli.limit)?;
        }
    }

    Ok(())
}
