pub mod human;
pub mod leaderboard;

pub use human::HumanMode;
pub use leaderboard::{format_leaderboard, print_leaderboard};
