//! Prints the best recorded scores and exits

use anyhow::Result;

use crate::session::{ScoreEntry, ScoreStore};

pub fn print_leaderboard(store: &dyn ScoreStore, limit: usize) -> Result<()> {
    let entries = store.top(limit)?;
    print!("{}", format_leaderboard(&entries));
    Ok(())
}

/// Plain-text table, one ranked entry per line
pub fn format_leaderboard(entries: &[ScoreEntry]) -> String {
    if entries.is_empty() {
        return "No scores recorded yet.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{:>4}  {:<20} {:>8}\n", "#", "Player", "Score"));
    out.push_str(&format!("{}\n", "=".repeat(34)));
    for (rank, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<20} {:>8}\n",
            rank + 1,
            entry.username,
            entry.score
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        assert_eq!(format_leaderboard(&[]), "No scores recorded yet.\n");
    }

    #[test]
    fn test_ranked_rows() {
        let entries = vec![
            ScoreEntry {
                user_id: "a".to_string(),
                username: "alex".to_string(),
                score: 120,
                timestamp: 1,
            },
            ScoreEntry {
                user_id: "b".to_string(),
                username: "blair".to_string(),
                score: 40,
                timestamp: 2,
            },
        ];

        let table = format_leaderboard(&entries);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("alex") && lines[2].trim_end().ends_with("120"));
        assert!(lines[3].starts_with("   2"));
    }
}
