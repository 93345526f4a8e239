//! High score leaderboards
//!
//! One top-10 table per game, persisted under its own key.

use serde::{Deserialize, Serialize};

use crate::games::GameKind;
use crate::persistence::{KeyValueStore, load_json, save_json};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Leaderboard for one game, sorted by descending score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Storage key for a game's table
    pub fn storage_key(kind: GameKind) -> String {
        format!("patopo_highscores_{}", kind.id())
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a score if it qualifies. Returns the rank achieved.
    pub fn add_score(&mut self, score: u64, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(rank - 1, HighScoreEntry { score, timestamp });
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load a game's table, falling back to an empty one
    pub fn load(store: &dyn KeyValueStore, kind: GameKind) -> Self {
        match load_json::<HighScores>(store, &Self::storage_key(kind)) {
            Ok(Some(mut scores)) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores for {}", scores.entries.len(), kind.id());
                scores
            }
            Ok(None) => Self::new(),
            Err(e) => {
                log::warn!("Discarding high scores for {}: {}", kind.id(), e);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, kind: GameKind) {
        match save_json(store, &Self::storage_key(kind), self) {
            Ok(()) => log::info!("High scores saved for {} ({} entries)", kind.id(), self.entries.len()),
            Err(e) => log::warn!("Could not save high scores for {}: {}", kind.id(), e),
        }
    }
}

/// Format the age of a timestamp as a relative date string
pub fn format_age(now_ms: f64, timestamp_ms: f64) -> String {
    let mins = ((now_ms - timestamp_ms) / 60_000.0).max(0.0);
    let hours = mins / 60.0;
    let days = hours / 24.0;

    if days >= 1.0 {
        match days.floor() as i64 {
            1 => "Yesterday".to_string(),
            d => format!("{} days ago", d),
        }
    } else if hours >= 1.0 {
        match hours.floor() as i64 {
            1 => "1 hour ago".to_string(),
            h => format!("{} hours ago", h),
        }
    } else if mins >= 1.0 {
        match mins.floor() as i64 {
            1 => "1 min ago".to_string(),
            m => format!("{} mins ago", m),
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_zero_never_qualifies() {
        let hs = HighScores::new();
        assert!(!hs.qualifies(0));
        assert_eq!(hs.potential_rank(0), None);
    }

    #[test]
    fn test_sorted_insert_and_trim() {
        let mut hs = HighScores::new();
        for s in 1..=12u64 {
            hs.add_score(s * 10, s as f64);
        }
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(hs.top_score(), Some(120));
        assert_eq!(hs.entries.last().map(|e| e.score), Some(30));
        // Ties go below the existing entry
        assert_eq!(hs.potential_rank(120), Some(2));
        assert_eq!(hs.add_score(20, 0.0), None);
        assert_eq!(hs.add_score(1000, 0.0), Some(1));
    }

    #[test]
    fn test_tables_are_per_game() {
        let mut store = MemoryStore::default();
        let mut race = HighScores::new();
        race.add_score(500, 1.0);
        race.save(&mut store, GameKind::ScrollRace);
        assert_eq!(HighScores::load(&store, GameKind::ScrollRace), race);
        assert!(HighScores::load(&store, GameKind::Door).is_empty());
        assert_ne!(
            HighScores::storage_key(GameKind::LaneRace),
            HighScores::storage_key(GameKind::ScrollRace)
        );
    }

    #[test]
    fn test_corrupt_table_falls_back() {
        let mut store = MemoryStore::default();
        store
            .set(&HighScores::storage_key(GameKind::Punch), "{broken")
            .unwrap();
        assert!(HighScores::load(&store, GameKind::Punch).is_empty());
    }

    #[test]
    fn test_format_age() {
        let now = 10.0 * 86_400_000.0;
        assert_eq!(format_age(now, now), "Just now");
        assert_eq!(format_age(now, now - 90_000.0), "1 min ago");
        assert_eq!(format_age(now, now - 3.0 * 3_600_000.0), "3 hours ago");
        assert_eq!(format_age(now, now - 86_400_000.0), "Yesterday");
        assert_eq!(format_age(now, now - 4.0 * 86_400_000.0), "4 days ago");
    }
}
