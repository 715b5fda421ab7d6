//! High score leaderboard
//!
//! Persisted as a bare JSON array in one storage slot, keeps the top 3.

use serde::{Deserialize, Serialize};

use crate::consts::HIGH_SCORES_KEY;
use crate::platform::{KeyValueStore, StorageError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 3;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub moves: u32,
    /// Seconds taken
    pub time: u32,
}

/// High score leaderboard, sorted descending by score
///
/// Only serialized; stored data comes back through [`Leaderboard::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from arbitrary entries: stable sort, then truncate
    pub fn from_entries(mut entries: Vec<ScoreEntry>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_HIGH_SCORES);
        Self { entries }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Check if a score would make the board
    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Ties with the last entry lose to it
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert without persisting. Returns the rank achieved (1-indexed).
    pub fn insert(&mut self, entry: ScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Equal scores keep insertion order, so go after them
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Merge a finished game into the board and persist it when it placed.
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn admit(&mut self, entry: ScoreEntry, store: &mut impl KeyValueStore) -> Option<usize> {
        let rank = self.insert(entry)?;
        if let Err(e) = self.save(store) {
            log::warn!("Failed to save high scores: {}", e);
        }
        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn contains_player(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Load from storage; missing or corrupt data yields an empty board
    pub fn load(store: &impl KeyValueStore) -> Self {
        let json = match store.get(HIGH_SCORES_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                return Self::new();
            }
            Err(e) => {
                log::warn!("Could not read high scores: {}", e);
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<ScoreEntry>>(&json) {
            Ok(entries) => {
                let board = Self::from_entries(entries);
                log::info!("Loaded {} high scores", board.len());
                board
            }
            Err(e) => {
                log::warn!("Error parsing saved scores: {}", e);
                Self::new()
            }
        }
    }

    /// Overwrite the stored leaderboard
    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)?;
        store.set(HIGH_SCORES_KEY, &json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    fn entry(name: &str, score: u32) -> ScoreEntry {
        ScoreEntry {
            name: name.to_string(),
            score,
            moves: 10,
            time: 30,
        }
    }

    fn scores(board: &Leaderboard) -> Vec<u32> {
        board.entries().iter().map(|e| e.score).collect()
    }

    #[test]
    fn test_keeps_top_three() {
        let mut store = MemoryStore::new();
        let mut board = Leaderboard::new();
        for (i, s) in [500, 900, 300, 700].into_iter().enumerate() {
            board.admit(entry(&format!("p{}", i), s), &mut store);
        }
        assert_eq!(scores(&board), vec![900, 700, 500]);

        let stored = Leaderboard::load(&store);
        assert_eq!(scores(&stored), vec![900, 700, 500]);
    }

    #[test]
    fn test_lower_entry_does_not_change_board() {
        let mut store = MemoryStore::new();
        let mut board = Leaderboard::new();
        for s in [500, 900, 700] {
            board.admit(entry("a", s), &mut store);
        }
        let before = store.raw(HIGH_SCORES_KEY).map(str::to_string);

        assert_eq!(board.admit(entry("b", 100), &mut store), None);
        assert_eq!(board.admit(entry("b", 500), &mut store), None);
        assert_eq!(scores(&board), vec![900, 700, 500]);
        assert_eq!(store.raw(HIGH_SCORES_KEY).map(str::to_string), before);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut board = Leaderboard::new();
        board.insert(entry("first", 800));
        assert_eq!(board.insert(entry("second", 800)), Some(2));
        board.insert(entry("top", 900));

        let names: Vec<&str> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_potential_rank() {
        let mut board = Leaderboard::new();
        assert_eq!(board.potential_rank(1), Some(1));
        board.insert(entry("a", 900));
        board.insert(entry("b", 700));
        board.insert(entry("c", 500));
        assert_eq!(board.potential_rank(1000), Some(1));
        assert_eq!(board.potential_rank(800), Some(2));
        assert_eq!(board.potential_rank(500), None);
        assert_eq!(board.top_score(), Some(900));
    }

    #[test]
    fn test_wire_format() {
        let mut store = MemoryStore::new();
        let mut board = Leaderboard::new();
        board.admit(
            ScoreEntry {
                name: "Alex".into(),
                score: 666,
                moves: 10,
                time: 50,
            },
            &mut store,
        );
        assert_eq!(
            store.raw(HIGH_SCORES_KEY),
            Some(r#"[{"name":"Alex","score":666,"moves":10,"time":50}]"#)
        );
    }

    #[test]
    fn test_load_missing_or_corrupt() {
        assert!(Leaderboard::load(&MemoryStore::new()).is_empty());

        let store = MemoryStore::new().with_item(HIGH_SCORES_KEY, "not json");
        assert!(Leaderboard::load(&store).is_empty());

        let store = MemoryStore::new().with_item(HIGH_SCORES_KEY, r#"{"name":"x"}"#);
        assert!(Leaderboard::load(&store).is_empty());
    }

    #[test]
    fn test_from_entries_sorts_and_truncates() {
        let board = Leaderboard::from_entries(vec![
            entry("a", 200),
            entry("b", 900),
            entry("c", 200),
            entry("d", 100),
            entry("e", 400),
        ]);
        let names: Vec<&str> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "e", "a"]);
        assert_eq!(board.len(), MAX_HIGH_SCORES);
    }

    #[test]
    fn test_load_normalizes() {
        let json = r#"[
            {"name":"a","score":100,"moves":1,"time":1},
            {"name":"b","score":300,"moves":1,"time":1},
            {"name":"c","score":200,"moves":1,"time":1},
            {"name":"d","score":400,"moves":1,"time":1}
        ]"#;
        let store = MemoryStore::new().with_item(HIGH_SCORES_KEY, json);
        let board = Leaderboard::load(&store);
        assert_eq!(scores(&board), vec![400, 300, 200]);
        assert!(board.contains_player("d"));
        assert!(!board.contains_player("a"));
    }
}
