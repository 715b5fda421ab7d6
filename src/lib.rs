//! NeuroMatch - a memory-matching card game
//!
//! Core modules:
//! - `game`: Deck generation, flip resolution, scoring
//! - `session`: Screen state machine and timer ownership
//! - `highscores`: Top-3 leaderboard
//! - `platform`: Browser/native storage abstraction
//! - `timer`: Cancelable timer handles
//! - `settings`: Persisted timing preferences

pub mod game;
pub mod highscores;
pub mod platform;
pub mod session;
pub mod settings;
pub mod timer;

pub use game::{Deck, FlipOutcome, GameState, Symbol};
pub use highscores::{Leaderboard, ScoreEntry};
pub use session::{GameResult, Screen, Session, SessionError};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Distinct symbols per deck
    pub const PAIR_COUNT: usize = 8;
    /// Cards per deck
    pub const DECK_SIZE: usize = PAIR_COUNT * 2;
    /// Score for a flawless instant game, also the zero-denominator score
    pub const MAX_SCORE: u32 = 10_000;

    /// Storage slot for the leaderboard
    pub const HIGH_SCORES_KEY: &str = "memoryHighScores";
    /// Storage slot for settings
    pub const SETTINGS_KEY: &str = "memoryGameSettings";
}
