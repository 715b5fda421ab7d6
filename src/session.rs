//! Session state machine
//!
//! Owns everything that outlives a single game: the screen, the player name,
//! the leaderboard, the storage slot and the two timers.
//!
//! ```text
//! Home ──start──▶ Playing ──all pairs──▶ GameOver
//!   ▲               │                      │  │
//!   └─────menu──────┘◀──────play again─────┘  │
//!   └──────────────────main menu──────────────┘
//! ```

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::game::{Deck, FlipOutcome, GameState};
use crate::highscores::{Leaderboard, ScoreEntry};
use crate::platform::KeyValueStore;
use crate::settings::Settings;
use crate::timer::{ManualScheduler, Scheduler, TimerHandle};

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter your name to start the game!")]
    EmptyName,
}

/// Outcome of the last completed game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub entry: ScoreEntry,
    /// Leaderboard position (1-indexed) if it placed
    pub rank: Option<usize>,
}

pub struct Session<S: KeyValueStore, T: Scheduler> {
    screen: Screen,
    player_name: String,
    game: Option<GameState>,
    leaderboard: Leaderboard,
    last_result: Option<GameResult>,
    settings: Settings,
    store: S,
    timers: T,
    rng: Pcg32,
    /// Pending mismatch clear
    mismatch_timer: Option<TimerHandle>,
    /// Elapsed-time ticker
    ticker: Option<TimerHandle>,
    /// Decks dealt so far
    deals: u64,
}

impl<S: KeyValueStore, T: Scheduler> Session<S, T> {
    /// Load settings and leaderboard from `store`; `seed` drives deck shuffles.
    pub fn new(store: S, timers: T, seed: u64) -> Self {
        let settings = Settings::load(&store);
        let leaderboard = Leaderboard::load(&store);
        Self {
            screen: Screen::Home,
            player_name: String::new(),
            game: None,
            leaderboard,
            last_result: None,
            settings,
            store,
            timers,
            rng: Pcg32::seed_from_u64(seed),
            mismatch_timer: None,
            ticker: None,
            deals: 0,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn set_player_name(&mut self, name: impl Into<String>) {
        self.player_name = name.into();
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn last_result(&self) -> Option<&GameResult> {
        self.last_result.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Bumped on every deal, so a view can tell a new board from an update
    pub fn deal_count(&self) -> u64 {
        self.deals
    }

    /// True when a mismatch clear is scheduled
    pub fn mismatch_pending(&self) -> bool {
        self.mismatch_timer.is_some()
    }

    /// Leaderboard rows belonging to the current player get highlighted
    pub fn is_current_player(&self, entry: &ScoreEntry) -> bool {
        entry.name == self.player_name.trim()
    }

    /// Deal a fresh shuffled deck and start playing
    pub fn start_game(&mut self) -> Result<(), SessionError> {
        self.validate_name()?;
        let deck = Deck::new(&mut self.rng);
        self.start_with_deck(deck)
    }

    /// Start playing with a caller-supplied deck
    pub fn start_with_deck(&mut self, deck: Deck) -> Result<(), SessionError> {
        self.validate_name()?;

        self.cancel_timers();
        self.game = Some(GameState::new(deck));
        self.deals += 1;
        self.last_result = None;
        self.ticker = Some(self.timers.schedule_repeating(self.settings.tick_interval()));
        self.screen = Screen::Playing;

        log::info!("Game started for {}", self.player_name.trim());
        Ok(())
    }

    /// Replay from the game-over screen
    pub fn play_again(&mut self) -> Result<(), SessionError> {
        self.start_game()
    }

    /// Abandon or leave the current game; the leaderboard is untouched
    pub fn return_home(&mut self) {
        self.cancel_timers();
        self.screen = Screen::Home;
    }

    /// Flip a card; ignored unless a game is in progress
    pub fn flip(&mut self, id: usize) -> FlipOutcome {
        if self.screen != Screen::Playing {
            return FlipOutcome::Ignored;
        }
        let Some(game) = self.game.as_mut() else {
            return FlipOutcome::Ignored;
        };

        let outcome = game.flip(id);
        let complete = game.is_complete();

        match outcome {
            FlipOutcome::Mismatched(..) => {
                if let Some(old) = self.mismatch_timer.take() {
                    self.timers.cancel(old);
                }
                let delay = self.settings.mismatch_delay();
                self.mismatch_timer = Some(self.timers.schedule_once(delay));
            }
            FlipOutcome::Matched(..) if complete => self.finish(),
            _ => {}
        }

        outcome
    }

    /// Deliver a fired timer. Handles that are no longer current are dropped.
    pub fn on_timer(&mut self, handle: TimerHandle) {
        if self.mismatch_timer == Some(handle) {
            self.mismatch_timer = None;
            self.timers.cancel(handle);
            if let Some(game) = self.game.as_mut() {
                game.clear_mismatch();
            }
        } else if self.ticker == Some(handle) {
            if let Some(game) = self.game.as_mut() {
                game.tick();
            }
        } else {
            log::debug!("Ignoring stale timer {:?}", handle);
        }
    }

    fn validate_name(&self) -> Result<(), SessionError> {
        if self.player_name.trim().is_empty() {
            log::warn!("Rejected start with empty name");
            return Err(SessionError::EmptyName);
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.cancel_timers();
        let Some(game) = self.game.as_ref() else {
            return;
        };

        let entry = ScoreEntry {
            name: self.player_name.trim().to_string(),
            score: game.score(),
            moves: game.moves,
            time: game.elapsed_secs,
        };
        let rank = self.leaderboard.admit(entry.clone(), &mut self.store);

        log::info!(
            "Game complete: {} scored {} ({} moves, {}s), rank {:?}",
            entry.name,
            entry.score,
            entry.moves,
            entry.time,
            rank
        );
        self.last_result = Some(GameResult { entry, rank });
        self.screen = Screen::GameOver;
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.mismatch_timer.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.ticker.take() {
            self.timers.cancel(handle);
        }
    }
}

impl<S: KeyValueStore> Session<S, ManualScheduler> {
    /// Move the virtual clock forward, delivering every timer that falls due
    pub fn advance(&mut self, by: Duration) {
        let deadline = self.timers.now() + by;
        while let Some(handle) = self.timers.pop_due(deadline) {
            self.on_timer(handle);
        }
        self.timers.set_now(deadline);
    }
}

impl<S: KeyValueStore, T: Scheduler> Drop for Session<S, T> {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}
