//! Game engine
//!
//! Deck generation, flip resolution, match detection and scoring. Nothing in
//! here touches timers, storage or the DOM.

pub mod deck;
pub mod score;
pub mod state;

pub use deck::{Card, Deck, Symbol};
pub use score::{compute_score, format_time};
pub use state::{FlipOutcome, GameState};
