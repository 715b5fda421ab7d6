//! Per-game state and flip resolution
//!
//! Pure transitions only: no timers, no storage. The session decides when a
//! mismatch is cleared and when a second has elapsed.

use std::collections::BTreeSet;

use super::deck::Deck;
use super::score::compute_score;
use crate::consts::{DECK_SIZE, PAIR_COUNT};

/// Result of a single flip attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Out of range, already face-up, or two cards pending
    Ignored,
    /// First card of a pair turned over
    Revealed(usize),
    /// Second card matched the first; both stay face-up
    Matched(usize, usize),
    /// Second card differs; both pending until cleared
    Mismatched(usize, usize),
}

/// State of one game from deal to completion
#[derive(Debug, Clone)]
pub struct GameState {
    pub deck: Deck,
    /// Face-up cards awaiting resolution (at most 2)
    flipped: Vec<usize>,
    /// Permanently face-up cards
    matched: BTreeSet<usize>,
    /// Completed pair attempts
    pub moves: u32,
    /// Seconds elapsed since the deal
    pub elapsed_secs: u32,
}

impl GameState {
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            flipped: Vec::with_capacity(2),
            matched: BTreeSet::new(),
            moves: 0,
            elapsed_secs: 0,
        }
    }

    /// Turn a card face-up, resolving the pair when it is the second one.
    pub fn flip(&mut self, id: usize) -> FlipOutcome {
        if self.flipped.len() == 2
            || id >= self.deck.len()
            || self.flipped.contains(&id)
            || self.matched.contains(&id)
        {
            return FlipOutcome::Ignored;
        }

        self.flipped.push(id);
        if self.flipped.len() < 2 {
            return FlipOutcome::Revealed(id);
        }

        self.moves += 1;
        let (first, second) = (self.flipped[0], self.flipped[1]);
        if self.deck.symbol(first) == self.deck.symbol(second) {
            self.matched.insert(first);
            self.matched.insert(second);
            self.flipped.clear();
            FlipOutcome::Matched(first, second)
        } else {
            FlipOutcome::Mismatched(first, second)
        }
    }

    /// Turn a mismatched pair back face-down
    pub fn clear_mismatch(&mut self) {
        self.flipped.clear();
    }

    /// Count one elapsed second (no-op once complete)
    pub fn tick(&mut self) {
        if !self.is_complete() {
            self.elapsed_secs += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.matched.len() == DECK_SIZE
    }

    pub fn is_flipped(&self, id: usize) -> bool {
        self.flipped.contains(&id)
    }

    pub fn is_matched(&self, id: usize) -> bool {
        self.matched.contains(&id)
    }

    /// Face-up for any reason
    pub fn is_revealed(&self, id: usize) -> bool {
        self.is_flipped(id) || self.is_matched(id)
    }

    /// CSS classes for the card element at `id`
    pub fn card_class(&self, id: usize) -> &'static str {
        if self.is_matched(id) {
            "card flipped matched"
        } else if self.is_flipped(id) {
            "card flipped"
        } else {
            "card"
        }
    }

    pub fn flipped(&self) -> &[usize] {
        &self.flipped
    }

    pub fn matched(&self) -> &BTreeSet<usize> {
        &self.matched
    }

    /// True while a mismatched pair is waiting to be cleared
    pub fn awaiting_clear(&self) -> bool {
        self.flipped.len() == 2
    }

    pub fn pairs_found(&self) -> usize {
        self.matched.len() / 2
    }

    pub fn total_pairs(&self) -> usize {
        PAIR_COUNT
    }

    pub fn score(&self) -> u32 {
        compute_score(self.moves, self.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ordered_game() -> GameState {
        GameState::new(Deck::default())
    }

    #[test]
    fn test_match_resolves_immediately() {
        let mut game = ordered_game();
        assert_eq!(game.flip(0), FlipOutcome::Revealed(0));
        assert_eq!(game.flip(8), FlipOutcome::Matched(0, 8));
        assert!(game.flipped().is_empty());
        assert!(game.is_matched(0) && game.is_matched(8));
        assert_eq!(game.moves, 1);
        assert_eq!(game.pairs_found(), 1);
    }

    #[test]
    fn test_mismatch_stays_pending() {
        let mut game = ordered_game();
        game.flip(0);
        assert_eq!(game.flip(1), FlipOutcome::Mismatched(0, 1));
        assert_eq!(game.flipped(), &[0, 1]);
        assert!(game.awaiting_clear());
        assert_eq!(game.moves, 1);

        game.clear_mismatch();
        assert!(game.flipped().is_empty());
        assert!(!game.is_revealed(0));
        assert!(!game.is_revealed(1));
        assert_eq!(game.moves, 1);
    }

    #[test]
    fn test_third_flip_ignored() {
        let mut game = ordered_game();
        game.flip(0);
        game.flip(1);
        assert_eq!(game.flip(2), FlipOutcome::Ignored);
        assert_eq!(game.flipped(), &[0, 1]);
        assert_eq!(game.moves, 1);
    }

    #[test]
    fn test_reflip_ignored() {
        let mut game = ordered_game();
        game.flip(3);
        assert_eq!(game.flip(3), FlipOutcome::Ignored);
        assert_eq!(game.moves, 0);

        game.flip(11);
        assert!(game.is_matched(3));
        assert_eq!(game.flip(3), FlipOutcome::Ignored);
        assert_eq!(game.flip(11), FlipOutcome::Ignored);
        assert_eq!(game.moves, 1);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut game = ordered_game();
        assert_eq!(game.flip(DECK_SIZE), FlipOutcome::Ignored);
        assert!(game.flipped().is_empty());
    }

    #[test]
    fn test_complete_and_tick_stops() {
        let mut game = ordered_game();
        game.tick();
        game.tick();
        for i in 0..PAIR_COUNT {
            game.flip(i);
            game.flip(i + PAIR_COUNT);
        }
        assert!(game.is_complete());
        assert_eq!(game.moves, 8);
        assert_eq!(game.elapsed_secs, 2);

        game.tick();
        assert_eq!(game.elapsed_secs, 2);
        assert_eq!(game.score(), compute_score(8, 2));
    }

    #[test]
    fn test_card_class_follows_state() {
        let mut game = ordered_game();
        game.flip(0);
        game.flip(8);
        game.flip(1);
        assert_eq!(game.card_class(0), "card flipped matched");
        assert_eq!(game.card_class(1), "card flipped");
        assert_eq!(game.card_class(2), "card");

        game.flip(2);
        game.clear_mismatch();
        assert_eq!(game.card_class(1), "card");
        assert_eq!(game.card_class(8), "card flipped matched");
    }

    proptest! {
        #[test]
        fn prop_flip_invariants(seed in any::<u64>(), clicks in prop::collection::vec(0usize..20, 0..80)) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut game = GameState::new(Deck::new(&mut rng));
            let mut attempts = 0;

            for id in clicks {
                let outcome = game.flip(id);
                if matches!(outcome, FlipOutcome::Matched(..) | FlipOutcome::Mismatched(..)) {
                    attempts += 1;
                }
                if game.awaiting_clear() && id % 3 == 0 {
                    game.clear_mismatch();
                }

                prop_assert!(game.flipped().len() <= 2);
                prop_assert!(game.flipped().iter().all(|id| !game.is_matched(*id)));
                for &m in game.matched() {
                    let twin = game.deck.twin_of(m).unwrap();
                    prop_assert!(game.is_matched(twin));
                }
            }
            prop_assert_eq!(game.moves, attempts);
        }
    }
}
