//! Card faces and deck generation

use rand::Rng;
use rand::seq::SliceRandom;

use crate::consts::{DECK_SIZE, PAIR_COUNT};

/// Card face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Cat,
    Dog,
    Rabbit,
    Fox,
    Bear,
    Panda,
    Koala,
    Tiger,
    Lion,
    Cow,
    Pig,
    Frog,
}

impl Symbol {
    /// Every face a deck can be dealt from
    pub const ALL: [Symbol; 12] = [
        Symbol::Cat,
        Symbol::Dog,
        Symbol::Rabbit,
        Symbol::Fox,
        Symbol::Bear,
        Symbol::Panda,
        Symbol::Koala,
        Symbol::Tiger,
        Symbol::Lion,
        Symbol::Cow,
        Symbol::Pig,
        Symbol::Frog,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            Symbol::Cat => "🐱",
            Symbol::Dog => "🐶",
            Symbol::Rabbit => "🐰",
            Symbol::Fox => "🦊",
            Symbol::Bear => "🐻",
            Symbol::Panda => "🐼",
            Symbol::Koala => "🐨",
            Symbol::Tiger => "🐯",
            Symbol::Lion => "🦁",
            Symbol::Cow => "🐮",
            Symbol::Pig => "🐷",
            Symbol::Frog => "🐸",
        }
    }
}

/// A single card; `id` is its position in the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub id: usize,
    pub symbol: Symbol,
}

/// The 16-card playing set for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Deal a fresh deck: 8 random faces, each twice, uniformly shuffled.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut pool = Symbol::ALL;
        pool.shuffle(rng);

        let mut faces: Vec<Symbol> = pool[..PAIR_COUNT]
            .iter()
            .chain(pool[..PAIR_COUNT].iter())
            .copied()
            .collect();
        // Fisher-Yates
        faces.shuffle(rng);

        Self::from_faces(faces)
    }

    /// Unshuffled layout: the symbols in order, then the same symbols again.
    /// Card `i` and card `i + symbols.len()` are twins.
    pub fn ordered(symbols: [Symbol; PAIR_COUNT]) -> Self {
        let faces = symbols.iter().chain(symbols.iter()).copied().collect();
        Self::from_faces(faces)
    }

    fn from_faces(faces: Vec<Symbol>) -> Self {
        debug_assert_eq!(faces.len(), DECK_SIZE);
        let cards = faces
            .into_iter()
            .enumerate()
            .map(|(id, symbol)| Card { id, symbol })
            .collect();
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Symbol of the card at `id` (None if out of range)
    pub fn symbol(&self, id: usize) -> Option<Symbol> {
        self.cards.get(id).map(|c| c.symbol)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Position of the other card carrying the same symbol
    pub fn twin_of(&self, id: usize) -> Option<usize> {
        let symbol = self.symbol(id)?;
        self.cards
            .iter()
            .position(|c| c.id != id && c.symbol == symbol)
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut first = [Symbol::Cat; PAIR_COUNT];
        first.copy_from_slice(&Symbol::ALL[..PAIR_COUNT]);
        Self::ordered(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashMap;

    fn symbol_counts(deck: &Deck) -> HashMap<Symbol, usize> {
        let mut counts = HashMap::new();
        for card in deck.cards() {
            *counts.entry(card.symbol).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_ordered_deck_twins() {
        let deck = Deck::default();
        assert_eq!(deck.len(), DECK_SIZE);
        for i in 0..PAIR_COUNT {
            assert_eq!(deck.symbol(i), deck.symbol(i + PAIR_COUNT));
            assert_eq!(deck.twin_of(i), Some(i + PAIR_COUNT));
        }
        assert_eq!(deck.symbol(DECK_SIZE), None);
    }

    #[test]
    fn test_ids_are_positions() {
        let mut rng = Pcg32::seed_from_u64(7);
        let deck = Deck::new(&mut rng);
        for (i, card) in deck.cards().iter().enumerate() {
            assert_eq!(card.id, i);
        }
    }

    #[test]
    fn test_same_seed_same_deck() {
        let a = Deck::new(&mut Pcg32::seed_from_u64(42));
        let b = Deck::new(&mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_positional_bias() {
        // P(symbol s at position p) = (8/12) * (2/16) = 1/12 for every (s, p)
        const TRIALS: usize = 24_000;
        let mut rng = Pcg32::seed_from_u64(0xC0FFEE);
        let mut hits = [[0usize; DECK_SIZE]; 12];

        for _ in 0..TRIALS {
            let deck = Deck::new(&mut rng);
            for card in deck.cards() {
                let s = Symbol::ALL
                    .iter()
                    .position(|&x| x == card.symbol)
                    .unwrap();
                hits[s][card.id] += 1;
            }
        }

        // Each cell contributes (1 - 1/12) on average over 192 cells: mean ~176,
        // sd ~19. 260 is above 4 sd.
        let expected = TRIALS as f64 / 12.0;
        let chi_square: f64 = hits
            .iter()
            .flatten()
            .map(|&count| (count as f64 - expected).powi(2) / expected)
            .sum();
        assert!(chi_square < 260.0, "chi-square {:.1}", chi_square);

        // No single cell strays more than ~4.7 sd
        for row in &hits {
            for &count in row {
                let deviation = (count as f64 - expected).abs() / expected;
                assert!(deviation < 0.10, "count {} vs expected {}", count, expected);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_deck_has_eight_pairs(seed in any::<u64>()) {
            let deck = Deck::new(&mut Pcg32::seed_from_u64(seed));
            prop_assert_eq!(deck.len(), DECK_SIZE);
            let counts = symbol_counts(&deck);
            prop_assert_eq!(counts.len(), PAIR_COUNT);
            prop_assert!(counts.values().all(|&n| n == 2));
        }

        #[test]
        fn prop_every_card_has_a_twin(seed in any::<u64>()) {
            let deck = Deck::new(&mut Pcg32::seed_from_u64(seed));
            for card in deck.cards() {
                let twin = deck.twin_of(card.id).unwrap();
                prop_assert_ne!(twin, card.id);
                prop_assert_eq!(deck.symbol(twin), Some(card.symbol));
            }
        }
    }
}
