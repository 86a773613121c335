//! Deck module - sources of matched content pairs
//!
//! The controller never invents content itself; it asks a [`DeckProvider`]
//! for `n` pairs whenever it deals a board.

use crate::error::{GameError, Result};
use crate::rng::SimpleRng;
use crate::types::{CardContent, LETTER_PAIRS_MAX};

/// Supplies shuffled decks made of matching pairs
pub trait DeckProvider {
    /// Return `2 * pairs` items: `pairs` distinct match ids, each exactly
    /// twice, in shuffled order.
    fn random_pairs(&mut self, pairs: usize) -> Result<Vec<CardContent>>;

    /// Largest `pairs` value this provider can satisfy
    fn max_pairs(&self) -> usize;
}

impl<D: DeckProvider + ?Sized> DeckProvider for Box<D> {
    fn random_pairs(&mut self, pairs: usize) -> Result<Vec<CardContent>> {
        (**self).random_pairs(pairs)
    }

    fn max_pairs(&self) -> usize {
        (**self).max_pairs()
    }
}

/// Deck of upper case letters, each matched to an identical letter
#[derive(Debug, Clone)]
pub struct UpperLetters {
    rng: SimpleRng,
}

impl UpperLetters {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }
}

impl Default for UpperLetters {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DeckProvider for UpperLetters {
    fn random_pairs(&mut self, pairs: usize) -> Result<Vec<CardContent>> {
        if pairs > LETTER_PAIRS_MAX {
            return Err(GameError::InsufficientContent {
                requested: pairs,
                available: LETTER_PAIRS_MAX,
            });
        }

        let mut letters: Vec<char> = ('A'..='Z').collect();
        self.rng.shuffle(&mut letters);
        letters.truncate(pairs);

        let mut deck: Vec<CardContent> = letters
            .iter()
            .chain(letters.iter())
            .map(|letter| CardContent::mirrored(letter.to_string()))
            .collect();
        self.rng.shuffle(&mut deck);
        Ok(deck)
    }

    fn max_pairs(&self) -> usize {
        LETTER_PAIRS_MAX
    }
}

/// Replays pre-arranged decks round-robin.
///
/// Decks are handed out exactly as given, so a layout can be reproduced
/// cell for cell. Size checking is left to the board.
#[derive(Debug, Clone)]
pub struct FixedDeck {
    rounds: Vec<Vec<CardContent>>,
    next: usize,
}

impl FixedDeck {
    /// A provider that always deals the same arrangement
    pub fn new(deck: Vec<CardContent>) -> Self {
        Self::from_rounds(vec![deck])
    }

    /// A provider that deals each arrangement in turn, wrapping around
    pub fn from_rounds(rounds: Vec<Vec<CardContent>>) -> Self {
        Self { rounds, next: 0 }
    }

    /// Build a deck from match ids, using each id as its own text
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Vec<CardContent> {
        ids.iter()
            .map(|id| CardContent::mirrored(id.as_ref()))
            .collect()
    }
}

impl DeckProvider for FixedDeck {
    fn random_pairs(&mut self, _pairs: usize) -> Result<Vec<CardContent>> {
        if self.rounds.is_empty() {
            return Ok(Vec::new());
        }
        let deck = self.rounds[self.next].clone();
        self.next = (self.next + 1) % self.rounds.len();
        Ok(deck)
    }

    /// No alphabet limit; a wrong-sized arrangement is rejected by the board.
    fn max_pairs(&self) -> usize {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn id_counts(deck: &[CardContent]) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for c in deck {
            *counts.entry(c.match_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_upper_letters_size() {
        let deck = UpperLetters::new(1).random_pairs(5).unwrap();
        assert_eq!(deck.len(), 10);
    }

    #[test]
    fn test_upper_letters_each_id_twice() {
        let mut letters = UpperLetters::new(12345);
        for pairs in 0..=LETTER_PAIRS_MAX {
            let deck = letters.random_pairs(pairs).unwrap();
            let counts = id_counts(&deck);
            assert_eq!(counts.len(), pairs);
            assert!(counts.values().all(|&n| n == 2));
            assert!(deck.iter().all(|c| c.text == c.match_id));
        }
    }

    #[test]
    fn test_upper_letters_rejects_too_many_pairs() {
        let err = UpperLetters::new(1).random_pairs(27).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientContent {
                requested: 27,
                available: 26
            }
        );
    }

    #[test]
    fn test_upper_letters_deterministic_per_seed() {
        let a = UpperLetters::new(9).random_pairs(6).unwrap();
        let b = UpperLetters::new(9).random_pairs(6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_upper_letters_varies_between_calls() {
        let mut letters = UpperLetters::new(3);
        let draws: Vec<_> = (0..8).map(|_| letters.random_pairs(6).unwrap()).collect();
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_fixed_deck_cycles_rounds() {
        let first = FixedDeck::from_ids(&["A", "A"]);
        let second = FixedDeck::from_ids(&["B", "B"]);
        let mut deck = FixedDeck::from_rounds(vec![first.clone(), second.clone()]);
        assert_eq!(deck.random_pairs(1).unwrap(), first);
        assert_eq!(deck.random_pairs(1).unwrap(), second);
        assert_eq!(deck.random_pairs(1).unwrap(), first);
        assert_eq!(deck.max_pairs(), usize::MAX);
    }
}
