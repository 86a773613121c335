//! Deck tests - pair generation

use std::collections::HashMap;

use memory_match::core::{DeckProvider, GameError, UpperLetters};
use memory_match::types::LETTER_PAIRS_MAX;

fn counts(deck: &[memory_match::types::CardContent]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for card in deck {
        *map.entry(card.match_id.clone()).or_insert(0) += 1;
    }
    map
}

#[test]
fn test_random_pairs_five_gives_ten_cards() {
    let mut deck = UpperLetters::new(42);
    let cards = deck.random_pairs(5).unwrap();
    assert_eq!(cards.len(), 10);
}

#[test]
fn test_every_id_appears_exactly_twice() {
    let mut deck = UpperLetters::new(7);
    for pairs in 1..=LETTER_PAIRS_MAX {
        let cards = deck.random_pairs(pairs).unwrap();
        assert_eq!(cards.len(), pairs * 2);

        let ids = counts(&cards);
        assert_eq!(ids.len(), pairs);
        assert!(ids.len() <= 26);
        for (id, n) in &ids {
            assert_eq!(*n, 2, "id {} appears {} times", id, n);
            assert_eq!(id.len(), 1);
            assert!(id.chars().all(|c| c.is_ascii_uppercase()));
        }
    }
}

#[test]
fn test_letter_text_equals_match_id() {
    let mut deck = UpperLetters::new(3);
    for card in deck.random_pairs(6).unwrap() {
        assert_eq!(card.text, card.match_id);
    }
}

#[test]
fn test_too_many_pairs() {
    let mut deck = UpperLetters::new(1);
    assert_eq!(deck.max_pairs(), 26);
    assert_eq!(
        deck.random_pairs(27),
        Err(GameError::InsufficientContent {
            requested: 27,
            available: 26
        })
    );
}

#[test]
fn test_same_seed_same_deck() {
    let a = UpperLetters::new(99).random_pairs(6).unwrap();
    let b = UpperLetters::new(99).random_pairs(6).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_successive_deals_differ() {
    let mut deck = UpperLetters::new(5);
    let first = deck.random_pairs(6).unwrap();
    let changed = (0..10).any(|_| deck.random_pairs(6).unwrap() != first);
    assert!(changed);
}
