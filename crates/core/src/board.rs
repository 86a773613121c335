//! Board module - manages the card grid
//!
//! The board is a `rows x cols` grid of cards stored in a flat vector,
//! row-major. Dimensions are fixed for the board's lifetime; a new game
//! resets every card in place rather than rebuilding the board.
//! Coordinates: (row, col) where row ranges 0..rows (top to bottom) and col
//! ranges 0..cols (left to right).

use crate::card::Card;
use crate::error::{GameError, Result};
use crate::types::CardContent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    /// Flat array of cards, row-major order (row * cols + col)
    cards: Vec<Card>,
}

impl Board {
    /// Build a board, dealing `deck` into the cells in row-major order.
    ///
    /// The deck must hold exactly `rows * cols` items and that product must be
    /// even and non-zero.
    pub fn build(rows: usize, cols: usize, deck: Vec<CardContent>) -> Result<Self> {
        Self::check_deck(rows, cols, deck.len())?;
        let cards = deck.into_iter().map(Card::new).collect();
        Ok(Self { rows, cols, cards })
    }

    fn check_deck(rows: usize, cols: usize, deck_size: usize) -> Result<()> {
        let Some(cells) = rows.checked_mul(cols) else {
            return Err(GameError::InvalidDimensions { rows, cols });
        };
        if deck_size != cells {
            return Err(GameError::InvalidDeckSize {
                deck_size,
                rows,
                cols,
            });
        }
        if deck_size == 0 || deck_size % 2 != 0 {
            return Err(GameError::InvalidDimensions { rows, cols });
        }
        Ok(())
    }

    /// Calculate flat index from (row, col)
    #[inline(always)]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cards on the board
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Number of pairs the board holds
    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// Check if (row, col) names a cell on this board
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.index(row, col).is_some()
    }

    /// Get card at (row, col), None if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<&Card> {
        self.index(row, col).map(|idx| &self.cards[idx])
    }

    /// Card at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of range. Callers index cells they
    /// were given by this board; use [`Board::get`] for untrusted input.
    pub fn card_at(&self, row: usize, col: usize) -> &Card {
        match self.get(row, col) {
            Some(card) => card,
            None => panic!(
                "card ({row}, {col}) out of range for {}x{} board",
                self.rows, self.cols
            ),
        }
    }

    pub(crate) fn card_at_mut(&mut self, row: usize, col: usize) -> &mut Card {
        let (rows, cols) = (self.rows, self.cols);
        match self.index(row, col) {
            Some(idx) => &mut self.cards[idx],
            None => panic!("card ({row}, {col}) out of range for {rows}x{cols} board"),
        }
    }

    /// Deal a fresh deck into the existing cards.
    ///
    /// Every card gets new content and returns to face-down/unmatched/enabled.
    /// Dimensions and card slots are preserved. On error the board is untouched.
    pub fn reset(&mut self, deck: Vec<CardContent>) -> Result<()> {
        Self::check_deck(self.rows, self.cols, deck.len())?;
        for (card, content) in self.cards.iter_mut().zip(deck) {
            card.reset(content);
        }
        Ok(())
    }

    /// Iterate over cards with their coordinates, row-major
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Card)> + '_ {
        let cols = self.cols;
        self.cards
            .iter()
            .enumerate()
            .map(move |(i, card)| ((i / cols, i % cols), card))
    }
}
