//! Error types for the game core.
//!
//! Only construction and restart can fail. Everything a player can do during a
//! game is either applied or a silent no-op.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("deck size {deck_size} cannot be split among {rows} rows and {cols} cols")]
    InvalidDeckSize {
        deck_size: usize,
        rows: usize,
        cols: usize,
    },

    #[error("board of {rows} rows and {cols} cols must hold an even, non-zero number of cards")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("deck supports at most {available} distinct pairs, {requested} requested")]
    InsufficientContent { requested: usize, available: usize },
}
