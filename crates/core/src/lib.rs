//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains the rules and state of a memory-matching
//! ("concentration") game. It has no dependencies on rendering, networking,
//! or I/O, making it:
//!
//! - **Deterministic**: Same seed and same inputs produce identical games
//! - **Testable**: Time is advanced explicitly, never read from a clock
//! - **Portable**: Any presentation layer can drive it (terminal, GUI, remote)
//!
//! # Module Structure
//!
//! - [`card`]: A single cell's content and face-up/matched/enabled state
//! - [`board`]: Fixed `rows x cols` grid of cards, dealt from a deck
//! - [`deck`]: [`DeckProvider`] trait plus letter and fixed decks
//! - [`controller`]: Turn state machine with the timed mismatch display
//! - [`timer`]: Cancellable tick-driven delay with a resolve-once guard
//! - [`completion`]: Win banner visibility and animation pulse
//! - [`config`]: Board size and timing configuration
//! - [`snapshot`]: Plain-data view of a session for presentation layers
//! - [`rng`]: Seedable LCG used for shuffling
//!
//! # Game Rules
//!
//! - Tap a face-down card to reveal it; tap a second to reveal its partner
//! - Equal match ids stay face-up for good
//! - A mismatched pair stays up for 3000ms, then flips back
//! - Tapping anything while a mismatch is showing flips it back immediately
//!   (that tap does not count as a selection)
//! - The game is won when every pair is matched
//!
//! # Example
//!
//! ```
//! use memory_match_core::{FixedDeck, GameConfig, GameController};
//!
//! let deck = FixedDeck::new(FixedDeck::from_ids(&["A", "B", "B", "A"]));
//! let mut game = GameController::new(GameConfig::new(2, 2), deck).unwrap();
//!
//! game.select_card(0, 0);
//! game.select_card(1, 1);
//! assert_eq!(game.matched_pairs(), 1);
//!
//! game.select_card(0, 1);
//! game.select_card(1, 0);
//! assert!(game.won());
//! assert!(game.completion_visible());
//! ```
//!
//! # Timing
//!
//! Call [`GameController::tick`](controller::GameController::tick) from the
//! host loop with elapsed milliseconds. Only the mismatch display depends on
//! time.

pub mod board;
pub mod card;
pub mod completion;
pub mod config;
pub mod controller;
pub mod deck;
pub mod error;
pub mod rng;
pub mod snapshot;
pub mod timer;

pub use memory_match_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use card::Card;
pub use completion::CompletionSignal;
pub use config::GameConfig;
pub use controller::GameController;
pub use deck::{DeckProvider, FixedDeck, UpperLetters};
pub use error::{GameError, Result};
pub use rng::SimpleRng;
pub use snapshot::{CardSnapshot, GameSnapshot};
pub use timer::{DeferredTimer, TimerHandle, TimerPoll};
