//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the game.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, presentation, remote control protocol).
//!
//! # Board Dimensions
//!
//! The classic layout is 3 rows by 4 columns (6 pairs). Any `rows x cols`
//! with an even, non-zero product is accepted at construction time.
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Host loop timestep (~60 FPS) |
//! | `MISMATCH_DISPLAY_MS` | 3000 | How long a mismatched pair stays face-up |
//!
//! # Examples
//!
//! ```
//! use memory_match_types::{CardContent, GameAction, DEFAULT_COLS, DEFAULT_ROWS};
//!
//! let a = CardContent::new("A", "a");
//! let b = CardContent::new("alpha", "a");
//! assert!(a.matches(&b));
//!
//! let action = GameAction::from_str("restart").unwrap();
//! assert_eq!(action, GameAction::Restart);
//!
//! assert_eq!(DEFAULT_ROWS * DEFAULT_COLS, 12);
//! ```

use std::fmt;

/// Default number of board rows
pub const DEFAULT_ROWS: usize = 3;

/// Default number of board columns
pub const DEFAULT_COLS: usize = 4;

/// Fixed timestep interval for the host loop in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Time a mismatched pair stays face-up before flipping back
pub const MISMATCH_DISPLAY_MS: u32 = 3000;

/// Number of distinct pairs an upper-case Latin letter deck can supply
pub const LETTER_PAIRS_MAX: usize = 26;


/// Face-up content of a card.
///
/// Only `match_id` decides pairing; `text` is what the presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardContent {
    pub text: String,
    pub match_id: String,
}

impl CardContent {
    pub fn new(text: impl Into<String>, match_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            match_id: match_id.into(),
        }
    }

    /// Content whose text doubles as its match id (e.g. letter decks)
    pub fn mirrored(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            match_id: text.clone(),
            text,
        }
    }

    /// Two contents form a pair iff their match ids are equal
    pub fn matches(&self, other: &CardContent) -> bool {
        self.match_id == other.match_id
    }
}

impl fmt::Display for CardContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.text, self.match_id)
    }
}

/// Commands the presentation layer sends to the game controller
///
/// Coordinates are (row, col), zero-based, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Tap a card
    Select { row: usize, col: usize },
    /// Cut the mismatch display short
    CancelReveal,
    /// A card's flip animation finished
    RevealAnimationFinished { row: usize, col: usize },
    /// The win banner animation finished
    CompletionAnimationFinished,
    /// Deal a fresh deck into the same board
    Restart,
}

impl GameAction {
    /// Parse a coordinate-free action from string (case-insensitive)
    ///
    /// Actions carrying coordinates cannot be built from a bare name.
    ///
    /// # Examples
    ///
    /// ```
    /// use memory_match_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("restart"), Some(GameAction::Restart));
    /// assert_eq!(GameAction::from_str("cancelReveal"), Some(GameAction::CancelReveal));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cancelreveal" => Some(GameAction::CancelReveal),
            "completionanimationfinished" => Some(GameAction::CompletionAnimationFinished),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    /// Convert to camelCase string for the control protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Select { .. } => "select",
            GameAction::CancelReveal => "cancelReveal",
            GameAction::RevealAnimationFinished { .. } => "revealAnimationFinished",
            GameAction::CompletionAnimationFinished => "completionAnimationFinished",
            GameAction::Restart => "restart",
        }
    }
}

/// Observable turn state of a session
///
/// `Idle → OneSelected → (match) → Idle` or
/// `Idle → OneSelected → ResolvingMismatch → Idle`; `Won` is absorbing until restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    Idle,
    OneSelected,
    ResolvingMismatch,
    Won,
}

/// What ended a mismatch display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveCause {
    /// The display timer ran out
    Expired,
    /// A tap arrived while the pair was showing
    Interrupted,
    /// An explicit cancel (controller call or timer handle)
    Cancelled,
}

/// Two-state visibility of the win banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// Notifications the controller queues for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEvent {
    Revealed { row: usize, col: usize },
    Matched { first: (usize, usize), second: (usize, usize) },
    Mismatched { first: (usize, usize), second: (usize, usize) },
    MismatchResolved { cause: ResolveCause },
    Won,
    Restarted { episode_id: u32 },
}
