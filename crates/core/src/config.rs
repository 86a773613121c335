//! Game configuration
//!
//! Board size and timing are fixed when a controller is built. Values come
//! from defaults or `MATCH_*` environment variables; unparseable values fall
//! back to the default for that field.

use crate::error::{GameError, Result};
use crate::types::{DEFAULT_COLS, DEFAULT_ROWS, MISMATCH_DISPLAY_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub mismatch_display_ms: u32,
    /// Seed for the letter deck
    pub seed: u32,
    /// Keep flipped-down cards locked until their animation is acknowledged
    pub await_flip_animations: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            mismatch_display_ms: MISMATCH_DISPLAY_MS,
            seed: 1,
            await_flip_animations: false,
        }
    }
}

impl GameConfig {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Number of pairs a board of this size holds
    pub fn pairs(&self) -> usize {
        self.cells().unwrap_or(0) / 2
    }

    /// `rows * cols`, or `None` on overflow
    pub fn cells(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    pub fn validate(&self) -> Result<()> {
        match self.cells() {
            Some(cells) if cells != 0 && cells % 2 == 0 => Ok(()),
            _ => Err(GameError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            }),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup (environment, tests, config maps)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse().ok());

        Self {
            rows: parsed("MATCH_ROWS").unwrap_or(defaults.rows),
            cols: parsed("MATCH_COLS").unwrap_or(defaults.cols),
            mismatch_display_ms: lookup("MATCH_MISMATCH_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.mismatch_display_ms),
            seed: lookup("MATCH_SEED")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.seed),
            await_flip_animations: lookup("MATCH_AWAIT_FLIP_ANIMATIONS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.await_flip_animations),
        }
    }
}
