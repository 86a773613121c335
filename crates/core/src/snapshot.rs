use crate::types::{GamePhase, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardSnapshot {
    pub text: String,
    pub match_id: String,
    pub face_up: bool,
    pub matched: bool,
    pub enabled: bool,
    pub flip_pulse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub rows: usize,
    pub cols: usize,
    /// Row-major
    pub cards: Vec<CardSnapshot>,
    pub phase: GamePhase,
    pub matched_pairs: usize,
    pub total_pairs: usize,
    pub pending_reveal_ms: Option<u32>,
    pub completion: Visibility,
    pub completion_pulse: bool,
    pub episode_id: u32,
}

impl GameSnapshot {
    pub fn card(&self, row: usize, col: usize) -> Option<&CardSnapshot> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cards.get(row * self.cols + col)
    }

    /// Whether a tap could change anything right now
    pub fn playable(&self) -> bool {
        self.phase != GamePhase::Won
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cards: Vec::new(),
            phase: GamePhase::Idle,
            matched_pairs: 0,
            total_pairs: 0,
            pending_reveal_ms: None,
            completion: Visibility::Hidden,
            completion_pulse: false,
            episode_id: 0,
        }
    }
}
