//! Game controller - the turn state machine
//!
//! Ties the board, deck provider, mismatch timer and completion signal
//! together. Handles selection, match/mismatch resolution, the timed
//! mismatch display and its interruption, win detection and restart.
//!
//! The controller is single-threaded: every method must be called from one
//! coordinating context (the host loop). Time only moves through
//! [`GameController::tick`]. A [`TimerHandle`] may be handed to other
//! contexts; its cancel requests are picked up on the next tick.

use tracing::{debug, trace};

use crate::board::Board;
use crate::completion::CompletionSignal;
use crate::config::GameConfig;
use crate::deck::DeckProvider;
use crate::error::{GameError, Result};
use crate::snapshot::{CardSnapshot, GameSnapshot};
use crate::timer::{DeferredTimer, TimerHandle, TimerPoll};
use crate::types::{GameAction, GameEvent, GamePhase, ResolveCause};

type Pos = (usize, usize);

#[derive(Debug)]
pub struct GameController<D: DeckProvider> {
    config: GameConfig,
    board: Board,
    deck: D,
    first_selected: Option<Pos>,
    /// Set only while a mismatched pair is on display.
    second_selected: Option<Pos>,
    matched_pairs: usize,
    total_pairs: usize,
    pending_reveal: Option<DeferredTimer>,
    won: bool,
    completion: CompletionSignal,
    /// Monotonic episode id (increments on restart).
    episode_id: u32,
    events: Vec<GameEvent>,
}

impl<D: DeckProvider> GameController<D> {
    /// Deal a first board of `config.rows x config.cols` from `deck`
    pub fn new(config: GameConfig, mut deck: D) -> Result<Self> {
        config.validate()?;
        let pairs = config.pairs();
        if pairs > deck.max_pairs() {
            return Err(GameError::InsufficientContent {
                requested: pairs,
                available: deck.max_pairs(),
            });
        }
        let contents = deck.random_pairs(pairs)?;
        let board = Board::build(config.rows, config.cols, contents)?;
        let total_pairs = board.total_pairs();

        debug!(
            rows = config.rows,
            cols = config.cols,
            total_pairs,
            "game controller initialized"
        );

        Ok(Self {
            config,
            board,
            deck,
            first_selected: None,
            second_selected: None,
            matched_pairs: 0,
            total_pairs,
            pending_reveal: None,
            won: false,
            completion: CompletionSignal::default(),
            episode_id: 0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn deck(&self) -> &D {
        &self.deck
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn first_selected(&self) -> Option<Pos> {
        self.first_selected
    }

    pub fn second_selected(&self) -> Option<Pos> {
        self.second_selected
    }

    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    pub fn completion_visible(&self) -> bool {
        self.completion.visible()
    }

    pub fn completion_pulse(&self) -> bool {
        self.completion.pulse()
    }

    pub fn has_pending_reveal(&self) -> bool {
        self.pending_reveal.is_some()
    }

    /// Milliseconds left on the mismatch display, if one is running
    pub fn pending_reveal_ms(&self) -> Option<u32> {
        self.pending_reveal.as_ref().map(DeferredTimer::remaining_ms)
    }

    /// Handle for cancelling the running mismatch display from elsewhere
    pub fn pending_reveal_handle(&self) -> Option<TimerHandle> {
        self.pending_reveal.as_ref().map(DeferredTimer::handle)
    }

    pub fn phase(&self) -> GamePhase {
        if self.won {
            GamePhase::Won
        } else if self.pending_reveal.is_some() {
            GamePhase::ResolvingMismatch
        } else if self.first_selected.is_some() {
            GamePhase::OneSelected
        } else {
            GamePhase::Idle
        }
    }

    /// Drain notifications queued since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Handle a tap on (row, col).
    ///
    /// A tap while a mismatch is on display only ends the display. Taps on
    /// disabled cards are ignored.
    ///
    /// # Panics
    ///
    /// Panics if (row, col) is off the board.
    pub fn select_card(&mut self, row: usize, col: usize) {
        debug!(
            row,
            col,
            matched_pairs = self.matched_pairs,
            first = ?self.first_selected,
            second = ?self.second_selected,
            won = self.won,
            "select card"
        );

        // Let the player short-circuit the mismatch display.
        if self.pending_reveal.is_some() {
            self.finish_pending_reveal(ResolveCause::Interrupted);
            return;
        }

        if !self.board.card_at(row, col).enabled() {
            trace!(row, col, "card not enabled, ignoring");
            return;
        }

        self.board.card_at_mut(row, col).reveal();
        self.events.push(GameEvent::Revealed { row, col });

        let Some(first) = self.first_selected else {
            self.first_selected = Some((row, col));
            return;
        };

        let second = (row, col);
        self.second_selected = Some(second);

        let is_match = self
            .board
            .card_at(first.0, first.1)
            .content()
            .matches(self.board.card_at(second.0, second.1).content());

        if is_match {
            self.on_match(first, second);
        } else {
            self.on_mismatch(first, second);
        }
    }

    fn on_match(&mut self, first: Pos, second: Pos) {
        self.board.card_at_mut(first.0, first.1).mark_matched();
        self.board.card_at_mut(second.0, second.1).mark_matched();
        self.first_selected = None;
        self.second_selected = None;
        self.matched_pairs += 1;
        self.events.push(GameEvent::Matched { first, second });
        debug!(?first, ?second, matched_pairs = self.matched_pairs, "pair matched");

        if self.matched_pairs == self.total_pairs {
            self.on_game_won();
        }
    }

    fn on_mismatch(&mut self, first: Pos, second: Pos) {
        debug!(?first, ?second, "pair mismatched, starting display timer");
        self.pending_reveal = Some(DeferredTimer::start(self.config.mismatch_display_ms));
        self.events.push(GameEvent::Mismatched { first, second });
    }

    /// Run the mismatch resolution if this caller wins the timer's claim
    fn finish_pending_reveal(&mut self, cause: ResolveCause) {
        let Some(timer) = self.pending_reveal.take() else {
            return;
        };
        if !timer.claim() {
            debug!(?cause, "mismatch resolution preempted");
            return;
        }

        debug!(?cause, "resolving mismatch, turning cards face-down");
        let re_enable = !self.config.await_flip_animations;
        for (row, col) in [self.first_selected.take(), self.second_selected.take()]
            .into_iter()
            .flatten()
        {
            self.board.card_at_mut(row, col).conceal(re_enable);
        }
        self.events.push(GameEvent::MismatchResolved { cause });
    }

    fn on_game_won(&mut self) {
        debug!(episode_id = self.episode_id, "game won");
        self.won = true;
        self.completion.show();
        self.events.push(GameEvent::Won);
    }

    /// End the mismatch display now. Returns false when none is running.
    pub fn cancel_pending_reveal(&mut self) -> bool {
        if self.pending_reveal.is_none() {
            return false;
        }
        self.finish_pending_reveal(ResolveCause::Cancelled);
        true
    }

    /// Advance game time. Returns true if state changed.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        // A timer is claimed or abandoned only after it leaves
        // `pending_reveal`, so the one stored here is always unresolved.
        let Some(timer) = self.pending_reveal.as_mut() else {
            return false;
        };
        match timer.advance(elapsed_ms) {
            TimerPoll::Pending => false,
            TimerPoll::Expired => {
                self.finish_pending_reveal(ResolveCause::Expired);
                true
            }
            TimerPoll::CancelRequested => {
                self.finish_pending_reveal(ResolveCause::Cancelled);
                true
            }
        }
    }

    /// The presentation finished animating the card at (row, col)
    pub fn on_reveal_animation_finished(&mut self, row: usize, col: usize) {
        self.board.card_at_mut(row, col).finish_flip_animation();
    }

    /// The presentation finished animating the win banner
    pub fn on_completion_animation_finished(&mut self) {
        self.completion.acknowledge_pulse();
    }

    /// Deal a fresh deck into the same board and start over.
    ///
    /// A running mismatch display is dropped without flipping anything. On
    /// error (deck provider failure or wrong deck size) the session is left
    /// as it was.
    pub fn restart(&mut self) -> Result<()> {
        let contents = self.deck.random_pairs(self.total_pairs)?;
        self.board.reset(contents)?;

        if let Some(timer) = self.pending_reveal.take() {
            timer.abandon();
        }
        self.first_selected = None;
        self.second_selected = None;
        self.matched_pairs = 0;
        self.won = false;
        self.completion.hide();
        self.episode_id = self.episode_id.wrapping_add(1);
        self.events.push(GameEvent::Restarted {
            episode_id: self.episode_id,
        });

        debug!(episode_id = self.episode_id, "game restarted");
        Ok(())
    }

    /// Apply a presentation command
    pub fn apply_action(&mut self, action: GameAction) -> Result<()> {
        match action {
            GameAction::Select { row, col } => self.select_card(row, col),
            GameAction::CancelReveal => {
                self.cancel_pending_reveal();
            }
            GameAction::RevealAnimationFinished { row, col } => {
                self.on_reveal_animation_finished(row, col)
            }
            GameAction::CompletionAnimationFinished => self.on_completion_animation_finished(),
            GameAction::Restart => self.restart()?,
        }
        Ok(())
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.rows = self.board.rows();
        out.cols = self.board.cols();
        out.cards.clear();
        out.cards.extend(self.board.iter().map(|(_, card)| CardSnapshot {
            text: card.content().text.clone(),
            match_id: card.content().match_id.clone(),
            face_up: card.face_up(),
            matched: card.matched(),
            enabled: card.enabled(),
            flip_pulse: card.flip_pulse(),
        }));
        out.phase = self.phase();
        out.matched_pairs = self.matched_pairs;
        out.total_pairs = self.total_pairs;
        out.pending_reveal_ms = self.pending_reveal_ms();
        out.completion = self.completion.visibility();
        out.completion_pulse = self.completion.pulse();
        out.episode_id = self.episode_id;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{FixedDeck, UpperLetters};
    use crate::error::GameError;
    use crate::types::{Visibility, MISMATCH_DISPLAY_MS};

    // 2x2 board:
    //   A B
    //   B A
    fn small_game() -> GameController<FixedDeck> {
        let deck = FixedDeck::new(FixedDeck::from_ids(&["A", "B", "B", "A"]));
        GameController::new(GameConfig::new(2, 2), deck).unwrap()
    }

    // 3x4 board, pairs laid out column by column:
    //   A B C D
    //   A B C D
    //   E E F F
    fn full_game() -> GameController<FixedDeck> {
        let ids = ["A", "B", "C", "D", "A", "B", "C", "D", "E", "E", "F", "F"];
        let deck = FixedDeck::new(FixedDeck::from_ids(&ids));
        GameController::new(GameConfig::default(), deck).unwrap()
    }

    fn card(game: &GameController<FixedDeck>, row: usize, col: usize) -> &crate::Card {
        game.board().card_at(row, col)
    }

    #[test]
    fn test_new_controller() {
        let game = GameController::new(GameConfig::default(), UpperLetters::new(1)).unwrap();
        assert_eq!(game.board().rows(), 3);
        assert_eq!(game.board().cols(), 4);
        assert_eq!(game.total_pairs(), 6);
        assert_eq!(game.matched_pairs(), 0);
        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(!game.completion_visible());
    }

    #[test]
    fn test_new_controller_invalid_deck_size() {
        let deck = FixedDeck::new(FixedDeck::from_ids(&["A"; 9]));
        let err = GameController::new(GameConfig::default(), deck).unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidDeckSize {
                deck_size: 9,
                rows: 3,
                cols: 4
            }
        );
    }

    #[test]
    fn test_first_selection() {
        let mut game = small_game();
        game.select_card(0, 0);
        assert!(card(&game, 0, 0).face_up());
        assert!(!card(&game, 0, 0).enabled());
        assert_eq!(game.first_selected(), Some((0, 0)));
        assert_eq!(game.phase(), GamePhase::OneSelected);
    }

    #[test]
    fn test_same_card_twice_is_noop() {
        let mut game = small_game();
        game.select_card(0, 0);
        let before = game.snapshot();
        game.take_events();

        game.select_card(0, 0);
        assert_eq!(game.snapshot(), before);
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn test_match_path() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(1, 1);

        assert!(card(&game, 0, 0).matched());
        assert!(card(&game, 1, 1).matched());
        assert!(card(&game, 1, 1).face_up());
        assert!(!card(&game, 1, 1).enabled());
        assert_eq!(game.matched_pairs(), 1);
        assert_eq!(game.first_selected(), None);
        assert_eq!(game.second_selected(), None);
        assert!(!game.has_pending_reveal());
        assert_eq!(game.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_matched_card_ignores_taps() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(1, 1);
        game.select_card(0, 0);
        assert_eq!(game.first_selected(), None);
        assert_eq!(game.matched_pairs(), 1);
    }

    #[test]
    fn test_mismatch_expires() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(0, 1);

        assert_eq!(game.phase(), GamePhase::ResolvingMismatch);
        assert_eq!(game.pending_reveal_ms(), Some(MISMATCH_DISPLAY_MS));
        assert!(card(&game, 0, 1).face_up());

        assert!(!game.tick(MISMATCH_DISPLAY_MS - 1));
        assert!(card(&game, 0, 0).face_up());

        assert!(game.tick(1));
        for (r, c) in [(0, 0), (0, 1)] {
            assert!(!card(&game, r, c).face_up());
            assert!(card(&game, r, c).enabled());
        }
        assert!(!game.has_pending_reveal());
        assert_eq!(game.first_selected(), None);
        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(game
            .take_events()
            .contains(&GameEvent::MismatchResolved {
                cause: ResolveCause::Expired
            }));
    }

    #[test]
    fn test_tap_during_mismatch_interrupts() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(0, 1);
        game.take_events();

        game.select_card(1, 0);

        assert!(!card(&game, 0, 0).face_up());
        assert!(!card(&game, 0, 1).face_up());
        // The interrupting tap does not select the third card.
        assert!(!card(&game, 1, 0).face_up());
        assert_eq!(game.first_selected(), None);
        assert_eq!(
            game.take_events(),
            vec![GameEvent::MismatchResolved {
                cause: ResolveCause::Interrupted
            }]
        );

        // Timer is gone; later ticks change nothing.
        assert!(!game.tick(MISMATCH_DISPLAY_MS));
    }

    #[test]
    fn test_explicit_cancel() {
        let mut game = small_game();
        assert!(!game.cancel_pending_reveal());

        game.select_card(0, 0);
        game.select_card(0, 1);
        assert!(game.cancel_pending_reveal());
        assert!(!card(&game, 0, 0).face_up());
        assert!(!game.cancel_pending_reveal());
    }

    #[test]
    fn test_handle_cancel_resolves_once_on_next_tick() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(0, 1);

        let handle = game.pending_reveal_handle().unwrap();
        handle.cancel();
        assert!(game.has_pending_reveal());

        assert!(game.tick(0));
        assert!(handle.is_resolved());
        assert!(!card(&game, 0, 0).face_up());

        let resolved = game
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::MismatchResolved { .. }))
            .count();
        assert_eq!(resolved, 1);
    }

    #[test]
    fn test_win_shows_completion_once() {
        let mut game = full_game();
        let pairs = [
            ((0, 0), (1, 0)),
            ((0, 1), (1, 1)),
            ((0, 2), (1, 2)),
            ((0, 3), (1, 3)),
            ((2, 0), (2, 1)),
            ((2, 2), (2, 3)),
        ];
        for (i, (a, b)) in pairs.iter().enumerate() {
            assert!(!game.completion_visible());
            game.select_card(a.0, a.1);
            game.select_card(b.0, b.1);
            assert_eq!(game.matched_pairs(), i + 1);
        }

        assert!(game.won());
        assert_eq!(game.phase(), GamePhase::Won);
        assert_eq!(game.completion().visibility(), Visibility::Visible);
        assert!(game.completion_pulse());

        let wins = game
            .take_events()
            .into_iter()
            .filter(|e| *e == GameEvent::Won)
            .count();
        assert_eq!(wins, 1);

        // Further taps are moot.
        game.select_card(0, 0);
        assert!(game.take_events().is_empty());

        game.on_completion_animation_finished();
        assert!(!game.completion_pulse());
        assert!(game.completion_visible());
    }

    #[test]
    fn test_restart_resets_session() {
        let first = FixedDeck::from_ids(&["A", "B", "B", "A"]);
        let second = FixedDeck::from_ids(&["C", "C", "D", "D"]);
        let deck = FixedDeck::from_rounds(vec![first, second]);
        let mut game = GameController::new(GameConfig::new(2, 2), deck).unwrap();

        game.select_card(0, 0);
        game.select_card(1, 1);
        game.select_card(0, 1);
        game.restart().unwrap();

        assert_eq!(game.matched_pairs(), 0);
        assert_eq!(game.first_selected(), None);
        assert!(!game.completion_visible());
        assert_eq!(game.episode_id(), 1);
        assert_eq!(card(&game, 0, 1).content().text, "C");
        assert!(game
            .board()
            .iter()
            .all(|(_, c)| !c.face_up() && !c.matched() && c.enabled()));
    }

    #[test]
    fn test_restart_abandons_pending_reveal() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(0, 1);
        let handle = game.pending_reveal_handle().unwrap();
        game.take_events();

        game.restart().unwrap();
        assert!(!game.has_pending_reveal());
        assert!(handle.is_resolved());
        assert!(!game
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::MismatchResolved { .. })));
        assert!(!game.tick(MISMATCH_DISPLAY_MS));
    }

    #[test]
    fn test_restart_with_bad_deck_keeps_state() {
        let good = FixedDeck::from_ids(&["A", "B", "B", "A"]);
        let bad = FixedDeck::from_ids(&["A", "A"]);
        let deck = FixedDeck::from_rounds(vec![good, bad]);
        let mut game = GameController::new(GameConfig::new(2, 2), deck).unwrap();
        game.select_card(0, 0);
        game.select_card(1, 1);

        let err = game.restart().unwrap_err();
        assert_eq!(
            err,
            GameError::InvalidDeckSize {
                deck_size: 2,
                rows: 2,
                cols: 2
            }
        );
        assert_eq!(game.matched_pairs(), 1);
        assert_eq!(game.episode_id(), 0);
    }

    #[test]
    fn test_restart_after_win_plays_again() {
        let first = FixedDeck::from_ids(&["A", "B", "B", "A"]);
        let second = FixedDeck::from_ids(&["C", "D", "D", "C"]);
        let deck = FixedDeck::from_rounds(vec![first, second]);
        let mut game = GameController::new(GameConfig::new(2, 2), deck).unwrap();

        let win = |game: &mut GameController<FixedDeck>| {
            game.select_card(0, 0);
            game.select_card(1, 1);
            game.select_card(0, 1);
            game.select_card(1, 0);
        };

        // Banner pulse left raised on purpose.
        win(&mut game);
        assert!(game.won());
        assert!(game.completion_pulse());

        game.restart().unwrap();
        game.take_events();
        assert!(!game.won());
        assert_eq!(game.phase(), GamePhase::Idle);
        assert!(!game.completion_visible());
        assert!(!game.completion_pulse());
        assert_eq!(game.matched_pairs(), 0);
        assert!(game
            .board()
            .iter()
            .all(|(_, c)| !c.face_up() && !c.matched() && c.enabled()));

        // Taps register again on the fresh board.
        game.select_card(0, 0);
        assert_eq!(game.phase(), GamePhase::OneSelected);
        assert_eq!(card(&game, 0, 0).content().text, "C");
        game.select_card(1, 1);
        game.select_card(0, 1);
        game.select_card(1, 0);

        assert!(game.won());
        assert!(game.completion_visible());
        assert!(game.completion_pulse());
        let wins = game
            .take_events()
            .into_iter()
            .filter(|e| *e == GameEvent::Won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_new_rejects_board_larger_than_deck() {
        let err = GameController::new(GameConfig::new(8, 8), UpperLetters::new(1)).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientContent {
                requested: 32,
                available: 26
            }
        );
    }

    #[test]
    fn test_await_flip_animations_gates_reenable() {
        let deck = FixedDeck::new(FixedDeck::from_ids(&["A", "B", "B", "A"]));
        let config = GameConfig {
            await_flip_animations: true,
            ..GameConfig::new(2, 2)
        };
        let mut game = GameController::new(config, deck).unwrap();
        game.select_card(0, 0);
        game.select_card(0, 1);
        game.tick(MISMATCH_DISPLAY_MS);

        assert!(!card(&game, 0, 0).face_up());
        assert!(!card(&game, 0, 0).enabled());

        // Locked card ignores taps until its animation is acknowledged.
        game.select_card(0, 0);
        assert_eq!(game.first_selected(), None);

        game.on_reveal_animation_finished(0, 0);
        assert!(card(&game, 0, 0).enabled());
        assert!(!card(&game, 0, 1).enabled());
    }

    #[test]
    fn test_reveal_ack_clears_pulse() {
        let mut game = small_game();
        game.select_card(0, 0);
        assert!(card(&game, 0, 0).flip_pulse());
        game.on_reveal_animation_finished(0, 0);
        assert!(!card(&game, 0, 0).flip_pulse());
        assert!(!card(&game, 0, 0).enabled());
    }

    #[test]
    fn test_apply_action_dispatch() {
        let mut game = small_game();
        game.apply_action(GameAction::Select { row: 0, col: 0 }).unwrap();
        game.apply_action(GameAction::Select { row: 0, col: 1 }).unwrap();
        game.apply_action(GameAction::CancelReveal).unwrap();
        assert_eq!(game.phase(), GamePhase::Idle);

        game.apply_action(GameAction::Restart).unwrap();
        assert_eq!(game.episode_id(), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_select_out_of_range_panics() {
        let mut game = small_game();
        game.select_card(2, 0);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut game = small_game();
        game.select_card(0, 0);
        game.select_card(0, 1);

        let s = game.snapshot();
        assert_eq!((s.rows, s.cols), (2, 2));
        assert_eq!(s.cards.len(), 4);
        assert_eq!(s.phase, GamePhase::ResolvingMismatch);
        assert_eq!(s.pending_reveal_ms, Some(MISMATCH_DISPLAY_MS));
        assert!(s.card(0, 1).unwrap().face_up);
        assert!(s.card(2, 0).is_none());
    }
}
