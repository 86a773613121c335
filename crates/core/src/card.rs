//! Card module - a single board cell
//!
//! A card starts face-down, unmatched and enabled. Selection turns it face-up
//! and locks it; a match keeps it face-up and locked for the rest of the game.
//! `matched` always implies `face_up`.

use crate::types::CardContent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    content: CardContent,
    face_up: bool,
    matched: bool,
    enabled: bool,
    /// Raised on every face change, cleared when the presentation reports
    /// its flip animation done.
    flip_pulse: bool,
}

impl Card {
    pub fn new(content: CardContent) -> Self {
        Self {
            content,
            face_up: false,
            matched: false,
            enabled: true,
            flip_pulse: false,
        }
    }

    pub fn content(&self) -> &CardContent {
        &self.content
    }

    pub fn face_up(&self) -> bool {
        self.face_up
    }

    pub fn matched(&self) -> bool {
        self.matched
    }

    /// Whether the card currently accepts a selection
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a flip animation is pending acknowledgement
    pub fn flip_pulse(&self) -> bool {
        self.flip_pulse
    }

    /// Turn face-up and lock against re-selection
    pub(crate) fn reveal(&mut self) {
        self.face_up = true;
        self.enabled = false;
        self.flip_pulse = true;
    }

    /// Confirm the card has been paired with its match
    pub(crate) fn mark_matched(&mut self) {
        self.face_up = true;
        self.matched = true;
        self.enabled = false;
    }

    /// Flip back face-down after a mismatch.
    ///
    /// With `re_enable == false` the card stays locked until its flip-down
    /// animation is acknowledged.
    pub(crate) fn conceal(&mut self, re_enable: bool) {
        self.face_up = false;
        self.enabled = re_enable;
        self.flip_pulse = true;
    }

    /// Flip animation finished; a face-down card becomes selectable again
    pub(crate) fn finish_flip_animation(&mut self) {
        self.flip_pulse = false;
        if !self.face_up && !self.matched {
            self.enabled = true;
        }
    }

    /// Re-initialize for a new game with new face-up content
    pub(crate) fn reset(&mut self, content: CardContent) {
        self.content = content;
        self.face_up = false;
        self.matched = false;
        self.enabled = true;
        self.flip_pulse = false;
    }
}
