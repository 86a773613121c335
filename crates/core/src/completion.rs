//! Completion signal - state behind the "you win" banner

use crate::types::Visibility;

/// Banner visibility plus a one-shot animation pulse.
///
/// The pulse is raised once per win and cleared when the presentation
/// reports its banner animation finished. It carries no other meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSignal {
    visibility: Visibility,
    pulse: bool,
}

impl CompletionSignal {
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    pub fn pulse(&self) -> bool {
        self.pulse
    }

    pub(crate) fn show(&mut self) {
        self.visibility = Visibility::Visible;
        self.pulse = true;
    }

    pub(crate) fn hide(&mut self) {
        self.visibility = Visibility::Hidden;
        self.pulse = false;
    }

    pub(crate) fn acknowledge_pulse(&mut self) {
        self.pulse = false;
    }
}
