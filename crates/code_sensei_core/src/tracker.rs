//! crates/code_sensei_core/src/tracker.rs
//!
//! Accumulates how much content the user typed versus pasted.

use crate::domain::AuthorshipCounters;

/// Why the editor changed a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Edit,
    Undo,
    Redo,
}

/// Two monotonically growing counters plus the suppression flag used while the
/// paste path performs its own programmatic edit.
#[derive(Debug, Default)]
pub struct AuthorshipTracker {
    counters: AuthorshipCounters,
    programmatic_edit: bool,
}

impl AuthorshipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds typed text to the written counter.
    pub fn record_written(&mut self, text: &str) {
        self.counters.written_length += char_len(text);
    }

    /// Adds pasted text to the pasted counter. Blank text is ignored.
    ///
    /// Returns whether the text was counted.
    pub fn record_pasted(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.counters.pasted_length += char_len(text);
        true
    }

    /// Classifies one document change reported by the editor.
    ///
    /// Undo/redo replays and changes made while a programmatic edit is in
    /// progress are not authorship.
    pub fn record_change(&mut self, reason: ChangeReason, text: &str) {
        if self.programmatic_edit {
            return;
        }
        if matches!(reason, ChangeReason::Undo | ChangeReason::Redo) {
            return;
        }
        self.record_written(text);
    }

    pub fn begin_programmatic_edit(&mut self) {
        self.programmatic_edit = true;
    }

    pub fn end_programmatic_edit(&mut self) {
        self.programmatic_edit = false;
    }

    pub fn is_programmatic_edit(&self) -> bool {
        self.programmatic_edit
    }

    pub fn counters(&self) -> AuthorshipCounters {
        self.counters
    }
}

fn char_len(text: &str) -> u64 {
    text.chars().count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_and_pasted_accumulate_independently() {
        let mut tracker = AuthorshipTracker::new();
        tracker.record_written("fn main");
        tracker.record_written("() {}");
        assert!(tracker.record_pasted("let x = 1;"));

        let counters = tracker.counters();
        assert_eq!(counters.written_length, 12);
        assert_eq!(counters.pasted_length, 10);
    }

    #[test]
    fn blank_paste_is_ignored() {
        let mut tracker = AuthorshipTracker::new();
        assert!(!tracker.record_pasted(""));
        assert!(!tracker.record_pasted("  \n\t "));
        assert_eq!(tracker.counters().pasted_length, 0);
    }

    #[test]
    fn undo_and_redo_are_not_authorship() {
        let mut tracker = AuthorshipTracker::new();
        tracker.record_change(ChangeReason::Undo, "restored text");
        tracker.record_change(ChangeReason::Redo, "replayed text");
        assert_eq!(tracker.counters().written_length, 0);

        tracker.record_change(ChangeReason::Edit, "abc");
        assert_eq!(tracker.counters().written_length, 3);
    }

    #[test]
    fn programmatic_paste_edit_is_not_counted_as_written() {
        let mut tracker = AuthorshipTracker::new();
        tracker.begin_programmatic_edit();
        tracker.record_change(ChangeReason::Edit, "pasted body");
        tracker.end_programmatic_edit();
        tracker.record_pasted("pasted body");

        let counters = tracker.counters();
        assert_eq!(counters.written_length, 0);
        assert_eq!(counters.pasted_length, 11);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let mut tracker = AuthorshipTracker::new();
        tracker.record_written("héllo ✍️");
        assert_eq!(tracker.counters().written_length, 8);
    }
}
