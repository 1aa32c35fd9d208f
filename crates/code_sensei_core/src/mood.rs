//! crates/code_sensei_core/src/mood.rs
//!
//! Derives the mentor's mood from the authorship ratio and suppresses
//! notifications for ticks that do not change it.

use crate::domain::{AuthorshipCounters, Mood, MoodState};

/// Ratio at or above which the mentor is happy, as `numerator / denominator`.
pub const HAPPY_RATIO: (u64, u64) = (95, 100);
/// Ratio strictly below which the mentor is stern.
pub const STERN_RATIO: (u64, u64) = (65, 100);

/// Maps counters to a mood.
///
/// Thresholds are compared in integer arithmetic so boundary ratios such as
/// 95/100 land exactly where they should.
pub fn classify(counters: &AuthorshipCounters) -> MoodState {
    let total = counters.total() as u128;
    if total == 0 {
        return MoodState::None;
    }
    let written = counters.written_length as u128;

    if written * (HAPPY_RATIO.1 as u128) >= total * (HAPPY_RATIO.0 as u128) {
        MoodState::Mood(Mood::Happy)
    } else if written * (STERN_RATIO.1 as u128) < total * (STERN_RATIO.0 as u128) {
        MoodState::Mood(Mood::Stern)
    } else {
        MoodState::Mood(Mood::Idle)
    }
}

/// Remembers the last mood shown so only transitions are emitted.
#[derive(Debug, Default)]
pub struct MoodEngine {
    last_emitted: Option<Mood>,
}

impl MoodEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates one tick. Returns the new mood when it differs from the last
    /// emitted one; `None` means nothing should be shown.
    ///
    /// The transition is not recorded until `commit` is called, so a tick
    /// whose display update failed is retried on the next tick.
    pub fn transition(&self, counters: &AuthorshipCounters) -> Option<Mood> {
        match classify(counters) {
            MoodState::None => None,
            MoodState::Mood(mood) if Some(mood) == self.last_emitted => None,
            MoodState::Mood(mood) => Some(mood),
        }
    }

    pub fn commit(&mut self, mood: Mood) {
        self.last_emitted = Some(mood);
    }

    pub fn last_emitted(&self) -> Option<Mood> {
        self.last_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(written: u64, pasted: u64) -> AuthorshipCounters {
        AuthorshipCounters {
            written_length: written,
            pasted_length: pasted,
        }
    }

    #[test]
    fn boundaries_map_to_expected_moods() {
        assert_eq!(classify(&counters(95, 5)), MoodState::Mood(Mood::Happy));
        assert_eq!(classify(&counters(94, 6)), MoodState::Mood(Mood::Idle));
        assert_eq!(classify(&counters(65, 35)), MoodState::Mood(Mood::Idle));
        assert_eq!(classify(&counters(64, 36)), MoodState::Mood(Mood::Stern));
        assert_eq!(classify(&counters(0, 0)), MoodState::None);
    }

    #[test]
    fn extremes() {
        assert_eq!(classify(&counters(10, 0)), MoodState::Mood(Mood::Happy));
        assert_eq!(classify(&counters(0, 10)), MoodState::Mood(Mood::Stern));
        assert_eq!(
            classify(&counters(u64::MAX / 2, u64::MAX / 2)),
            MoodState::Mood(Mood::Stern)
        );
    }

    #[test]
    fn unchanged_counters_emit_once() {
        let mut engine = MoodEngine::new();
        let c = counters(50, 50);

        let first = engine.transition(&c);
        assert_eq!(first, Some(Mood::Stern));
        engine.commit(Mood::Stern);

        assert_eq!(engine.transition(&c), None);
        assert_eq!(engine.transition(&c), None);
    }

    #[test]
    fn drifting_ratio_re_enters_states() {
        let mut engine = MoodEngine::new();
        for (written, pasted, expected) in [
            (100, 0, Some(Mood::Happy)),
            (100, 40, Some(Mood::Idle)),
            (100, 100, Some(Mood::Stern)),
            (100, 100, None),
            (2000, 100, Some(Mood::Happy)),
        ] {
            let mood = engine.transition(&counters(written, pasted));
            assert_eq!(mood, expected, "at ({written}, {pasted})");
            if let Some(mood) = mood {
                engine.commit(mood);
            }
        }
    }

    #[test]
    fn no_data_emits_nothing_and_keeps_last_mood() {
        let mut engine = MoodEngine::new();
        assert_eq!(engine.transition(&counters(0, 0)), None);
        engine.commit(Mood::Idle);
        assert_eq!(engine.transition(&counters(0, 0)), None);
        assert_eq!(engine.last_emitted(), Some(Mood::Idle));
    }

    #[test]
    fn uncommitted_transition_is_offered_again() {
        let engine = MoodEngine::new();
        let c = counters(1, 9);
        assert_eq!(engine.transition(&c), Some(Mood::Stern));
        assert_eq!(engine.transition(&c), Some(Mood::Stern));
    }
}
