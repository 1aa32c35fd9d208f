//! crates/code_sensei_core/src/history.rs
//!
//! The session's append-only log of completed explain, quiz and grade cycles.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Explained, HistoryEntry, QuizOutcome};

#[derive(Debug, Default)]
pub struct LearningHistory {
    entries: Vec<HistoryEntry>,
}

impl LearningHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a graded cycle and returns the stored entry.
    pub fn record(&mut self, explained: &Explained, outcome: QuizOutcome) -> &HistoryEntry {
        self.entries.push(HistoryEntry {
            id: Uuid::new_v4(),
            snippet: explained.snippet.clone(),
            explanation: explained.explanation.clone(),
            quiz_outcome: Some(outcome),
            created_at: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
