//! crates/code_sensei_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// A snapshot of the two authorship counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorshipCounters {
    pub written_length: u64,
    pub pasted_length: u64,
}

impl AuthorshipCounters {
    pub fn total(&self) -> u64 {
        self.written_length + self.pasted_length
    }

    /// Hand-written share of all content, or `None` before any content exists.
    pub fn ratio(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.written_length as f64 / total as f64),
        }
    }
}

/// The mentor's discrete emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Idle,
    Happy,
    Stern,
}

/// The mood computed on a tick, including the "no data yet" pre-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodState {
    None,
    Mood(Mood),
}

/// The name of a pose category on disk. Usually a `Mood`, but may be the
/// `attentive` fallback once asset lookup has substituted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Idle,
    Happy,
    Stern,
    Attentive,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Idle => "idle",
            Emotion::Happy => "happy",
            Emotion::Stern => "stern",
            Emotion::Attentive => "attentive",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Mood> for Emotion {
    fn from(mood: Mood) -> Self {
        match mood {
            Mood::Idle => Emotion::Idle,
            Mood::Happy => Emotion::Happy,
            Mood::Stern => Emotion::Stern,
        }
    }
}

/// A pose image chosen for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pose {
    /// The emotion whose directory the image came from (after fallback).
    pub effective: Emotion,
    /// The image file name inside that emotion's directory.
    pub file_name: String,
}

impl Pose {
    /// A media-root-relative reference, e.g. `happy/happy_2.png`.
    pub fn reference(&self) -> String {
        format!("{}/{}", self.effective, self.file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    FillBlank,
    Coding,
}

/// A single quiz question generated from an explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub kind: QuestionKind,
    pub prompt: String,
    /// Present only for multiple-choice questions.
    pub options: Option<Vec<String>>,
    /// The reference answer, used as grading context.
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

/// The user's answers, keyed by question position.
pub type QuizAnswers = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: String,
    pub feedback: String,
}

/// One completed explain, quiz and grade cycle.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub snippet: String,
    pub explanation: String,
    pub quiz_outcome: Option<QuizOutcome>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub title: String,
    pub description: String,
}

/// A personalised study plan derived from the learning history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EducationPlan {
    pub topics_to_study: Vec<String>,
    pub assignments: Vec<Assignment>,
}

/// The explanation most recently delivered to the panel, kept as quiz context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explained {
    pub snippet: String,
    pub explanation: String,
}
