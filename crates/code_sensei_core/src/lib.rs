pub mod domain;
pub mod history;
pub mod mood;
pub mod ports;
pub mod status;
pub mod tracker;

pub use domain::{
    Assignment, AuthorshipCounters, EducationPlan, Emotion, Explained, HistoryEntry, Mood,
    MoodState, Pose, QuestionKind, Quiz, QuizAnswers, QuizOutcome, QuizQuestion,
};
pub use history::LearningHistory;
pub use mood::{classify, MoodEngine};
pub use ports::{AssistantService, PortError, PortResult, PoseCatalog, SecretStore};
pub use status::status_text;
pub use tracker::{AuthorshipTracker, ChangeReason};
