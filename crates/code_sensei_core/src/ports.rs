//! crates/code_sensei_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the completion API, the secret store and the media layout.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    EducationPlan, Emotion, HistoryEntry, Pose, Quiz, QuizAnswers, QuizOutcome, QuizQuestion,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Malformed reply: {0}")]
    Malformed(String),
    #[error("The operation was cancelled")]
    Cancelled,
    #[error("No API key available")]
    MissingCredential,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The four request shapes issued against the external completion service.
///
/// Every failure (transport, non-2xx, unparseable reply) is an `Err`; adapters
/// never substitute a default value for a reply they could not parse.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Explains a code snippet in free text.
    ///
    /// If `cancel` is triggered while the call is in flight, the reply is
    /// discarded and `PortError::Cancelled` is returned.
    async fn explain(
        &self,
        api_key: &str,
        snippet: &str,
        cancel: CancellationToken,
    ) -> PortResult<String>;

    /// Generates a quiz from an explanation.
    async fn generate_quiz(&self, api_key: &str, explanation: &str) -> PortResult<Quiz>;

    /// Grades the user's answers against the questions they were asked.
    async fn grade_quiz(
        &self,
        api_key: &str,
        questions: &[QuizQuestion],
        answers: &QuizAnswers,
    ) -> PortResult<QuizOutcome>;

    /// Generates a study plan from the session's learning history.
    async fn generate_plan(
        &self,
        api_key: &str,
        history: &[HistoryEntry],
    ) -> PortResult<EducationPlan>;
}

/// A key-value secret store addressed by string keys.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;
    async fn delete(&self, key: &str) -> PortResult<()>;
}

/// Chooses a pose image for an emotion.
pub trait PoseCatalog: Send + Sync {
    /// Picks an image tagged with `emotion`, falling back to `attentive` when
    /// none exist. Fails with `NotFound` when the fallback is empty too.
    fn pick(&self, emotion: Emotion) -> PortResult<Pose>;
}
