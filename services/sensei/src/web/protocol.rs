//! services/sensei/src/web/protocol.rs
//!
//! Defines the two WebSocket message protocols the service speaks: one with the
//! editor host (document changes, pastes, notices) and one with the mentor panel
//! (explanations, quizzes, plans, emotions).

use code_sensei_core::{
    domain::{EducationPlan, QuestionKind, Quiz, QuizOutcome},
    tracker::ChangeReason,
};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Editor Host TO the Service
//=========================================================================================

/// The reason tag the editor attaches to a document change.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChangeReasonTag {
    Edit,
    Undo,
    Redo,
}

impl From<ChangeReasonTag> for ChangeReason {
    fn from(tag: ChangeReasonTag) -> Self {
        match tag {
            ChangeReasonTag::Edit => ChangeReason::Edit,
            ChangeReasonTag::Undo => ChangeReason::Undo,
            ChangeReasonTag::Redo => ChangeReason::Redo,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TextChange {
    pub text: String,
}

/// Represents the structured messages the editor host can send to the service.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    /// A document changed. Undo/redo changes carry their reason tag.
    DocumentChanged {
        #[serde(default = "default_reason")]
        reason: ChangeReasonTag,
        changes: Vec<TextChange>,
    },

    /// The paste interceptor is about to replace the selection with clipboard text.
    /// Changes reported until `Pasted` are not counted as hand-written.
    PasteStarted,

    /// The paste interceptor finished its edit with this clipboard text.
    Pasted { text: String },

    /// The user cancelled the explanation progress notification.
    CancelExplanation,

    /// Show (or focus) the mentor panel.
    ShowPanel,

    /// The user answered the API key prompt, or set a key unprompted.
    SetApiKey { key: String },

    /// The user closed the API key prompt without answering.
    PromptDismissed,

    /// Forget the stored API key.
    ClearApiKey,
}

fn default_reason() -> ChangeReasonTag {
    ChangeReasonTag::Edit
}

//=========================================================================================
// Messages Sent FROM the Service TO the Editor Host
//=========================================================================================

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Represents the structured messages the service can send to the editor host.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// A one-line notification for the user.
    Notice { level: NoticeLevel, message: String },

    /// Starts (`active: true`) or ends a progress notification.
    Progress {
        title: String,
        cancellable: bool,
        active: bool,
    },

    /// Ask the user for their API key; the answer comes back as `SetApiKey`.
    PromptApiKey { prompt: String, placeholder: String },

    /// Ask the editor to open the mentor panel.
    OpenPanel,

    /// Status-bar text; `None` hides the item.
    StatusBar { text: Option<String> },
}

//=========================================================================================
// Messages Sent FROM the Panel TO the Service
//=========================================================================================

/// Represents the actions the mentor panel can request.
#[derive(Deserialize, Debug)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelRequest {
    ExplainSelectedCode { code: String },
    StartQuiz,
    SubmitQuiz { answers: Vec<String> },
    GenerateEducationPlan,
}

//=========================================================================================
// Messages Sent FROM the Service TO the Panel
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QuestionView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub question: String,
    pub options: Option<Vec<String>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QuizView {
    pub questions: Vec<QuestionView>,
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        let questions = quiz
            .questions
            .iter()
            .map(|q| QuestionView {
                kind: match q.kind {
                    QuestionKind::MultipleChoice => "mcq",
                    QuestionKind::FillBlank => "fill-in-the-blank",
                    QuestionKind::Coding => "coding",
                },
                question: q.prompt.clone(),
                options: q.options.clone(),
            })
            .collect();
        Self { questions }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutcomeView {
    pub score: String,
    pub feedback: String,
}

impl From<&QuizOutcome> for OutcomeView {
    fn from(outcome: &QuizOutcome) -> Self {
        Self {
            score: outcome.score.clone(),
            feedback: outcome.feedback.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AssignmentView {
    pub title: String,
    pub description: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub topics_to_study: Vec<String>,
    pub assignments: Vec<AssignmentView>,
}

impl From<&EducationPlan> for PlanView {
    fn from(plan: &EducationPlan) -> Self {
        Self {
            topics_to_study: plan.topics_to_study.clone(),
            assignments: plan
                .assignments
                .iter()
                .map(|a| AssignmentView {
                    title: a.title.clone(),
                    description: a.description.clone(),
                })
                .collect(),
        }
    }
}

/// Represents the messages the service can push to the mentor panel.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    ShowExplanation { data: String },
    StartQuiz { data: QuizView },
    ShowQuizResult { data: OutcomeView },
    ShowEducationPlan { data: PlanView },
    /// `image` is a URL path the panel can load directly.
    SetEmotion { image: String, emotion: String },
    /// Bring the existing panel to the front.
    Reveal,
}
