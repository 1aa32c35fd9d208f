//! services/sensei/src/web/panel.rs
//!
//! The panel controller: routes editor host events and panel requests to the
//! tracker and the assistant, and pushes results back to the panel.
//!
//! The session lock is never held across an assistant call, so mood ticks and
//! editor changes keep flowing while a request is outstanding.

use crate::adapters::secrets::API_KEY_SECRET;
use crate::web::{
    protocol::{HostEvent, HostMessage, NoticeLevel, PanelMessage, PanelRequest},
    state::{AppState, PendingQuiz, SessionState},
};
use code_sensei_core::domain::Explained;
use code_sensei_core::ports::{PortError, PortResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const EXPLAIN_PROGRESS: &str = "Code Sensei: Generating explanation...";
const QUIZ_PROGRESS: &str = "Generating Quiz...";
const GRADE_PROGRESS: &str = "Grading your answers...";
const PLAN_PROGRESS: &str = "Code Sensei: Generating your education plan...";

//=========================================================================================
// Editor Host Events
//=========================================================================================

/// Applies one event from the editor host.
///
/// Paste explanations are spawned so that a later `CancelExplanation` or
/// API key answer on the same connection can still be received.
pub async fn handle_host_event(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    event: HostEvent,
) {
    match event {
        HostEvent::DocumentChanged { reason, changes } => {
            let mut session = session_state_lock.lock().await;
            for change in changes.iter().filter(|c| !c.text.is_empty()) {
                session.tracker.record_change(reason.into(), &change.text);
            }
        }
        HostEvent::PasteStarted => {
            session_state_lock.lock().await.tracker.begin_programmatic_edit();
        }
        HostEvent::Pasted { text } => {
            let counted = {
                let mut session = session_state_lock.lock().await;
                session.tracker.end_programmatic_edit();
                session.tracker.record_pasted(&text)
            };
            if !counted {
                info!("Ignoring blank paste.");
                return;
            }
            let app_state = app_state.clone();
            let session_state_lock = session_state_lock.clone();
            tokio::spawn(async move {
                explain_paste(&app_state, &session_state_lock, text).await;
            });
        }
        HostEvent::CancelExplanation => {
            match session_state_lock.lock().await.cancel_explanations() {
                0 => warn!("CancelExplanation received with no explanation in flight."),
                n => info!("{} explanation(s) cancelled by the user.", n),
            }
        }
        HostEvent::ShowPanel => {
            session_state_lock.lock().await.show_panel();
        }
        HostEvent::SetApiKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                let mut session = session_state_lock.lock().await;
                // Parked actions report the missing key themselves.
                if session.answer_api_key_prompt(None) == 0 {
                    session.notify(NoticeLevel::Error, "API Key not provided.");
                }
                return;
            }
            let stored = app_state.secrets.set(API_KEY_SECRET, key).await;
            let mut session = session_state_lock.lock().await;
            let woken = session.answer_api_key_prompt(Some(key));
            if woken > 0 {
                info!("API key received; resuming {} waiting action(s).", woken);
            }
            match stored {
                Ok(()) => session.notify(NoticeLevel::Info, "Code Sensei: API Key saved."),
                Err(e) => {
                    error!("Failed to store API key: {}", e);
                    session.notify(NoticeLevel::Error, "Code Sensei: Could not save the API Key.");
                }
            }
        }
        HostEvent::PromptDismissed => {
            let woken = session_state_lock.lock().await.answer_api_key_prompt(None);
            info!("API key prompt dismissed; abandoning {} waiting action(s).", woken);
        }
        HostEvent::ClearApiKey => {
            let cleared = app_state.secrets.delete(API_KEY_SECRET).await;
            let session = session_state_lock.lock().await;
            match cleared {
                Ok(()) => session.notify(
                    NoticeLevel::Info,
                    "Code Sensei: Stored API Key has been cleared.",
                ),
                Err(e) => {
                    error!("Failed to clear API key: {}", e);
                    session.notify(NoticeLevel::Error, "Code Sensei: Could not clear the API Key.");
                }
            }
        }
    }
}

//=========================================================================================
// Panel Requests
//=========================================================================================

/// Applies one request from the mentor panel.
pub async fn handle_panel_request(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    request: PanelRequest,
) {
    match request {
        PanelRequest::ExplainSelectedCode { code } => {
            explain_selection(app_state, session_state_lock, code).await
        }
        PanelRequest::StartQuiz => start_quiz(app_state, session_state_lock).await,
        PanelRequest::SubmitQuiz { answers } => {
            submit_quiz(app_state, session_state_lock, answers).await
        }
        PanelRequest::GenerateEducationPlan => {
            generate_plan(app_state, session_state_lock).await
        }
    }
}

//=========================================================================================
// Flows
//=========================================================================================

/// Looks up the API key, prompting the user when none is stored.
///
/// The caller waits for the answer up to the configured prompt timeout. A
/// dismissed, blank or unanswered prompt tells the user and yields
/// `PortError::MissingCredential`, abandoning the action.
pub async fn resolve_api_key(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
) -> PortResult<String> {
    let stored = match app_state.secrets.get(API_KEY_SECRET).await {
        Ok(stored) => stored,
        Err(e) => {
            error!("Failed to read API key: {}", e);
            session_state_lock
                .lock()
                .await
                .notify(NoticeLevel::Error, "Code Sensei: Could not read the stored API Key.");
            return Err(e);
        }
    };
    if let Some(key) = stored.filter(|key| !key.trim().is_empty()) {
        return Ok(key);
    }

    let answer = {
        let mut session = session_state_lock.lock().await;
        let (answer, needs_prompt) = session.wait_for_api_key();
        if needs_prompt {
            session.send_host(HostMessage::PromptApiKey {
                prompt: "Please enter your OpenRouter API Key".to_string(),
                placeholder: "sk-or-...".to_string(),
            });
        }
        answer
    };

    let key = match tokio::time::timeout(app_state.config.api_key_prompt_timeout, answer).await {
        Ok(Ok(key)) => key,
        Ok(Err(_)) => None,
        Err(_) => {
            warn!(
                "No answer to the API key prompt within {:?}.",
                app_state.config.api_key_prompt_timeout
            );
            None
        }
    };
    match key {
        Some(key) => Ok(key),
        None => {
            session_state_lock
                .lock()
                .await
                .notify(NoticeLevel::Error, "API Key not provided.");
            Err(PortError::MissingCredential)
        }
    }
}

/// Explains freshly pasted code and shows it in the panel.
pub async fn explain_paste(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    snippet: String,
) {
    let Ok(api_key) = resolve_api_key(app_state, session_state_lock).await else {
        return;
    };

    let (id, token) = {
        let mut session = session_state_lock.lock().await;
        if !session.panel_open() {
            session.show_panel();
        }
        let (id, token, first) = session.begin_explanation();
        if first {
            session.progress(EXPLAIN_PROGRESS, true, true);
        }
        (id, token)
    };

    let result = app_state
        .assistant
        .explain(&api_key, &snippet, token.clone())
        .await;

    let mut session = session_state_lock.lock().await;
    if session.finish_explanation(id) {
        session.progress(EXPLAIN_PROGRESS, true, false);
    }
    if token.is_cancelled() {
        info!("Discarding explanation for a cancelled request.");
        return;
    }

    match result {
        Err(PortError::Cancelled) => info!("Discarding explanation for a cancelled request."),
        Ok(explanation) if session.panel_open() => {
            info!("Explanation received. Sending to panel.");
            deliver_explanation(&mut session, snippet, explanation);
        }
        Ok(_) => {
            warn!("Explanation arrived but no panel is attached.");
            session.notify(
                NoticeLevel::Error,
                "Failed to get an explanation for the pasted code.",
            );
        }
        Err(e) => {
            error!("Explanation failed: {}", e);
            session.notify(
                NoticeLevel::Error,
                "Failed to get an explanation for the pasted code.",
            );
        }
    }
}

/// Explains code the user selected in the panel.
pub async fn explain_selection(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    code: String,
) {
    if code.trim().is_empty() {
        session_state_lock
            .lock()
            .await
            .notify(NoticeLevel::Info, "Select some code to explain first.");
        return;
    }
    let Ok(api_key) = resolve_api_key(app_state, session_state_lock).await else {
        return;
    };

    session_state_lock
        .lock()
        .await
        .progress(EXPLAIN_PROGRESS, false, true);
    let result = app_state
        .assistant
        .explain(&api_key, &code, CancellationToken::new())
        .await;

    let mut session = session_state_lock.lock().await;
    session.progress(EXPLAIN_PROGRESS, false, false);
    match result {
        Ok(explanation) => deliver_explanation(&mut session, code, explanation),
        Err(e) => {
            error!("Explanation failed: {}", e);
            session.notify(
                NoticeLevel::Error,
                "Failed to get an explanation for the selected code.",
            );
        }
    }
}

fn deliver_explanation(session: &mut SessionState, snippet: String, explanation: String) {
    session.send_panel(PanelMessage::ShowExplanation {
        data: explanation.clone(),
    });
    session.last_explained = Some(Explained {
        snippet,
        explanation,
    });
}

/// Generates a quiz from the last explanation and remembers it for grading.
pub async fn start_quiz(app_state: &Arc<AppState>, session_state_lock: &Arc<Mutex<SessionState>>) {
    let source = {
        let session = session_state_lock.lock().await;
        match &session.last_explained {
            Some(explained) => explained.clone(),
            None => {
                session.notify(
                    NoticeLevel::Error,
                    "No explanation available to generate a quiz from.",
                );
                return;
            }
        }
    };
    let Ok(api_key) = resolve_api_key(app_state, session_state_lock).await else {
        return;
    };

    session_state_lock.lock().await.progress(QUIZ_PROGRESS, false, true);
    let result = app_state
        .assistant
        .generate_quiz(&api_key, &source.explanation)
        .await;

    let mut session = session_state_lock.lock().await;
    session.progress(QUIZ_PROGRESS, false, false);
    match result {
        Ok(quiz) => {
            info!("Quiz generated with {} questions.", quiz.questions.len());
            session.send_panel(PanelMessage::StartQuiz {
                data: (&quiz).into(),
            });
            session.pending_quiz = Some(PendingQuiz { quiz, source });
        }
        Err(e) => {
            error!("Quiz generation failed: {}", e);
            session.notify(NoticeLevel::Error, "Could not generate a quiz.");
        }
    }
}

/// Grades the pending quiz and records the cycle in the learning history.
pub async fn submit_quiz(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    answers: Vec<String>,
) {
    let pending = {
        let session = session_state_lock.lock().await;
        match &session.pending_quiz {
            Some(pending) => pending.clone(),
            None => {
                warn!("SubmitQuiz received before any quiz was started.");
                session.notify(
                    NoticeLevel::Error,
                    "There is no quiz to grade. Start a quiz first.",
                );
                return;
            }
        }
    };
    let Ok(api_key) = resolve_api_key(app_state, session_state_lock).await else {
        return;
    };

    session_state_lock.lock().await.progress(GRADE_PROGRESS, false, true);
    let result = app_state
        .assistant
        .grade_quiz(&api_key, &pending.quiz.questions, &answers)
        .await;

    let mut session = session_state_lock.lock().await;
    session.progress(GRADE_PROGRESS, false, false);
    match result {
        Ok(outcome) => {
            info!("Quiz graded: {}", outcome.score);
            session.send_panel(PanelMessage::ShowQuizResult {
                data: (&outcome).into(),
            });
            session.history.record(&pending.source, outcome);
        }
        Err(e) => {
            error!("Quiz grading failed: {}", e);
            session.notify(NoticeLevel::Error, "Could not grade the quiz.");
        }
    }
}

/// Builds a study plan from everything graded so far.
pub async fn generate_plan(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
) {
    let Ok(api_key) = resolve_api_key(app_state, session_state_lock).await else {
        return;
    };
    let history = {
        let session = session_state_lock.lock().await;
        session.progress(PLAN_PROGRESS, false, true);
        session.history.entries().to_vec()
    };

    let result = app_state.assistant.generate_plan(&api_key, &history).await;

    let session = session_state_lock.lock().await;
    session.progress(PLAN_PROGRESS, false, false);
    match result {
        Ok(plan) => {
            session.send_panel(PanelMessage::ShowEducationPlan {
                data: (&plan).into(),
            });
        }
        Err(e) => {
            error!("Education plan generation failed: {}", e);
            session.notify(NoticeLevel::Error, "Could not generate an education plan.");
        }
    }
}
