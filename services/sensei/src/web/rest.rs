//! services/sensei/src/web/rest.rs
//!
//! Contains the Axum handlers for the read-only REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use code_sensei_core::{
    domain::{Emotion, MoodState},
    mood::classify,
    status::status_text,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(status_handler, history_handler),
    components(schemas(StatusResponse, HistoryEntryResponse)),
    tags(
        (name = "Code Sensei API", description = "Read-only views of the mentoring session.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

/// A snapshot of the authorship counters and the mood they imply.
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub written_length: u64,
    pub pasted_length: u64,
    /// Hand-written share in `[0, 1]`; absent before any content exists.
    pub hand_written_ratio: Option<f64>,
    /// The text shown in the editor status bar; absent while hidden.
    pub status_text: Option<String>,
    /// `idle`, `happy` or `stern`; absent before any content exists.
    pub mood: Option<String>,
    pub panel_open: bool,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub snippet: String,
    pub explanation: String,
    pub score: Option<String>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Report the current authorship ratio and mood.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Current authorship status", body = StatusResponse)
    )
)]
pub async fn status_handler(State(app_state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let session = app_state.session.lock().await;
    let counters = session.tracker.counters();
    let mood = match classify(&counters) {
        MoodState::None => None,
        MoodState::Mood(mood) => Some(Emotion::from(mood).to_string()),
    };
    Json(StatusResponse {
        written_length: counters.written_length,
        pasted_length: counters.pasted_length,
        hand_written_ratio: counters.ratio(),
        status_text: status_text(&counters),
        mood,
        panel_open: session.panel_open(),
    })
}

/// List the graded explain and quiz cycles of this session, oldest first.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Learning history", body = [HistoryEntryResponse])
    )
)]
pub async fn history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<HistoryEntryResponse>> {
    let session = app_state.session.lock().await;
    let entries = session
        .history
        .entries()
        .iter()
        .map(|entry| HistoryEntryResponse {
            id: entry.id,
            snippet: entry.snippet.clone(),
            explanation: entry.explanation.clone(),
            score: entry.quiz_outcome.as_ref().map(|o| o.score.clone()),
            feedback: entry.quiz_outcome.as_ref().map(|o| o.feedback.clone()),
            created_at: entry.created_at,
        })
        .collect();
    Json(entries)
}
