pub mod mood_task;
pub mod panel;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;

pub use mood_task::mood_process;
pub use rest::{history_handler, status_handler};
pub use state::{AppState, SessionState};
pub use ws_handler::{host_ws_handler, panel_ws_handler};

/// Builds the service router: both WebSocket channels, the REST views and the
/// pose images under `/media`.
pub fn router(app_state: Arc<AppState>) -> Router {
    let media = ServeDir::new(app_state.config.media_root.clone());
    Router::new()
        .route("/host", get(host_ws_handler))
        .route("/panel", get(panel_ws_handler))
        .route("/status", get(status_handler))
        .route("/history", get(history_handler))
        .nest_service("/media", media)
        .with_state(app_state)
}
