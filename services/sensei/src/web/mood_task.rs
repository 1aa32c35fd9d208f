//! services/sensei/src/web/mood_task.rs
//!
//! This module contains the long-running "worker" that polls the authorship
//! counters, refreshes the status bar and drives the mentor's mood.

use crate::web::{
    protocol::{HostMessage, PanelMessage},
    state::{AppState, SessionState},
};
use code_sensei_core::{domain::Emotion, status::status_text};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs one mood tick per configured interval until cancelled.
pub async fn mood_process(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    cancellation_token: CancellationToken,
) {
    info!(
        "Mood process started (tick every {:?}).",
        app_state.config.mood_tick
    );
    let mut interval = tokio::time::interval(app_state.config.mood_tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Mood process cancelled.");
                return;
            }
            _ = interval.tick() => {
                mood_tick(&app_state, &session_state_lock).await;
            }
        }
    }
}

/// Evaluates the counters once.
///
/// The status bar is refreshed on every tick. A mood notification is only
/// pushed when a panel is attached and the mood changed; if no pose can be
/// found the tick is skipped and the change is offered again next time.
pub async fn mood_tick(app_state: &Arc<AppState>, session_state_lock: &Arc<Mutex<SessionState>>) {
    let transition = {
        let session = session_state_lock.lock().await;
        let counters = session.tracker.counters();
        session.send_host(HostMessage::StatusBar {
            text: status_text(&counters),
        });

        if !session.panel_open() {
            return;
        }
        session.mood.transition(&counters)
    };
    let Some(mood) = transition else {
        return;
    };

    let pose = match app_state.poses.pick(Emotion::from(mood)) {
        Ok(pose) => pose,
        Err(e) => {
            error!("Skipping mood update to {:?}: {}", mood, e);
            return;
        }
    };
    if pose.effective != Emotion::from(mood) {
        debug!("No '{}' poses; showing '{}' instead.", Emotion::from(mood), pose.effective);
    }

    let mut session = session_state_lock.lock().await;
    let sent = session.send_panel(PanelMessage::SetEmotion {
        image: format!("/media/{}", pose.reference()),
        emotion: pose.effective.to_string(),
    });
    if sent {
        info!("Mood changed to {:?} → {}", mood, pose.reference());
        session.mood.commit(mood);
    }
}
