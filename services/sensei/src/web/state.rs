//! services/sensei/src/web/state.rs
//!
//! Defines the application's shared state and the single mentoring session the
//! process owns.

use crate::config::Config;
use crate::web::protocol::{HostMessage, NoticeLevel, PanelMessage};
use code_sensei_core::{
    domain::{Explained, Quiz},
    history::LearningHistory,
    mood::MoodEngine,
    ports::{AssistantService, PoseCatalog, SecretStore},
    tracker::AuthorshipTracker,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc::UnboundedSender, oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assistant: Arc<dyn AssistantService>,
    pub secrets: Arc<dyn SecretStore>,
    pub poses: Arc<dyn PoseCatalog>,
    /// The one session this process serves.
    pub session: Arc<Mutex<SessionState>>,
}

//=========================================================================================
// SessionState (Process-wide mentoring session)
//=========================================================================================

/// A generated quiz together with the explanation it was generated from.
#[derive(Debug, Clone)]
pub struct PendingQuiz {
    pub quiz: Quiz,
    pub source: Explained,
}

/// Result of attaching a panel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAttach {
    /// No live panel existed; this connection is now the panel.
    Created,
    /// A live panel already exists and was asked to come to the front.
    Focused,
}

/// All mutable state of the mentoring session.
#[derive(Default)]
pub struct SessionState {
    pub tracker: AuthorshipTracker,
    pub mood: MoodEngine,
    pub history: LearningHistory,
    /// The explanation most recently shown, used as quiz context.
    pub last_explained: Option<Explained>,
    /// The question set awaiting grading.
    pub pending_quiz: Option<PendingQuiz>,
    /// Cancel tokens of the paste explanations still in flight, by request id.
    explanations: BTreeMap<u64, CancellationToken>,
    next_explanation: u64,
    /// Actions parked until the user answers the API key prompt.
    key_waiters: Vec<oneshot::Sender<Option<String>>>,
    panel: Option<UnboundedSender<PanelMessage>>,
    host: Option<UnboundedSender<HostMessage>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Panel (display surface) ---

    pub fn panel_open(&self) -> bool {
        self.panel.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Registers a panel connection. A second live panel is never created: the
    /// existing one is revealed instead.
    pub fn attach_panel(&mut self, tx: UnboundedSender<PanelMessage>) -> PanelAttach {
        if self.panel_open() {
            self.send_panel(PanelMessage::Reveal);
            return PanelAttach::Focused;
        }
        self.panel = Some(tx);
        // A fresh panel shows no emotion yet, so the next tick must emit one.
        self.mood = MoodEngine::new();
        PanelAttach::Created
    }

    /// Drops the panel sender if it belongs to the connection that is closing.
    pub fn detach_panel(&mut self, tx: &UnboundedSender<PanelMessage>) {
        if self.panel.as_ref().is_some_and(|p| p.same_channel(tx)) {
            self.panel = None;
        }
    }

    /// Pushes a message to the panel. Returns `false` if no panel is listening.
    pub fn send_panel(&self, msg: PanelMessage) -> bool {
        match &self.panel {
            Some(tx) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Handles an idempotent "show panel" request.
    pub fn show_panel(&self) -> PanelAttach {
        if self.panel_open() {
            self.send_panel(PanelMessage::Reveal);
            PanelAttach::Focused
        } else {
            self.send_host(HostMessage::OpenPanel);
            PanelAttach::Created
        }
    }

    //--- Editor host ---

    /// Registers the editor host connection, replacing any previous one.
    pub fn attach_host(&mut self, tx: UnboundedSender<HostMessage>) {
        if self.host.is_some() {
            info!("Replacing previous editor host connection.");
        }
        self.host = Some(tx);
    }

    pub fn detach_host(&mut self, tx: &UnboundedSender<HostMessage>) {
        if self.host.as_ref().is_some_and(|h| h.same_channel(tx)) {
            self.host = None;
        }
    }

    pub fn send_host(&self, msg: HostMessage) -> bool {
        match &self.host {
            Some(tx) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Surfaces a one-line notice to the user through the editor.
    pub fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!("Notice: {}", message),
            NoticeLevel::Error => error!("Notice: {}", message),
        }
        let delivered = self.send_host(HostMessage::Notice {
            level,
            message: message.to_string(),
        });
        if !delivered {
            warn!("No editor host connected; notice was not shown.");
        }
    }

    //--- Paste explanations ---

    /// Registers a new paste explanation. The flag is `true` when no other
    /// explanation was in flight, i.e. the progress indicator must be shown.
    pub fn begin_explanation(&mut self) -> (u64, CancellationToken, bool) {
        let first = self.explanations.is_empty();
        let id = self.next_explanation;
        self.next_explanation += 1;
        let token = CancellationToken::new();
        self.explanations.insert(id, token.clone());
        (id, token, first)
    }

    /// Forgets a finished explanation. Returns `true` when it was the last one.
    pub fn finish_explanation(&mut self, id: u64) -> bool {
        self.explanations.remove(&id);
        self.explanations.is_empty()
    }

    /// Cancels every explanation in flight and returns how many there were.
    pub fn cancel_explanations(&self) -> usize {
        for token in self.explanations.values() {
            token.cancel();
        }
        self.explanations.len()
    }

    pub fn explanations_in_flight(&self) -> usize {
        self.explanations.len()
    }

    //--- API key prompt ---

    /// Parks an action until the prompt is answered. The flag is `true` when
    /// no prompt is showing yet and one must be sent.
    pub fn wait_for_api_key(&mut self) -> (oneshot::Receiver<Option<String>>, bool) {
        self.key_waiters.retain(|tx| !tx.is_closed());
        let first = self.key_waiters.is_empty();
        let (tx, rx) = oneshot::channel();
        self.key_waiters.push(tx);
        (rx, first)
    }

    /// Wakes every parked action with the user's answer; `None` aborts them.
    pub fn answer_api_key_prompt(&mut self, key: Option<&str>) -> usize {
        let mut woken = 0;
        for tx in self.key_waiters.drain(..) {
            if tx.send(key.map(str::to_string)).is_ok() {
                woken += 1;
            }
        }
        woken
    }

    pub fn progress(&self, title: &str, cancellable: bool, active: bool) {
        self.send_host(HostMessage::Progress {
            title: title.to_string(),
            cancellable,
            active,
        });
    }
}
