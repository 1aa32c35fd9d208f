// tests/common/mod.rs
//
// In-memory fakes for the core ports and a helper that wires them into an
// `AppState` with captured host and panel channels.

#![allow(dead_code)]

use async_trait::async_trait;
use code_sensei_core::{
    domain::{
        Assignment, EducationPlan, Emotion, HistoryEntry, Pose, QuestionKind, Quiz, QuizAnswers,
        QuizOutcome, QuizQuestion,
    },
    ports::{AssistantService, PortError, PortResult, PoseCatalog, SecretStore},
};
use sensei_lib::{
    adapters::API_KEY_SECRET,
    config::Config,
    web::{
        protocol::{HostMessage, PanelMessage},
        AppState, SessionState,
    },
};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(2);

//=========================================================================================
// Assistant
//=========================================================================================

/// Holds explain calls in flight until the test releases them.
#[derive(Clone)]
pub struct ExplainGate {
    started: Arc<Semaphore>,
    release: Arc<Semaphore>,
}

impl ExplainGate {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Semaphore::new(0)),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    /// Waits until one more explain call has reached the assistant.
    pub async fn wait_started(&self) {
        timeout(WAIT, self.started.acquire())
            .await
            .expect("explain call never started")
            .unwrap()
            .forget();
    }

    pub fn release(&self, calls: usize) {
        self.release.add_permits(calls);
    }
}

/// Replies with canned values; a `None` reply behaves like an unparseable one.
#[derive(Default)]
pub struct FakeAssistant {
    pub explanation: Option<String>,
    pub quiz: Option<Quiz>,
    pub outcome: Option<QuizOutcome>,
    pub plan: Option<EducationPlan>,
    /// Simulates the user cancelling while the explain call is in flight.
    pub cancel_during_explain: bool,
    /// Replies `explains <snippet>` instead of the canned explanation.
    pub echo_snippet: bool,
    pub gate: Option<ExplainGate>,
    pub explain_calls: AtomicUsize,
    pub quiz_calls: AtomicUsize,
    pub grade_calls: AtomicUsize,
    pub plan_calls: AtomicUsize,
    pub last_plan_history_len: AtomicUsize,
    pub last_graded_answers: StdMutex<Vec<String>>,
}

impl FakeAssistant {
    pub fn happy_path() -> Self {
        Self {
            explanation: Some("It adds two numbers.".to_string()),
            quiz: Some(sample_quiz()),
            outcome: Some(QuizOutcome {
                score: "2/3".to_string(),
                feedback: "Nice work, keep going!".to_string(),
            }),
            plan: Some(EducationPlan {
                topics_to_study: vec!["integer overflow".to_string()],
                assignments: vec![Assignment {
                    title: "Build a calculator".to_string(),
                    description: "Support + - * /.".to_string(),
                }],
            }),
            ..Default::default()
        }
    }
}

fn malformed(what: &str) -> PortError {
    PortError::Malformed(format!("{what}: expected value at line 1 column 1"))
}

#[async_trait]
impl AssistantService for FakeAssistant {
    async fn explain(
        &self,
        _api_key: &str,
        snippet: &str,
        cancel: CancellationToken,
    ) -> PortResult<String> {
        self.explain_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.started.add_permits(1);
            gate.release
                .acquire()
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .forget();
        }
        if self.cancel_during_explain {
            cancel.cancel();
        }
        if self.echo_snippet {
            return Ok(format!("explains {snippet}"));
        }
        self.explanation
            .clone()
            .ok_or_else(|| PortError::Unexpected("503 Service Unavailable".to_string()))
    }

    async fn generate_quiz(&self, _api_key: &str, _explanation: &str) -> PortResult<Quiz> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        self.quiz.clone().ok_or_else(|| malformed("quiz"))
    }

    async fn grade_quiz(
        &self,
        _api_key: &str,
        _questions: &[QuizQuestion],
        answers: &QuizAnswers,
    ) -> PortResult<QuizOutcome> {
        self.grade_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_graded_answers.lock().unwrap() = answers.clone();
        self.outcome.clone().ok_or_else(|| malformed("grading"))
    }

    async fn generate_plan(
        &self,
        _api_key: &str,
        history: &[HistoryEntry],
    ) -> PortResult<EducationPlan> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        self.last_plan_history_len
            .store(history.len(), Ordering::SeqCst);
        self.plan.clone().ok_or_else(|| malformed("education plan"))
    }
}

pub fn sample_quiz() -> Quiz {
    Quiz {
        questions: vec![
            QuizQuestion {
                kind: QuestionKind::MultipleChoice,
                prompt: "What does add(2, 2) return?".to_string(),
                options: Some(vec!["3".to_string(), "4".to_string()]),
                answer: Some("4".to_string()),
            },
            QuizQuestion {
                kind: QuestionKind::FillBlank,
                prompt: "The function's name is ___.".to_string(),
                options: None,
                answer: Some("add".to_string()),
            },
            QuizQuestion {
                kind: QuestionKind::Coding,
                prompt: "Write sub(a, b).".to_string(),
                options: None,
                answer: None,
            },
        ],
    }
}

//=========================================================================================
// Secrets
//=========================================================================================

#[derive(Default)]
pub struct InMemorySecrets {
    values: StdMutex<HashMap<String, String>>,
}

impl InMemorySecrets {
    pub fn with_api_key(key: &str) -> Self {
        let store = Self::default();
        store
            .values
            .lock()
            .unwrap()
            .insert(API_KEY_SECRET.to_string(), key.to_string());
        store
    }
}

#[async_trait]
impl SecretStore for InMemorySecrets {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

//=========================================================================================
// Poses
//=========================================================================================

/// Serves `<emotion>.png` for each emotion it has, with the usual fallback.
pub struct FakePoses {
    available: HashSet<Emotion>,
}

impl FakePoses {
    pub fn with(emotions: &[Emotion]) -> Self {
        Self {
            available: emotions.iter().copied().collect(),
        }
    }

    pub fn all() -> Self {
        Self::with(&[
            Emotion::Idle,
            Emotion::Happy,
            Emotion::Stern,
            Emotion::Attentive,
        ])
    }
}

impl PoseCatalog for FakePoses {
    fn pick(&self, emotion: Emotion) -> PortResult<Pose> {
        let effective = if self.available.contains(&emotion) {
            emotion
        } else if self.available.contains(&Emotion::Attentive) {
            Emotion::Attentive
        } else {
            return Err(PortError::NotFound("no poses".to_string()));
        };
        Ok(Pose {
            effective,
            file_name: format!("{effective}.png"),
        })
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::DEBUG,
        assistant_api_base: "http://127.0.0.1:9/v1".to_string(),
        assistant_model: "test-model".to_string(),
        assistant_timeout: Duration::from_secs(1),
        api_key_prompt_timeout: Duration::from_millis(100),
        media_root: PathBuf::from("./media/default_skin"),
        secrets_path: PathBuf::from("./unused-secrets.json"),
        mood_tick: Duration::from_millis(10),
        pose_seed: Some(0),
    }
}

pub struct Harness {
    pub app_state: Arc<AppState>,
    pub assistant: Arc<FakeAssistant>,
    pub host_rx: UnboundedReceiver<HostMessage>,
    pub panel_rx: UnboundedReceiver<PanelMessage>,
}

impl Harness {
    pub async fn new(
        assistant: FakeAssistant,
        secrets: InMemorySecrets,
        poses: FakePoses,
    ) -> Self {
        Self::with_config(assistant, secrets, poses, test_config()).await
    }

    pub async fn with_config(
        assistant: FakeAssistant,
        secrets: InMemorySecrets,
        poses: FakePoses,
        config: Config,
    ) -> Self {
        let assistant = Arc::new(assistant);
        let app_state = Arc::new(AppState {
            config: Arc::new(config),
            assistant: assistant.clone(),
            secrets: Arc::new(secrets),
            poses: Arc::new(poses),
            session: Arc::new(Mutex::new(SessionState::new())),
        });

        let (host_tx, host_rx) = unbounded_channel();
        let (panel_tx, panel_rx) = unbounded_channel();
        {
            let mut session = app_state.session.lock().await;
            session.attach_host(host_tx);
            session.attach_panel(panel_tx);
        }

        Self {
            app_state,
            assistant,
            host_rx,
            panel_rx,
        }
    }

    pub fn session(&self) -> &Arc<Mutex<SessionState>> {
        &self.app_state.session
    }

    pub fn drain_host(&mut self) -> Vec<HostMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.host_rx.try_recv() {
            out.push(msg);
        }
        out
    }

    pub fn drain_panel(&mut self) -> Vec<PanelMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.panel_rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Waits for the next host message matching `wanted`, skipping others.
    pub async fn next_host(&mut self, wanted: impl Fn(&HostMessage) -> bool) -> HostMessage {
        loop {
            let msg = timeout(WAIT, self.host_rx.recv())
                .await
                .expect("timed out waiting for a host message")
                .expect("host channel closed");
            if wanted(&msg) {
                return msg;
            }
        }
    }

    /// Waits until the paste explanation progress indicator is hidden.
    pub async fn explanation_settled(&mut self) {
        self.next_host(|msg| matches!(msg, HostMessage::Progress { active: false, .. }))
            .await;
    }

    pub async fn next_panel(&mut self) -> PanelMessage {
        timeout(WAIT, self.panel_rx.recv())
            .await
            .expect("timed out waiting for a panel message")
            .expect("panel channel closed")
    }

    /// Error notices sent to the editor host since the last drain.
    pub fn error_notices(&mut self) -> Vec<String> {
        self.drain_host()
            .into_iter()
            .filter_map(|msg| match msg {
                HostMessage::Notice {
                    level: sensei_lib::web::protocol::NoticeLevel::Error,
                    message,
                } => Some(message),
                _ => None,
            })
            .collect()
    }
}
