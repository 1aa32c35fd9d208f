//! services/sensei/src/adapters/assistant_llm.rs
//!
//! This module contains the adapter for the mentor's completion LLM.
//! It implements the `AssistantService` port from the `core` crate against any
//! OpenAI-compatible chat-completion endpoint (OpenRouter by default).

const EXPLAIN_INSTRUCTIONS: &str =
    "You are an expert programmer. Explain the following code snippet clearly and concisely.";

const QUIZ_INSTRUCTIONS: &str = r#"You are a quiz generation expert. Based on the provided code explanation, create a quiz with 3 questions (one multiple choice, one fill-in-the-blank, and one short coding challenge). Respond with ONLY a valid JSON object using this structure: {"questions": [{"type": "mcq" | "fill-in-the-blank" | "coding", "question": "...", "options": ["..."] | null, "answer": "..."}]}"#;

const GRADING_TEMPLATE: &str = r#"You are a teaching assistant. Grade the quiz based on the provided questions and user answers. Provide a score as a fraction (e.g., "2/3") and one sentence of encouraging feedback. Questions and Correct Answers: {questions} User's Answers: {answers} Respond in a JSON object with two keys: "score" and "feedback"."#;

const PLAN_TEMPLATE: &str = r#"You are an expert programming mentor. A student has been learning by pasting code, getting explanations, and taking quizzes.
Based on their learning history, generate a personalized education plan to help them upskill.

Analyze their performance and identify potential weak spots or areas for deeper study.

The plan should include:
1.  "topicsToStudy": An array of strings, with each string being a key concept or topic they should research.
2.  "assignments": An array of objects, where each object has a "title" (e.g., "Build a Small App") and a "description" of a practical coding assignment they can do to solidify their knowledge.

Respond with ONLY a valid JSON object with the keys "topicsToStudy" and "assignments".

---
STUDENT'S LEARNING HISTORY:
{history}
---"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use code_sensei_core::{
    domain::{
        Assignment, EducationPlan, HistoryEntry, QuestionKind, Quiz, QuizAnswers, QuizOutcome,
        QuizQuestion,
    },
    ports::{AssistantService, PortError, PortResult},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AssistantService` using an OpenAI-compatible LLM.
///
/// The API key can change at runtime, so a client is built per request.
#[derive(Clone)]
pub struct OpenAiAssistantAdapter {
    api_base: String,
    model: String,
    timeout: Duration,
}

impl OpenAiAssistantAdapter {
    /// Creates a new `OpenAiAssistantAdapter`.
    pub fn new(api_base: String, model: String, timeout: Duration) -> Self {
        Self {
            api_base,
            model,
            timeout,
        }
    }

    fn client(&self, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(&self.api_base)
            .with_api_key(api_key);
        Client::with_config(config)
    }

    /// Sends one chat completion and returns the text of the first choice.
    async fn complete(
        &self,
        api_key: &str,
        system: &str,
        user: Option<&str>,
        json_reply: bool,
    ) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];
        if let Some(user) = user {
            messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if json_reply {
            args.response_format(ResponseFormat::JsonObject);
        }
        let request = args
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let client = self.client(api_key);
        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| {
                PortError::Unexpected(format!(
                    "Completion request timed out after {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                PortError::Unexpected("Completion contained no text content.".to_string())
            })
    }
}

//=========================================================================================
// `AssistantService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AssistantService for OpenAiAssistantAdapter {
    /// Explains a pasted or selected snippet. A reply that arrives after
    /// cancellation is dropped.
    async fn explain(
        &self,
        api_key: &str,
        snippet: &str,
        cancel: CancellationToken,
    ) -> PortResult<String> {
        let user_input = format!("Explain this code:\n\n```\n{}\n```", snippet);
        let result = self
            .complete(api_key, EXPLAIN_INSTRUCTIONS, Some(&user_input), false)
            .await;

        if cancel.is_cancelled() {
            info!("Explanation arrived after cancellation; discarding it.");
            return Err(PortError::Cancelled);
        }
        result.map_err(|e| {
            error!("Explanation request failed: {}", e);
            e
        })
    }

    async fn generate_quiz(&self, api_key: &str, explanation: &str) -> PortResult<Quiz> {
        let raw = self
            .complete(api_key, QUIZ_INSTRUCTIONS, Some(explanation), true)
            .await?;
        parse_quiz(&raw)
    }

    async fn grade_quiz(
        &self,
        api_key: &str,
        questions: &[QuizQuestion],
        answers: &QuizAnswers,
    ) -> PortResult<QuizOutcome> {
        let prompt = grading_prompt(questions, answers)?;
        let raw = self.complete(api_key, &prompt, None, true).await?;
        parse_outcome(&raw)
    }

    async fn generate_plan(
        &self,
        api_key: &str,
        history: &[HistoryEntry],
    ) -> PortResult<EducationPlan> {
        let prompt = PLAN_TEMPLATE.replace("{history}", &summarize_history(history));
        let raw = self.complete(api_key, &prompt, None, true).await?;
        parse_plan(&raw)
    }
}

//=========================================================================================
// Wire Records for Structured Replies
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
enum QuestionKindRecord {
    #[serde(rename = "mcq", alias = "multipleChoice", alias = "multiple-choice")]
    Mcq,
    #[serde(rename = "fill-in-the-blank", alias = "fillBlank", alias = "fill-blank")]
    FillInTheBlank,
    #[serde(rename = "coding")]
    Coding,
}

#[derive(Serialize, Deserialize, Debug)]
struct QuestionRecord {
    #[serde(rename = "type")]
    kind: QuestionKindRecord,
    question: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    answer: Option<String>,
}

impl QuestionRecord {
    fn to_domain(self) -> PortResult<QuizQuestion> {
        let kind = match self.kind {
            QuestionKindRecord::Mcq => QuestionKind::MultipleChoice,
            QuestionKindRecord::FillInTheBlank => QuestionKind::FillBlank,
            QuestionKindRecord::Coding => QuestionKind::Coding,
        };
        let options = match kind {
            QuestionKind::MultipleChoice => match self.options {
                Some(options) if !options.is_empty() => Some(options),
                _ => {
                    return Err(PortError::Malformed(
                        "multiple-choice question without options".to_string(),
                    ))
                }
            },
            _ => None,
        };
        Ok(QuizQuestion {
            kind,
            prompt: self.question,
            options,
            answer: self.answer,
        })
    }

    fn from_domain(question: &QuizQuestion) -> Self {
        let kind = match question.kind {
            QuestionKind::MultipleChoice => QuestionKindRecord::Mcq,
            QuestionKind::FillBlank => QuestionKindRecord::FillInTheBlank,
            QuestionKind::Coding => QuestionKindRecord::Coding,
        };
        Self {
            kind,
            question: question.prompt.clone(),
            options: question.options.clone(),
            answer: question.answer.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct QuizRecord {
    questions: Vec<QuestionRecord>,
}

#[derive(Deserialize, Debug)]
struct OutcomeRecord {
    score: String,
    feedback: String,
}

#[derive(Deserialize, Debug)]
struct AssignmentRecord {
    title: String,
    description: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlanRecord {
    topics_to_study: Vec<String>,
    assignments: Vec<AssignmentRecord>,
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> PortResult<T> {
    serde_json::from_str(raw.trim()).map_err(|e| {
        error!("Could not parse {} reply: {}", what, e);
        PortError::Malformed(format!("{}: {}", what, e))
    })
}

fn parse_quiz(raw: &str) -> PortResult<Quiz> {
    let record: QuizRecord = parse_json(raw, "quiz")?;
    if record.questions.is_empty() {
        return Err(PortError::Malformed("quiz has no questions".to_string()));
    }
    let questions = record
        .questions
        .into_iter()
        .map(QuestionRecord::to_domain)
        .collect::<PortResult<Vec<_>>>()?;
    Ok(Quiz { questions })
}

fn parse_outcome(raw: &str) -> PortResult<QuizOutcome> {
    let record: OutcomeRecord = parse_json(raw, "grading")?;
    Ok(QuizOutcome {
        score: record.score,
        feedback: record.feedback,
    })
}

fn parse_plan(raw: &str) -> PortResult<EducationPlan> {
    let record: PlanRecord = parse_json(raw, "education plan")?;
    Ok(EducationPlan {
        topics_to_study: record.topics_to_study,
        assignments: record
            .assignments
            .into_iter()
            .map(|a| Assignment {
                title: a.title,
                description: a.description,
            })
            .collect(),
    })
}

fn grading_prompt(questions: &[QuizQuestion], answers: &QuizAnswers) -> PortResult<String> {
    let records: Vec<QuestionRecord> = questions.iter().map(QuestionRecord::from_domain).collect();
    let questions_json = serde_json::to_string_pretty(&records)
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let answers_json =
        serde_json::to_string_pretty(answers).map_err(|e| PortError::Unexpected(e.to_string()))?;
    Ok(GRADING_TEMPLATE
        .replace("{questions}", &questions_json)
        .replace("{answers}", &answers_json))
}

/// Renders the learning history into the plan prompt's history block.
fn summarize_history(history: &[HistoryEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            let topic: String = entry.snippet.chars().take(50).collect();
            let (score, feedback) = match &entry.quiz_outcome {
                Some(outcome) => (outcome.score.as_str(), outcome.feedback.as_str()),
                None => ("n/a", "n/a"),
            };
            format!(
                "Topic: Code Explanation ({}...)\nQuiz Score: {}\nFeedback: {}",
                topic, score, feedback
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn quiz_reply_maps_wire_kinds() {
        let raw = r#"{"questions": [
            {"type": "mcq", "question": "What is returned?", "options": ["1", "2"], "answer": "2"},
            {"type": "fill-in-the-blank", "question": "A ___ borrows.", "options": null, "answer": "reference"},
            {"type": "coding", "question": "Write a loop.", "options": ["ignored"]}
        ]}"#;

        let quiz = parse_quiz(raw).unwrap();
        assert_eq!(quiz.questions.len(), 3);
        assert_eq!(quiz.questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(
            quiz.questions[0].options,
            Some(vec!["1".to_string(), "2".to_string()])
        );
        assert_eq!(quiz.questions[1].kind, QuestionKind::FillBlank);
        assert_eq!(quiz.questions[1].answer.as_deref(), Some("reference"));
        assert_eq!(quiz.questions[2].kind, QuestionKind::Coding);
        assert_eq!(quiz.questions[2].options, None);
    }

    #[test]
    fn malformed_structured_replies_are_errors() {
        assert!(matches!(parse_quiz("not json"), Err(PortError::Malformed(_))));
        assert!(matches!(parse_quiz("{}"), Err(PortError::Malformed(_))));
        assert!(matches!(
            parse_quiz(r#"{"questions": []}"#),
            Err(PortError::Malformed(_))
        ));
        assert!(matches!(
            parse_quiz(r#"{"questions": [{"type": "mcq", "question": "?"}]}"#),
            Err(PortError::Malformed(_))
        ));
        assert!(matches!(
            parse_outcome(r#"{"score": "2/3"}"#),
            Err(PortError::Malformed(_))
        ));
        assert!(matches!(parse_plan("null"), Err(PortError::Malformed(_))));
        assert!(matches!(
            parse_plan(r#"{"topicsToStudy": ["x"]}"#),
            Err(PortError::Malformed(_))
        ));
    }

    #[test]
    fn plan_reply_uses_camel_case_keys() {
        let raw = r#"
            {"topicsToStudy": ["ownership", "lifetimes"],
             "assignments": [{"title": "Build a CLI", "description": "Parse args."}]}
        "#;
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.topics_to_study, vec!["ownership", "lifetimes"]);
        assert_eq!(
            plan.assignments,
            vec![Assignment {
                title: "Build a CLI".to_string(),
                description: "Parse args.".to_string(),
            }]
        );
    }

    #[test]
    fn history_summary_truncates_snippet_to_fifty_chars() {
        let snippet = "x".repeat(80);
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            snippet,
            explanation: "long".to_string(),
            quiz_outcome: Some(QuizOutcome {
                score: "3/3".to_string(),
                feedback: "Great".to_string(),
            }),
            created_at: Utc::now(),
        };
        let summary = summarize_history(&[entry]);
        assert_eq!(
            summary,
            format!(
                "Topic: Code Explanation ({}...)\nQuiz Score: 3/3\nFeedback: Great",
                "x".repeat(50)
            )
        );
    }

    #[test]
    fn grading_prompt_embeds_questions_and_answers() {
        let questions = vec![QuizQuestion {
            kind: QuestionKind::FillBlank,
            prompt: "Rust's ___ checker".to_string(),
            options: None,
            answer: Some("borrow".to_string()),
        }];
        let prompt = grading_prompt(&questions, &vec!["borrow".to_string()]).unwrap();
        assert!(prompt.contains("\"type\": \"fill-in-the-blank\""));
        assert!(prompt.contains("Rust's ___ checker"));
        assert!(prompt.contains("User's Answers: [\n  \"borrow\"\n]"));
    }
}
