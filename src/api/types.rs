//! API request and response types

use crate::illustration::ImageHandle;
use crate::script::{Script, StepKind};
use crate::state_machine::{Message, OptionOrder, OptionSlot, Phase, Session};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const REREAD_LABEL: &str = "📖 Read the story again";
const REPEAT_LABEL: &str = "🔁 Repeat the question";

/// Request to answer the active question
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub choice: OptionSlot,
}

/// One presented answer option
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OptionView {
    pub slot: OptionSlot,
    pub text: String,
}

/// What the learner is being asked to do right now
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivePrompt {
    /// Single button to continue the story
    Action { label: String },
    /// Question with its options in presentation order
    Question {
        question_id: u32,
        text: String,
        options: Vec<OptionView>,
    },
    /// Picture being drawn; nothing to press
    Waiting { question_id: u32 },
    /// Wrong answer: reread the story or repeat the question
    Retry {
        question_id: u32,
        reread_label: String,
        repeat_label: String,
    },
    /// Closing text, if the script has one, and the restart button
    Finished { text: Option<String>, label: String },
}

impl ActivePrompt {
    pub fn for_session(script: &Script, session: &Session) -> Self {
        let step = script.step_at(session.cursor);
        match &session.phase {
            Phase::Narrating => ActivePrompt::Action {
                label: step
                    .and_then(|s| s.action_text())
                    .unwrap_or("Next")
                    .to_string(),
            },
            Phase::AwaitingAnswer { question_id, order } => {
                let (text, options) = match step.map(|s| (&s.text, &s.kind)) {
                    Some((text, StepKind::Question(q))) => {
                        let correct = q.correct.text.clone();
                        let wrong = q.wrong.text.clone();
                        let (first, second) = match order {
                            OptionOrder::CorrectFirst => (correct, wrong),
                            OptionOrder::CorrectSecond => (wrong, correct),
                        };
                        (
                            text.clone(),
                            vec![
                                OptionView {
                                    slot: OptionSlot::First,
                                    text: first,
                                },
                                OptionView {
                                    slot: OptionSlot::Second,
                                    text: second,
                                },
                            ],
                        )
                    }
                    _ => (String::new(), Vec::new()),
                };
                ActivePrompt::Question {
                    question_id: *question_id,
                    text,
                    options,
                }
            }
            Phase::AwaitingImage { question_id } => ActivePrompt::Waiting {
                question_id: *question_id,
            },
            Phase::OfferingRetry { question_id, .. } => ActivePrompt::Retry {
                question_id: *question_id,
                reread_label: REREAD_LABEL.to_string(),
                repeat_label: REPEAT_LABEL.to_string(),
            },
            Phase::Finished => ActivePrompt::Finished {
                text: step.map(|s| s.text.clone()),
                label: step
                    .and_then(|s| s.action_text())
                    .unwrap_or("Play Again")
                    .to_string(),
            },
        }
    }
}

/// Session snapshot as seen by presentation clients
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub phase: Phase,
    pub cursor: usize,
    pub answered_count: usize,
    pub total_questions: usize,
    pub transcript: Vec<Message>,
    pub images: BTreeMap<u32, ImageHandle>,
    pub prompt: ActivePrompt,
}

impl SessionView {
    pub fn new(session_id: &str, script: &Script, session: Session) -> Self {
        let prompt = ActivePrompt::for_session(script, &session);
        Self {
            session_id: session_id.to_string(),
            phase: session.phase,
            cursor: session.cursor,
            answered_count: session.answered_count,
            total_questions: script.total_questions(),
            transcript: session.transcript,
            images: session.image_by_question,
            prompt,
        }
    }
}

/// Response for the version endpoint
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
