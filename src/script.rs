//! Step script: the immutable story and question table a session walks through
//!
//! The script is plain data. It is validated once when loaded and never
//! mutated afterwards, so the state machine can stay generic over content.

mod mia;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub use mia::mia_story;

/// The option that earns an illustration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectOption {
    pub text: String,
    /// Prompt sent to the image provider when this option is chosen
    pub prompt: String,
    /// Bot reply shown alongside the illustration
    pub response: String,
}

/// The distractor option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrongOption {
    pub text: String,
    pub explanation: String,
}

/// A comprehension question with exactly two options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: u32,
    pub correct: CorrectOption,
    pub wrong: WrongOption,
}

/// Kind-specific payload of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Narration {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_text: Option<String>,
    },
    Question(Question),
    Closing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_text: Option<String>,
    },
}

/// One unit of the script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub text: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn narration(text: impl Into<String>, action_text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StepKind::Narration {
                action_text: Some(action_text.into()),
            },
        }
    }

    pub fn question(text: impl Into<String>, question: Question) -> Self {
        Self {
            text: text.into(),
            kind: StepKind::Question(question),
        }
    }

    pub fn closing(text: impl Into<String>, action_text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StepKind::Closing {
                action_text: Some(action_text.into()),
            },
        }
    }

    pub fn is_narration(&self) -> bool {
        matches!(self.kind, StepKind::Narration { .. })
    }

    pub fn as_question(&self) -> Option<&Question> {
        match &self.kind {
            StepKind::Question(q) => Some(q),
            _ => None,
        }
    }

    /// Button label for narration and closing steps
    pub fn action_text(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Narration { action_text } | StepKind::Closing { action_text } => {
                action_text.as_deref()
            }
            StepKind::Question(_) => None,
        }
    }
}

/// Reasons a script is rejected at load time
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script has no steps")]
    Empty,
    #[error("first step must be a narration step")]
    FirstStepNotNarration,
    #[error("question at step {index} has id 0; ids must be positive")]
    ZeroQuestionId { index: usize },
    #[error("question id {question_id} is used more than once")]
    DuplicateQuestionId { question_id: u32 },
    #[error("question {question_id} at step {index} has no narration step before it")]
    NoNarrationBefore { question_id: u32, index: usize },
    #[error("failed to read script file: {0}")]
    Io(String),
    #[error("failed to parse script file: {0}")]
    Parse(String),
}

/// Validated, read-only sequence of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
    total_questions: usize,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Result<Self, ScriptError> {
        validate(&steps)?;
        let total_questions = steps.iter().filter(|s| s.as_question().is_some()).count();
        Ok(Self {
            steps,
            total_questions,
        })
    }

    /// Load an operator-supplied script from a JSON array of steps
    pub fn from_json_file(path: &Path) -> Result<Self, ScriptError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ScriptError::Io(e.to_string()))?;
        let steps: Vec<Step> =
            serde_json::from_str(&raw).map_err(|e| ScriptError::Parse(e.to_string()))?;
        Self::new(steps)
    }

    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Index of the nearest narration step strictly before `index`
    pub fn retry_target(&self, index: usize) -> Option<usize> {
        self.steps
            .get(..index)?
            .iter()
            .rposition(Step::is_narration)
    }

    #[cfg(test)]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

fn validate(steps: &[Step]) -> Result<(), ScriptError> {
    let first = steps.first().ok_or(ScriptError::Empty)?;
    if !first.is_narration() {
        return Err(ScriptError::FirstStepNotNarration);
    }

    let mut seen_ids = HashSet::new();
    let mut seen_narration = false;
    for (index, step) in steps.iter().enumerate() {
        match &step.kind {
            StepKind::Narration { .. } => seen_narration = true,
            StepKind::Question(q) => {
                if q.question_id == 0 {
                    return Err(ScriptError::ZeroQuestionId { index });
                }
                if !seen_ids.insert(q.question_id) {
                    return Err(ScriptError::DuplicateQuestionId {
                        question_id: q.question_id,
                    });
                }
                if !seen_narration {
                    return Err(ScriptError::NoNarrationBefore {
                        question_id: q.question_id,
                        index,
                    });
                }
            }
            StepKind::Closing { .. } => {}
        }
    }
    Ok(())
}
