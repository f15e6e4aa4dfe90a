//! Pure state transition function
//!
//! Given the same session, script, event and RNG state, `transition` always
//! produces the same result and performs no I/O.

use super::effect::Effect;
use super::event::Event;
use super::state::{MessageRole, OptionOrder, Phase, Session};
use crate::script::{Question, Script, StepKind};
use rand::Rng;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still drawing the picture for question {question_id}, please wait")]
    Busy { question_id: u32 },
    #[error("Illustration for question {received} arrived but none was expected for it")]
    StaleIllustration { received: u32 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Fresh session: opening message shown, cursor just past it
pub fn start_session(script: &Script, rng: &mut impl Rng) -> Session {
    let mut session = Session {
        cursor: 0,
        transcript: Vec::new(),
        answered_count: 0,
        image_by_question: BTreeMap::new(),
        phase: Phase::Narrating,
    };
    if let Some(opening) = script.step_at(0) {
        session.push_message(MessageRole::Bot, opening.text.clone(), None, None);
        session.cursor = 1;
    }
    settle(&mut session, script, rng);
    session
}

/// Pick the resting phase for the step under the cursor
fn settle(session: &mut Session, script: &Script, rng: &mut impl Rng) {
    session.phase = match script.step_at(session.cursor).map(|s| &s.kind) {
        Some(StepKind::Narration { .. }) => Phase::Narrating,
        Some(StepKind::Question(q)) => Phase::AwaitingAnswer {
            question_id: q.question_id,
            order: OptionOrder::random(rng),
        },
        Some(StepKind::Closing { .. }) | None => Phase::Finished,
    };
}

fn question_at(
    script: &Script,
    index: usize,
    question_id: u32,
) -> Result<&Question, TransitionError> {
    script
        .step_at(index)
        .and_then(|s| s.as_question())
        .filter(|q| q.question_id == question_id)
        .ok_or_else(|| {
            TransitionError::InvalidTransition(format!(
                "step {index} is not question {question_id}"
            ))
        })
}

/// Pure transition function
pub fn transition(
    session: &Session,
    script: &Script,
    event: Event,
    rng: &mut impl Rng,
) -> Result<TransitionResult, TransitionError> {
    match (&session.phase, event) {
        // ============================================================
        // Illustration in flight: learner input is rejected
        // ============================================================
        (
            Phase::AwaitingImage { question_id },
            Event::Advance
            | Event::Answer { .. }
            | Event::RereadStory
            | Event::RepeatQuestion
            | Event::Restart,
        ) => Err(TransitionError::Busy {
            question_id: *question_id,
        }),

        // ============================================================
        // Narration
        // ============================================================
        (Phase::Narrating, Event::Advance) => {
            let step = script
                .step_at(session.cursor)
                .filter(|s| s.is_narration())
                .ok_or_else(|| {
                    TransitionError::InvalidTransition(format!(
                        "no narration step at {}",
                        session.cursor
                    ))
                })?;

            let mut next = session.clone();
            let message = next.push_message(MessageRole::Bot, step.text.clone(), None, None);
            next.cursor += 1;
            settle(&mut next, script, rng);

            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_message(message))
                .with_effect(Effect::NotifyState))
        }

        // ============================================================
        // Answering
        // ============================================================
        (Phase::AwaitingAnswer { question_id, order }, Event::Answer { slot }) => {
            let question_id = *question_id;
            let question = question_at(script, session.cursor, question_id)?;
            let mut next = session.clone();

            if order.is_correct(slot) {
                let choice = next.push_message(
                    MessageRole::Learner,
                    question.correct.text.clone(),
                    Some(question_id),
                    None,
                );
                next.phase = Phase::AwaitingImage { question_id };

                Ok(TransitionResult::new(next)
                    .with_effect(Effect::notify_message(choice))
                    .with_effect(Effect::NotifyState)
                    .with_effect(Effect::request_illustration(
                        question_id,
                        question.correct.prompt.clone(),
                    )))
            } else {
                let narration_index = script.retry_target(session.cursor).ok_or_else(|| {
                    TransitionError::InvalidTransition(format!(
                        "question {question_id} has no narration step to reread"
                    ))
                })?;
                let choice = next.push_message(
                    MessageRole::Learner,
                    question.wrong.text.clone(),
                    Some(question_id),
                    None,
                );
                let explanation = next.push_message(
                    MessageRole::Bot,
                    question.wrong.explanation.clone(),
                    Some(question_id),
                    None,
                );
                next.phase = Phase::OfferingRetry {
                    question_id,
                    narration_index,
                };

                Ok(TransitionResult::new(next)
                    .with_effects([
                        Effect::notify_message(choice),
                        Effect::notify_message(explanation),
                    ])
                    .with_effect(Effect::NotifyState))
            }
        }

        // ============================================================
        // Retry offer
        // ============================================================
        (
            Phase::OfferingRetry {
                narration_index, ..
            },
            Event::RereadStory,
        ) => {
            let narration_index = *narration_index;
            let step = script.step_at(narration_index).ok_or_else(|| {
                TransitionError::InvalidTransition(format!(
                    "retry target {narration_index} is out of range"
                ))
            })?;

            let mut next = session.clone();
            let message = next.push_message(MessageRole::Bot, step.text.clone(), None, None);
            next.cursor = narration_index;
            next.phase = Phase::Narrating;

            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_message(message))
                .with_effect(Effect::NotifyState))
        }

        (Phase::OfferingRetry { question_id, .. }, Event::RepeatQuestion) => {
            let mut next = session.clone();
            next.phase = Phase::AwaitingAnswer {
                question_id: *question_id,
                order: OptionOrder::random(rng),
            };
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyState))
        }

        // ============================================================
        // Illustration results
        // ============================================================
        (
            Phase::AwaitingImage { question_id },
            Event::IllustrationReady {
                question_id: ready,
                image,
            },
        ) if *question_id == ready => {
            let question = question_at(script, session.cursor, ready)?;
            let mut next = session.clone();
            // First picture for a question is kept; a re-answer only shows the new one
            next.image_by_question
                .entry(ready)
                .or_insert_with(|| image.clone());
            let message = next.push_message(
                MessageRole::Bot,
                question.correct.response.clone(),
                Some(ready),
                Some(image),
            );
            next.answered_count = next.image_by_question.len();
            next.cursor += 1;
            settle(&mut next, script, rng);

            Ok(TransitionResult::new(next)
                .with_effect(Effect::notify_message(message))
                .with_effect(Effect::NotifyState))
        }

        (_, Event::IllustrationReady { question_id, .. }) => {
            Err(TransitionError::StaleIllustration {
                received: question_id,
            })
        }

        // ============================================================
        // Restart (any idle phase)
        // ============================================================
        (_, Event::Restart) => {
            Ok(TransitionResult::new(start_session(script, rng)).with_effect(Effect::NotifyState))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "{} is not accepted while {}",
            event.name(),
            phase.name()
        ))),
    }
}
