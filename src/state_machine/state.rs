//! Session state types

use crate::illustration::ImageHandle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Option presentation
// ============================================================================

/// Which on-screen slot the learner picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSlot {
    First,
    Second,
}

/// Where the correct option was placed for this presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionOrder {
    CorrectFirst,
    CorrectSecond,
}

impl OptionOrder {
    /// Fair coin flip, re-rolled on every presentation
    pub fn random(rng: &mut impl Rng) -> Self {
        if rng.gen_bool(0.5) {
            OptionOrder::CorrectFirst
        } else {
            OptionOrder::CorrectSecond
        }
    }

    pub fn is_correct(self, slot: OptionSlot) -> bool {
        matches!(
            (self, slot),
            (OptionOrder::CorrectFirst, OptionSlot::First)
                | (OptionOrder::CorrectSecond, OptionSlot::Second)
        )
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Bot,
    Learner,
}

/// One entry in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sequence_id: usize,
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageHandle>,
}

// ============================================================================
// Phase
// ============================================================================

/// Where the learner is in the flow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// A narration step is under the cursor, waiting for "next"
    Narrating,

    /// A question is on screen with its options in `order`
    AwaitingAnswer { question_id: u32, order: OptionOrder },

    /// Correct answer given, illustration in flight
    AwaitingImage { question_id: u32 },

    /// Wrong answer given; learner chooses to reread or repeat
    OfferingRetry {
        question_id: u32,
        /// Narration step to reread
        narration_index: usize,
    },

    /// Closing step reached or script exhausted
    Finished,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Narrating => "narrating",
            Phase::AwaitingAnswer { .. } => "awaiting_answer",
            Phase::AwaitingImage { .. } => "awaiting_image",
            Phase::OfferingRetry { .. } => "offering_retry",
            Phase::Finished => "finished",
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One learner's in-memory conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub cursor: usize,
    pub transcript: Vec<Message>,
    pub answered_count: usize,
    pub image_by_question: BTreeMap<u32, ImageHandle>,
    pub phase: Phase,
}

impl Session {
    /// Narration step to reread, set only after a wrong answer
    pub fn pending_retry(&self) -> Option<usize> {
        match self.phase {
            Phase::OfferingRetry {
                narration_index, ..
            } => Some(narration_index),
            _ => None,
        }
    }

    /// Question whose illustration is being fetched
    pub fn active_generation(&self) -> Option<u32> {
        match self.phase {
            Phase::AwaitingImage { question_id } => Some(question_id),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    pub(crate) fn push_message(
        &mut self,
        role: MessageRole,
        text: impl Into<String>,
        question_id: Option<u32>,
        image: Option<ImageHandle>,
    ) -> Message {
        let message = Message {
            sequence_id: self.transcript.len(),
            role,
            text: text.into(),
            question_id,
            image,
        };
        self.transcript.push(message.clone());
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_order_maps_slots() {
        assert!(OptionOrder::CorrectFirst.is_correct(OptionSlot::First));
        assert!(!OptionOrder::CorrectFirst.is_correct(OptionSlot::Second));
        assert!(OptionOrder::CorrectSecond.is_correct(OptionSlot::Second));
        assert!(!OptionOrder::CorrectSecond.is_correct(OptionSlot::First));
    }

    #[test]
    fn test_phase_serializes_with_type_tag() {
        let json = serde_json::to_value(Phase::OfferingRetry {
            question_id: 2,
            narration_index: 3,
        })
        .unwrap();
        assert_eq!(json["type"], "offering_retry");
        assert_eq!(json["narration_index"], 3);
    }
}
