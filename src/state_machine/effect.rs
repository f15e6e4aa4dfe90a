//! Effects produced by state transitions

use crate::illustration::IllustrationRequest;
use crate::state_machine::state::Message;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch an illustration (spawns as background task)
    RequestIllustration(IllustrationRequest),

    /// Tell connected clients about a new transcript entry
    NotifyMessage { message: Message },

    /// Tell connected clients the session changed
    NotifyState,
}

impl Effect {
    pub fn request_illustration(question_id: u32, prompt: impl Into<String>) -> Self {
        Effect::RequestIllustration(IllustrationRequest {
            question_id,
            prompt: prompt.into(),
        })
    }

    pub fn notify_message(message: Message) -> Self {
        Effect::NotifyMessage { message }
    }
}
