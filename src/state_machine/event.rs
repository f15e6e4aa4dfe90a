//! Events that can occur in a session

use crate::illustration::ImageHandle;
use crate::state_machine::state::OptionSlot;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Learner events
    Advance,
    Answer { slot: OptionSlot },
    RereadStory,
    RepeatQuestion,
    Restart,

    // Illustration events
    IllustrationReady {
        question_id: u32,
        image: ImageHandle,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Advance => "advance",
            Event::Answer { .. } => "answer",
            Event::RereadStory => "reread_story",
            Event::RepeatQuestion => "repeat_question",
            Event::Restart => "restart",
            Event::IllustrationReady { .. } => "illustration_ready",
        }
    }
}
