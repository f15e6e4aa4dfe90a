//! Runtime for the learner session
//!
//! Owns the single session, feeds events through the state machine and
//! executes the resulting effects.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::script::Script;
use crate::state_machine::{Event, Message, Session, TransitionError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Reply channel for a dispatched event
pub type DispatchReply = oneshot::Sender<Result<Session, TransitionError>>;

/// Requests handled by the runtime loop
#[derive(Debug)]
pub enum Command {
    /// Run an event through the state machine; `reply` is `None` for
    /// events raised by the runtime's own background tasks
    Dispatch {
        event: Event,
        reply: Option<DispatchReply>,
    },
    /// Read the current session
    Snapshot { reply: oneshot::Sender<Session> },
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Message { message: Message },
    StateChange { session: Session },
    Error { message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("session runtime has stopped")]
    Stopped,
}

/// Handle to interact with the running session
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub script: Arc<Script>,
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl SessionHandle {
    /// Run an event and wait for the resulting session
    pub async fn dispatch(&self, event: Event) -> Result<Session, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Dispatch {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        Ok(reply_rx.await.map_err(|_| RuntimeError::Stopped)??)
    }

    pub async fn snapshot(&self) -> Result<Session, RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Dispatch the way background tasks do, with nobody waiting on the result
    #[cfg(test)]
    pub(crate) async fn send_unanswered(&self, event: Event) {
        let _ = self
            .command_tx
            .send(Command::Dispatch { event, reply: None })
            .await;
    }
}

/// Start the session runtime on the current tokio runtime
pub fn spawn_session<I: Illustrator + 'static>(
    script: Arc<Script>,
    illustrator: I,
) -> SessionHandle {
    spawn_session_with_rng(script, illustrator, StdRng::from_entropy())
}

/// Same as [`spawn_session`] with a caller-chosen RNG
pub fn spawn_session_with_rng<I: Illustrator + 'static>(
    script: Arc<Script>,
    illustrator: I,
    rng: StdRng,
) -> SessionHandle {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (command_tx, command_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = SessionRuntime::new(
        session_id.clone(),
        script.clone(),
        illustrator,
        rng,
        command_rx,
        command_tx.downgrade(),
        broadcast_tx.clone(),
    );
    tokio::spawn(runtime.run());

    SessionHandle {
        session_id,
        script,
        command_tx,
        broadcast_tx,
    }
}
