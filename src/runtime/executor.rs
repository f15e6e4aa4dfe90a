//! Session runtime executor

use super::traits::Illustrator;
use super::{Command, SseEvent};

use crate::script::Script;
use crate::state_machine::{start_session, transition, Effect, Event, Session, TransitionError};
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Owns the session and serializes every event that touches it
pub struct SessionRuntime<I>
where
    I: Illustrator + 'static,
{
    session_id: String,
    script: Arc<Script>,
    session: Session,
    illustrator: Arc<I>,
    rng: StdRng,
    command_rx: mpsc::Receiver<Command>,
    /// Used by background tasks to feed results back; weak so the loop
    /// stops once every handle is gone
    command_tx: mpsc::WeakSender<Command>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<I> SessionRuntime<I>
where
    I: Illustrator + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: String,
        script: Arc<Script>,
        illustrator: I,
        mut rng: StdRng,
        command_rx: mpsc::Receiver<Command>,
        command_tx: mpsc::WeakSender<Command>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        let session = start_session(&script, &mut rng);
        Self {
            session_id,
            script,
            session,
            illustrator: Arc::new(illustrator),
            rng,
            command_rx,
            command_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        while let Some(command) = self.command_rx.recv().await {
            match command {
                Command::Dispatch { event, reply } => {
                    let event_name = event.name();
                    let result = self.process_event(event);
                    match reply {
                        Some(reply) => {
                            let _ = reply.send(result);
                        }
                        None => {
                            if let Err(e) = result {
                                tracing::error!(
                                    event = event_name,
                                    error = %e,
                                    "Error handling event"
                                );
                                let _ = self.broadcast_tx.send(SseEvent::Error {
                                    message: e.to_string(),
                                });
                            }
                        }
                    }
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.session.clone());
                }
            }
        }

        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<Session, TransitionError> {
        let event_name = event.name();
        let result = match transition(&self.session, &self.script, event, &mut self.rng) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(
                    event = event_name,
                    phase = self.session.phase.name(),
                    error = %e,
                    "Event rejected"
                );
                return Err(e);
            }
        };

        let old_phase = self.session.phase.name();
        self.session = result.new_session;
        tracing::debug!(
            event = event_name,
            from = old_phase,
            to = self.session.phase.name(),
            cursor = self.session.cursor,
            "Transition"
        );

        for effect in result.effects {
            self.execute_effect(effect);
        }

        if self.session.is_finished() {
            tracing::info!(
                session_id = %self.session_id,
                answered = self.session.answered_count,
                "Story finished"
            );
        }

        Ok(self.session.clone())
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::RequestIllustration(request) => {
                let illustrator = self.illustrator.clone();
                let command_tx = self.command_tx.clone();
                tracing::info!(question_id = request.question_id, "Requesting illustration");

                tokio::spawn(async move {
                    let image = illustrator.illustrate(&request).await;
                    tracing::info!(
                        question_id = request.question_id,
                        placeholder = image.is_placeholder(),
                        "Illustration ready"
                    );
                    let Some(command_tx) = command_tx.upgrade() else {
                        tracing::debug!("Session gone before illustration arrived");
                        return;
                    };
                    let _ = command_tx
                        .send(Command::Dispatch {
                            event: Event::IllustrationReady {
                                question_id: request.question_id,
                                image,
                            },
                            reply: None,
                        })
                        .await;
                });
            }

            Effect::NotifyMessage { message } => {
                let _ = self.broadcast_tx.send(SseEvent::Message { message });
            }

            Effect::NotifyState => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    session: self.session.clone(),
                });
            }
        }
    }
}
