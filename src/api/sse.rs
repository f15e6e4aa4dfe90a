//! Server-Sent Events support

use super::types::SessionView;
use crate::runtime::SseEvent;
use crate::script::Script;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init: SessionView,
    script: Arc<Script>,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = init.session_id.clone();

    // Create stream that starts with init event then broadcasts
    let init_event = Event::default().event("init").data(
        json!({
            "type": "init",
            "session": init
        })
        .to_string(),
    );
    let init = futures::stream::once(async move { Ok(init_event) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(&session_id, &script, event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(session_id: &str, script: &Script, event: SseEvent) -> Event {
    let (event_type, data) = match event {
        SseEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SseEvent::StateChange { session } => (
            "state_change",
            json!({
                "type": "state_change",
                "session": SessionView::new(session_id, script, session)
            }),
        ),
        SseEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
