//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{AnswerRequest, ErrorResponse, SessionView, VersionResponse};
use super::AppState;
use crate::proxy::{ProxyError, ProxyReply};
use crate::runtime::RuntimeError;
use crate::state_machine::{Event, Session};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session snapshot and stream
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // Learner actions
        .route("/api/session/advance", post(advance))
        .route("/api/session/answer", post(answer))
        .route("/api/session/reread", post(reread))
        .route("/api/session/repeat", post(repeat))
        .route("/api/session/restart", post(restart))
        // Image proxy
        .route(
            "/api/generate-image",
            post(generate_image).fallback(method_not_allowed),
        )
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

fn view(state: &AppState, session: Session) -> Json<SessionView> {
    Json(SessionView::new(
        &state.session.session_id,
        &state.session.script,
        session,
    ))
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let session = state.session.snapshot().await?;
    Ok(view(&state, session))
}

async fn stream_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    // Subscribe before the snapshot so nothing falls between them
    let broadcast_rx = state.session.subscribe();
    let session = state.session.snapshot().await?;
    let Json(init) = view(&state, session);

    Ok(sse_stream(init, state.session.script.clone(), broadcast_rx))
}

// ============================================================
// Learner Actions
// ============================================================

async fn dispatch(state: &AppState, event: Event) -> Result<Json<SessionView>, AppError> {
    let session = state.session.dispatch(event).await?;
    Ok(view(state, session))
}

async fn advance(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    dispatch(&state, Event::Advance).await
}

async fn answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    dispatch(&state, Event::Answer { slot: req.choice }).await
}

async fn reread(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    dispatch(&state, Event::RereadStory).await
}

async fn repeat(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    dispatch(&state, Event::RepeatQuestion).await
}

async fn restart(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    dispatch(&state, Event::Restart).await
}

// ============================================================
// Image Proxy
// ============================================================

async fn generate_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ProxyReply>, ProxyError> {
    state.proxy.handle(&body).await.map(Json)
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Conflict(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Rejected(e) => AppError::Conflict(e.to_string()),
            RuntimeError::Stopped => {
                tracing::error!("Session runtime is not running");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ImageProxy, ProxyConfig, UpstreamKind};
    use crate::runtime::testing::MockIllustrator;
    use crate::runtime::spawn_session_with_rng;
    use crate::script::mia_story;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let session = spawn_session_with_rng(
            Arc::new(mia_story()),
            Arc::new(MockIllustrator::instant()),
            StdRng::seed_from_u64(11),
        );
        let proxy = ImageProxy::new(ProxyConfig {
            generative_key: None,
            vite_key: None,
            upstream: UpstreamKind::Stability,
            upstream_url: "http://127.0.0.1:1/unused".to_string(),
        })
        .unwrap();
        create_router(AppState::new(session, proxy))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Response) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_of(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, response) = send(app, method, uri, body).await;
        (status, json_of(response).await)
    }

    /// Choice that is correct (or wrong) under the presented order
    fn choice(view: &Value, correct: bool) -> &'static str {
        let correct_first = view["phase"]["order"] == "correct_first";
        if correct_first == correct {
            "first"
        } else {
            "second"
        }
    }

    #[tokio::test]
    async fn test_get_session() {
        let app = app();
        let (status, view) = call(&app, Method::GET, "/api/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["cursor"], 1);
        assert_eq!(view["total_questions"], 5);
        assert_eq!(view["prompt"]["type"], "action");
    }

    #[tokio::test]
    async fn test_advance_then_answer_correctly() {
        let app = app();
        let (status, view) = call(&app, Method::POST, "/api/session/advance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"]["type"], "awaiting_answer");
        assert_eq!(view["prompt"]["options"].as_array().unwrap().len(), 2);

        let body = json!({ "choice": choice(&view, true) });
        let (status, view) = call(&app, Method::POST, "/api/session/answer", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["phase"]["type"], "awaiting_image");

        // The mock illustrator answers immediately; poll until it lands
        let mut answered = 0;
        for _ in 0..50 {
            let (_, view) = call(&app, Method::GET, "/api/session", None).await;
            answered = view["answered_count"].as_u64().unwrap();
            if answered == 1 {
                assert!(view["images"]["1"]["uri"].as_str().unwrap().starts_with("data:"));
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(answered, 1);
    }

    #[tokio::test]
    async fn test_wrong_answer_then_reread() {
        let app = app();
        let (_, view) = call(&app, Method::POST, "/api/session/advance", None).await;
        let body = json!({ "choice": choice(&view, false) });
        let (status, view) = call(&app, Method::POST, "/api/session/answer", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["prompt"]["type"], "retry");

        let (status, view) = call(&app, Method::POST, "/api/session/reread", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["cursor"], 1);
        assert_eq!(view["phase"]["type"], "narrating");
    }

    #[tokio::test]
    async fn test_rejected_action_is_conflict() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/session/repeat", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("repeat"));
    }

    #[tokio::test]
    async fn test_restart_returns_fresh_session() {
        let app = app();
        call(&app, Method::POST, "/api/session/advance", None).await;
        let (status, view) = call(&app, Method::POST, "/api/session/restart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["cursor"], 1);
        assert_eq!(view["transcript"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_proxy_rejects_other_methods() {
        let app = app();
        let (status, response) = send(&app, Method::GET, "/api/generate-image", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    }

    #[tokio::test]
    async fn test_proxy_missing_prompt() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/generate-image", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing prompt");
    }

    #[tokio::test]
    async fn test_proxy_status_check_and_missing_key() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/generate-image",
            Some(json!({ "prompt": "__status_check__" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "hasGenerativeKey": false, "hasViteKey": false }));

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/generate-image",
            Some(json!({ "prompt": "a kite" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No API key configured on server");
    }

    #[tokio::test]
    async fn test_version() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "teacher_bot");
    }
}
