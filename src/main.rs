//! Teacher Bot - illustrated story reading companion
//!
//! Walks a young learner through a short story with comprehension
//! questions and rewards correct answers with a generated illustration.

mod api;
mod illustration;
mod proxy;
mod runtime;
mod script;
mod state_machine;

use api::{create_router, AppState};
use illustration::{IllustrationClient, IllustratorConfig, LoggingTransport, ProxyTransport};
use proxy::{ImageProxy, ProxyConfig};
use script::{mia_story, Script};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teacher_bot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("TEACHER_BOT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let script = match std::env::var("TEACHER_BOT_SCRIPT") {
        Ok(path) => {
            tracing::info!(path = %path, "Loading script");
            Script::from_json_file(&PathBuf::from(path))?
        }
        Err(_) => mia_story(),
    };
    tracing::info!(
        steps = script.len(),
        questions = script.total_questions(),
        "Script ready"
    );

    // Image proxy (server side of the provider credential)
    let proxy_config = ProxyConfig::from_env()?;
    if proxy_config.api_key().is_none() {
        tracing::warn!(
            "No image API key configured. Set GENERATIVE_API_KEY; placeholders will be shown."
        );
    }
    tracing::info!(
        upstream = proxy_config.upstream.name(),
        url = %proxy_config.upstream_url,
        "Image proxy configured"
    );
    let proxy = ImageProxy::new(proxy_config)?;

    // Illustration client (talks to the proxy, local by default)
    let illustrator_config =
        IllustratorConfig::from_env(format!("http://127.0.0.1:{port}/api/generate-image"));
    tracing::info!(
        proxy_url = %illustrator_config.proxy_url,
        max_attempts = illustrator_config.retry.max_attempts,
        base_delay_ms = u64::try_from(illustrator_config.retry.base_delay.as_millis())
            .unwrap_or(u64::MAX),
        "Illustration client configured"
    );
    let transport = ProxyTransport::new(
        illustrator_config.proxy_url.clone(),
        illustrator_config.timeout,
    )?;
    let illustrator = IllustrationClient::new(
        Arc::new(LoggingTransport::new(Arc::new(transport))),
        illustrator_config.retry,
    );

    // Session runtime
    let session = runtime::spawn_session(Arc::new(script), illustrator);
    tracing::info!(session_id = %session.session_id, "Session started");

    // Create application state
    let state = AppState::new(session, proxy);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Teacher Bot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
