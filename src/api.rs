//! HTTP API for the learner session and the image proxy

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::proxy::ImageProxy;
use crate::runtime::SessionHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    pub proxy: Arc<ImageProxy>,
}

impl AppState {
    pub fn new(session: SessionHandle, proxy: ImageProxy) -> Self {
        Self {
            session,
            proxy: Arc::new(proxy),
        }
    }
}
