//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::Illustrator;
use crate::illustration::{IllustrationRequest, ImageHandle, ImagePayload};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock Illustrator
// ============================================================================

/// Mock illustrator that answers with a fixed generated image
pub struct MockIllustrator {
    /// When set, each request waits for one `notify_one` before answering
    gate: Option<Arc<Notify>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<IllustrationRequest>>,
}

impl MockIllustrator {
    pub fn instant() -> Self {
        Self {
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Illustrator that holds every request until the returned gate opens
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mock = Self {
            gate: Some(gate.clone()),
            requests: Mutex::new(Vec::new()),
        };
        (mock, gate)
    }

    pub fn recorded_requests(&self) -> Vec<IllustrationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Illustrator for MockIllustrator {
    async fn illustrate(&self, request: &IllustrationRequest) -> ImageHandle {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        ImageHandle::generated(&ImagePayload {
            mime_type: "image/png".to_string(),
            base64: "aGVsbG8=".to_string(),
        })
    }
}
