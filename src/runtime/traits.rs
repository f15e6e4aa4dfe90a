//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::illustration::{IllustrationClient, IllustrationRequest, ImageHandle};
use async_trait::async_trait;
use std::sync::Arc;

/// Produces an illustration for a correctly answered question
///
/// Implementations never fail: they substitute a placeholder when the
/// provider cannot deliver, so the state machine has no failure path.
#[async_trait]
pub trait Illustrator: Send + Sync {
    async fn illustrate(&self, request: &IllustrationRequest) -> ImageHandle;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Illustrator + ?Sized> Illustrator for Arc<T> {
    async fn illustrate(&self, request: &IllustrationRequest) -> ImageHandle {
        (**self).illustrate(request).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl Illustrator for IllustrationClient {
    async fn illustrate(&self, request: &IllustrationRequest) -> ImageHandle {
        self.fetch_illustration(request).await
    }
}
