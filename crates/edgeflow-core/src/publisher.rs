//! Publisher seam between the ingestion pipeline and the event store.

use async_trait::async_trait;
use std::sync::Arc;

use crate::event::Event;

/// Errors returned by a [`Publisher`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Nobody is listening for events
    #[error("No subscribers for event {0}")]
    NoSubscribers(uuid::Uuid),

    /// The downstream store rejected the event
    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Sink for events produced by the ingestion loop.
///
/// No acknowledgment or retry contract is assumed by callers. Retries, if
/// any, are the implementation's business.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, event: Event) -> Result<(), PublishError>;
}

#[async_trait]
impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    async fn publish(&self, event: Event) -> Result<(), PublishError> {
        (**self).publish(event).await
    }
}

/// Shared publisher handle.
pub type SharedPublisher = Arc<dyn Publisher>;
