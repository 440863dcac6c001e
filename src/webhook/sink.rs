//! The delivery seam between the engine and the notification transport.

use async_trait::async_trait;

use crate::engine::Payload;

use super::error::DeliveryError;

/// Delivers formatted payloads to an external notification channel.
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Deliver one payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] on transport failure. Callers log and
    /// drop the payload; there is no retry.
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError>;
}

/// Sink used when no webhook endpoint is configured: payloads go to the
/// log instead of the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotifySink for LogSink {
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        tracing::info!(chars = payload.char_len(), "Event summary:\n{}", payload.text());
        Ok(())
    }
}
