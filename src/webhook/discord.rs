//! Discord-compatible webhook transport.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use url::Url;

use crate::engine::Payload;

use super::error::DeliveryError;
use super::sink::NotifySink;

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Title attached to every delivered embed.
const EMBED_TITLE: &str = "Event Summary";

/// Build an HTTP client with proper timeout configuration.
fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}

/// Posts payloads to a Discord-compatible webhook as a single embed per
/// payload. The batcher guarantees each payload fits the embed
/// description limit.
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: Client,
    url: Url,
    username: String,
    color: u32,
}

impl DiscordWebhook {
    #[must_use]
    pub fn new(url: Url, username: String, color: u32) -> Self {
        Self {
            client: build_http_client(),
            url,
            username,
            color,
        }
    }

    fn build_body(&self, payload: &Payload) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "embeds": [{
                "title": EMBED_TITLE,
                "description": payload.text(),
                "color": self.color,
                "timestamp": Utc::now().to_rfc3339(),
            }]
        })
    }
}

#[async_trait]
impl NotifySink for DiscordWebhook {
    async fn deliver(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&self.build_body(payload))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(chars = payload.char_len(), "Notification delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status {
            code: status.as_u16(),
            body,
        })
    }
}
