//! Gotify push transport.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Serialize;

use super::Priority;

/// Header carrying the Gotify application token.
const TOKEN_HEADER: &str = "X-Gotify-Key";

#[derive(Debug, Serialize)]
struct GotifyMessage<'a> {
    title: &'a str,
    message: &'a str,
    priority: u8,
}

/// Sends messages to `{url}/message`.
#[derive(Debug, Clone)]
pub struct GotifyNotifier {
    client: Client,
    endpoint: String,
    token: String,
}

impl GotifyNotifier {
    /// Create a notifier for the server at `url`.
    pub fn new(client: Client, url: &str, token: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/message", url.trim_end_matches('/')),
            token: token.to_string(),
        }
    }

    /// Full message endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one message.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn send(&self, title: &str, message: &str, priority: Priority) -> Result<()> {
        let payload = GotifyMessage {
            title,
            message,
            priority: priority.gotify_value(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(TOKEN_HEADER, &self.token)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gotify returned HTTP {status}: {}", body.trim());
        }

        Ok(())
    }
}
