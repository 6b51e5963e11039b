//! Telegram Bot API notifications
//!
//! Sends change notifications to subscribed chats via `sendMessage`.

use crate::adapters::Transport;
use crate::error::{NodewatchError, Result};
use crate::persistence::RecipientId;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_BASE: &str = "https://api.telegram.org";

/// Telegram notification client
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    api_base: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: RecipientId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TgResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    /// Create a notifier with an explicit bot token
    pub fn new(bot_token: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            bot_token,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point at a different Bot API server
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn send(&self, chat_id: RecipientId, text: &str, parse_mode: Option<&str>) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
        };

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let parsed: Option<TgResponse> = resp.json().await.ok();

        match parsed {
            Some(r) if r.ok && status.is_success() => Ok(()),
            Some(r) => Err(NodewatchError::Delivery {
                recipient: chat_id,
                reason: r
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            }),
            None => Err(NodewatchError::Delivery {
                recipient: chat_id,
                reason: format!("HTTP {}", status),
            }),
        }
    }
}

#[async_trait]
impl Transport for TelegramNotifier {
    async fn deliver(&self, recipient: RecipientId, message: &str) -> Result<()> {
        match self.send(recipient, message, Some("Markdown")).await {
            Ok(()) => {
                debug!("Telegram message delivered to {}", recipient);
                Ok(())
            }
            // Unbalanced markup in a node name or version string makes the
            // API reject the whole message; plain text still gets through.
            Err(NodewatchError::Delivery { reason, .. }) if reason.contains("parse entities") => {
                warn!(
                    "Markdown rejected for {}, resending as plain text",
                    recipient
                );
                self.send(recipient, message, None).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Transport that only logs messages (no bot token configured)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, recipient: RecipientId, message: &str) -> Result<()> {
        info!("[notify {}] {}", recipient, message.replace('\n', " | "));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let notifier = TelegramNotifier::new("123:abc".to_string())
            .unwrap()
            .with_api_base("http://localhost:8081/");
        assert_eq!(
            notifier.api_url("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_send_message_body() {
        let body = SendMessage {
            chat_id: -100,
            text: "hi",
            parse_mode: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"chat_id": -100, "text": "hi"}));
    }

    #[tokio::test]
    async fn test_log_transport_always_succeeds() {
        assert!(LogTransport.deliver(1, "line one\nline two").await.is_ok());
    }
}
