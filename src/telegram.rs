use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TelegramConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Telegram API refused the message: {0}")]
    Rejected(String),
    #[error("unreadable Telegram response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends chat messages through the Telegram Bot API.
pub struct TelegramNotifier {
    http: Client,
    base_url: String,
    token: String,
    chat_id: String,
    max_chars: usize,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, token: String, chat_id: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token,
            chat_id,
            max_chars: config.max_message_chars,
        })
    }

    /// Send a message, logging any failure. Never fails the caller.
    pub async fn send(&self, message: &str) -> bool {
        match self.send_message(message).await {
            Ok(()) => {
                debug!("Telegram message sent");
                true
            }
            Err(e) => {
                warn!(error = %e, "Telegram message not delivered");
                false
            }
        }
    }

    /// Text beyond the API's length limit is cut off.
    pub async fn send_message(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": truncate_chars(message, self.max_chars),
            "disable_web_page_preview": false,
        });

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        let text = resp.text().await?;

        let parsed: SendMessageResponse = serde_json::from_str(&text)?;
        if !parsed.ok {
            return Err(NotifyError::Rejected(parsed.description.unwrap_or(text)));
        }
        Ok(())
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
