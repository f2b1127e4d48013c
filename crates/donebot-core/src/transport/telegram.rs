//! Telegram Bot API transport -- long-poll `getUpdates`, `sendMessage`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{IncomingMessage, MessageTransport, Update};
use crate::error::TransportError;
use crate::storage::config::TelegramConfig;

/// Standard `{ok, result, description}` response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
    edited_message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
    date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let message = raw.message.or(raw.edited_message).map(|m| IncomingMessage {
            chat_id: m.chat.id.to_string(),
            text: m.text,
            timestamp: m.date,
        });
        Update {
            update_id: raw.update_id,
            message,
        }
    }
}

/// Blocking Telegram client for a single chat.
///
/// Owns a current-thread runtime so callers stay synchronous.
pub struct TelegramTransport {
    http: Client,
    runtime: tokio::runtime::Runtime,
    api_base: String,
    token: String,
    chat_id: String,
    poll_timeout_secs: u64,
}

impl TelegramTransport {
    pub fn new(config: &TelegramConfig, token: &str, chat_id: &str) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|source| TransportError::Http {
                method: "client",
                source,
            })?;
        Ok(Self {
            http,
            runtime,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    async fn decode<T: DeserializeOwned>(
        resp: Response,
        method: &'static str,
    ) -> Result<T, TransportError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                method,
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = resp.json().await.map_err(|source| TransportError::Http {
            method,
            source: source.without_url(),
        })?;
        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Api {
                method,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no result in response".to_string()),
            }),
        }
    }
}

impl MessageTransport for TelegramTransport {
    fn fetch_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        const METHOD: &str = "getUpdates";
        let url = self.url(METHOD);
        let raw: Vec<RawUpdate> = self.runtime.block_on(async {
            let resp = self
                .http
                .get(&url)
                .query(&[
                    ("offset", offset.to_string()),
                    ("timeout", self.poll_timeout_secs.to_string()),
                ])
                .send()
                .await
                .map_err(|source| TransportError::Http {
                    method: METHOD,
                    source: source.without_url(),
                })?;
            Self::decode(resp, METHOD).await
        })?;
        tracing::debug!(offset, count = raw.len(), "fetched updates");
        Ok(raw.into_iter().map(Update::from).collect())
    }

    fn send(&self, text: &str) -> Result<(), TransportError> {
        const METHOD: &str = "sendMessage";
        let url = self.url(METHOD);
        self.runtime.block_on(async {
            let resp = self
                .http
                .post(&url)
                .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
                .send()
                .await
                .map_err(|source| TransportError::Http {
                    method: METHOD,
                    source: source.without_url(),
                })?;
            Self::decode::<serde_json::Value>(resp, METHOD).await
        })?;
        tracing::info!(chars = text.chars().count(), "message sent");
        Ok(())
    }
}
