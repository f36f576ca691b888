//! Telegram channel adapter.
//!
//! Implements the Channel trait against the Telegram Bot API directly:
//! long-polling `getUpdates` for inbound messages, `sendMessage` for text
//! replies, and multipart `sendDocument` for rendered invoices.

use async_trait::async_trait;
use serde::Deserialize;
use tallybot_core::channel::{Channel, ChannelId, ChannelMessage};
use tallybot_core::error::ChannelError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, info, warn};

const API_BASE: &str = "https://api.telegram.org";
/// Pause between polls after a transport error.
const POLL_ERROR_BACKOFF_SECS: u64 = 5;

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub bot_token: String,
    /// Allowed user IDs or usernames. Empty = deny all, ["*"] = allow all.
    pub allowed_users: Vec<String>,
    /// Long-poll timeout in seconds for getUpdates.
    pub poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("allowed_users", &self.allowed_users)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

/// Telegram channel adapter.
pub struct TelegramChannel {
    config: TelegramConfig,
    channel_id: ChannelId,
    base_url: String,
    client: reqwest::Client,
    /// Dropped (via stop) to end the polling loop.
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            // Long-poll requests block server-side for poll_timeout_secs;
            // leave headroom on top of that.
            .timeout(std::time::Duration::from_secs(config.poll_timeout_secs + 30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            channel_id: ChannelId("telegram".into()),
            base_url: API_BASE.into(),
            client,
            stop_tx: Mutex::new(None),
        }
    }

    /// Point at a different API host (for testing against a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.config.bot_token)
    }
}

// ── Bot API wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    #[serde(default)]
    from: Option<TgUser>,
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

/// Convert one update into a ChannelMessage. Non-text updates (stickers,
/// photos, joins) are dropped.
fn to_channel_message(channel_id: &ChannelId, update: Update) -> Option<ChannelMessage> {
    let message = update.message?;
    let text = message.text?;
    let from = message.from?;

    Some(ChannelMessage {
        channel_id: channel_id.clone(),
        sender_id: from.id.to_string(),
        sender_name: from.username.or(from.first_name),
        content: text,
        chat_id: message.chat.id.to_string(),
    })
}

async fn poll_once(
    client: &reqwest::Client,
    url: &str,
    offset: i64,
    timeout_secs: u64,
) -> Result<Vec<Update>, ChannelError> {
    let response = client
        .get(url)
        .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
        .send()
        .await
        .map_err(|e| ChannelError::ConnectionLost(e.to_string()))?;

    let body: ApiResponse<Vec<Update>> = response
        .json()
        .await
        .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;

    if !body.ok {
        return Err(ChannelError::InvalidPayload(
            body.description.unwrap_or_else(|| "getUpdates returned ok=false".into()),
        ));
    }

    Ok(body.result.unwrap_or_default())
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn id(&self) -> &ChannelId {
        &self.channel_id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        info!("Telegram channel starting (long polling)");
        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        *self.stop_tx.lock().await = Some(stop_tx);

        let client = self.client.clone();
        let url = self.method_url("getUpdates");
        let timeout_secs = self.config.poll_timeout_secs;
        let channel_id = self.channel_id.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;
            loop {
                let updates = tokio::select! {
                    _ = &mut stop_rx => {
                        debug!("Telegram polling loop stopping");
                        break;
                    }
                    result = poll_once(&client, &url, offset, timeout_secs) => result,
                };

                match updates {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Some(msg) = to_channel_message(&channel_id, update) {
                                if tx.send(Ok(msg)).await.is_err() {
                                    debug!("Inbound receiver dropped, stopping poll loop");
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "getUpdates failed, backing off");
                        tokio::time::sleep(std::time::Duration::from_secs(
                            POLL_ERROR_BACKOFF_SECS,
                        ))
                        .await;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, chat_id: &str, content: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": content }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;

        check_send_response(response).await
    }

    async fn send_document(
        &self,
        chat_id: &str,
        bytes: &[u8],
        filename: &str,
    ) -> Result<(), ChannelError> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;

        check_send_response(response).await
    }

    fn is_allowed(&self, sender_id: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return false;
        }
        if self.config.allowed_users.iter().any(|u| u == "*") {
            return true;
        }
        self.config.allowed_users.iter().any(|u| u == sender_id)
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Telegram channel stopping");
        *self.stop_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Ok(false);
        }
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::ConnectionLost(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

async fn check_send_response(response: reqwest::Response) -> Result<(), ChannelError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ChannelError::DeliveryFailed {
        channel: "telegram".into(),
        reason: format!("{status}: {body}"),
    })
}
