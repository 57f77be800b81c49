//! Telegram Bot API delivery

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::NotifyError;
use crate::message::{BUTTON_TEXT, Notification};
use crate::sanitize::clean_description;
use crate::telegraph::PasteService;
use crate::truncate::{DESCRIPTION_MAX_LEN, MESSAGE_MAX_LEN, truncate_description};

/// Public Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Bot credentials and transport settings
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub bot_token: String,
    /// Destination chat
    pub chat_id: String,
    /// API base URL
    pub api_base: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramConfig {
    /// Configuration for `bot_token` posting to `chat_id`
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Point at another API base
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

/// What happened to a delivered message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Overflow page holding the full description
    pub page_url: Option<String>,
    /// Whether the description was shortened
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends update notifications to one chat
#[derive(Clone)]
pub struct TelegramNotifier {
    http: Client,
    config: TelegramConfig,
    paste: Option<Arc<dyn PasteService>>,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("config", &self.config)
            .field("paste", &self.paste.is_some())
            .finish()
    }
}

impl TelegramNotifier {
    /// Create a notifier
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            paste: None,
        })
    }

    /// Publish oversized descriptions through `paste`
    pub fn with_paste_service(mut self, paste: Arc<dyn PasteService>) -> Self {
        self.paste = Some(paste);
        self
    }

    /// Message text for `notification`, offloading the description when too long
    pub async fn prepare(&self, notification: &Notification) -> (String, DeliveryReport) {
        let description = clean_description(&notification.description);
        let text = notification.render(&description);
        if text.chars().count() <= MESSAGE_MAX_LEN
            || description.chars().count() <= DESCRIPTION_MAX_LEN
        {
            return (text, DeliveryReport::default());
        }

        let page_url = match &self.paste {
            Some(paste) => match paste.publish(&notification.page_title(), &description).await {
                Ok(url) => {
                    info!(url = %url, "description moved to overflow page");
                    Some(url)
                }
                Err(e) => {
                    warn!(error = %e, "overflow page failed, truncating without link");
                    None
                }
            },
            None => None,
        };

        let short = truncate_description(&description, DESCRIPTION_MAX_LEN, page_url.as_deref());
        (
            notification.render(&short),
            DeliveryReport {
                page_url,
                truncated: true,
            },
        )
    }

    /// Deliver `notification`
    ///
    /// Succeeds only once Telegram has accepted the message.
    pub async fn send(&self, notification: &Notification) -> Result<DeliveryReport, NotifyError> {
        let (text, report) = self.prepare(notification).await;
        let payload = json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "html",
            "disable_web_page_preview": true,
            "reply_markup": {
                "inline_keyboard": [[{ "text": BUTTON_TEXT, "url": notification.url }]]
            },
        });
        debug!(
            chat = %self.config.chat_id,
            chars = text.chars().count(),
            truncated = report.truncated,
            "sending telegram message"
        );

        let response = self
            .http
            .post(self.config.send_message_url())
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ApiResponse = response.json().await?;
        if !reply.ok {
            return Err(NotifyError::Rejected(
                reply.description.unwrap_or_else(|| "ok=false".to_string()),
            ));
        }
        info!(device = %notification.device, title = %notification.title, "notification sent");
        Ok(report)
    }
}
