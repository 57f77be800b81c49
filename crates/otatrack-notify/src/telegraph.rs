//! Overflow pages on Telegraph

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::NotifyError;

/// Telegraph `createPage` endpoint
pub const TELEGRAPH_API_URL: &str = "https://api.telegra.ph/createPage";

const AUTHOR_NAME: &str = "TRANSSION Updates Tracker";
const AUTHOR_URL: &str = "https://t.me/TranssionUpdatesTracker";

/// Somewhere to publish text too long for a message
#[async_trait]
pub trait PasteService: Send + Sync {
    /// Publish `content` under `title` and return its public URL
    async fn publish(&self, title: &str, content: &str) -> Result<String, NotifyError>;
}

#[derive(Debug, Serialize)]
struct CreatePage<'a> {
    access_token: &'a str,
    title: String,
    author_name: &'a str,
    author_url: &'a str,
    content: serde_json::Value,
    return_content: bool,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Page>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: String,
}

/// Telegraph API client
#[derive(Clone)]
pub struct TelegraphClient {
    http: Client,
    access_token: String,
    api_url: String,
}

impl std::fmt::Debug for TelegraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegraphClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl TelegraphClient {
    /// Client authenticated with `access_token`
    pub fn new(access_token: impl Into<String>) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            access_token: access_token.into(),
            api_url: TELEGRAPH_API_URL.to_string(),
        })
    }

    /// Send requests to `url` instead of the public endpoint
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait]
impl PasteService for TelegraphClient {
    async fn publish(&self, title: &str, content: &str) -> Result<String, NotifyError> {
        let body = CreatePage {
            access_token: &self.access_token,
            title: format!("Update Details: {title}"),
            author_name: AUTHOR_NAME,
            author_url: AUTHOR_URL,
            content: json!([{ "tag": "p", "children": [content] }]),
            return_content: false,
        };

        let response = self.http.post(&self.api_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let page: PageResponse = response.json().await?;
        match (page.ok, page.result) {
            (true, Some(result)) => {
                debug!(url = %result.url, "created telegraph page");
                Ok(result.url)
            }
            _ => Err(NotifyError::Rejected(
                page.error.unwrap_or_else(|| "no page in response".to_string()),
            )),
        }
    }
}
