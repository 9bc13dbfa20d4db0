use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::json;
use std::time::Duration;

use super::format::{split_message, MAX_MESSAGE_CHARS};
use super::types::{CreatedMessage, GatewayBot};
use crate::chat::ChatSink;
use crate::error::AppError;
use crate::market::source::compact_error_body;

pub struct DiscordRestClient {
    http: reqwest::Client,
    api_base_url: String,
}

impl DiscordRestClient {
    pub fn new(api_base_url: &str, bot_token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {}", bot_token))
            .context("DISCORD_BOT_TOKEN is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("failed to build Discord HTTP client")?;
        Ok(Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Discord {
            status,
            body: compact_error_body(&body),
        })
    }

    /// Post one message; returns the new message id.
    pub async fn create_message(&self, channel_id: u64, content: &str) -> Result<String, AppError> {
        let url = format!("{}/channels/{}/messages", self.api_base_url, channel_id);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;
        let created: CreatedMessage = serde_json::from_str(&body)?;
        Ok(created.id)
    }

    pub async fn gateway_url(&self) -> Result<String, AppError> {
        let url = format!("{}/gateway/bot", self.api_base_url);
        let response = self.http.get(&url).send().await?;
        let body = Self::check(response).await?.text().await?;
        let gateway: GatewayBot = serde_json::from_str(&body)?;
        Ok(gateway.url)
    }
}

#[async_trait]
impl ChatSink for DiscordRestClient {
    async fn send(&self, channel_id: u64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            self.create_message(channel_id, &chunk)
                .await
                .with_context(|| format!("failed to post to channel {}", channel_id))?;
        }
        Ok(())
    }
}
