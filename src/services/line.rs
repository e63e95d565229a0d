use async_trait::async_trait;
use reqwest::Client;

use crate::models::line::{OutboundMessage, PushRequest, ReplyRequest};

const API_BASE: &str = "https://api.line.me";
const DATA_API_BASE: &str = "https://api-data.line.me";

/// The chat platform operations the bot relies on.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Download the binary content of a user-sent message.
    async fn get_message_content(&self, message_id: &str) -> Result<Vec<u8>, LineError>;

    /// Answer an event using its one-shot reply token.
    async fn reply_message(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), LineError>;

    /// Send messages to a user, group or room at any time.
    async fn push_message(&self, to: &str, messages: Vec<OutboundMessage>)
        -> Result<(), LineError>;
}

/// Client for the LINE Messaging API.
pub struct LineClient {
    http: Client,
    access_token: String,
    api_base: String,
    data_api_base: String,
}

impl LineClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_urls(access_token, API_BASE, DATA_API_BASE)
    }

    /// Client pointed at alternative API hosts.
    pub fn with_base_urls(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        data_api_base: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            access_token: access_token.into(),
            api_base: api_base.into(),
            data_api_base: data_api_base.into(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, LineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LineError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatPlatform for LineClient {
    async fn get_message_content(&self, message_id: &str) -> Result<Vec<u8>, LineError> {
        let url = format!("{}/v2/bot/message/{}/content", self.data_api_base, message_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn reply_message(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), LineError> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&ReplyRequest {
                reply_token,
                messages: &messages,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn push_message(
        &self,
        to: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), LineError> {
        let url = format!("{}/v2/bot/message/push", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&PushRequest {
                to,
                messages: &messages,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("HTTP request to LINE failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LINE API returned {status}: {body}")]
    Api { status: u16, body: String },
}
