//! Topic publishing — the secondary broadcast channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed publish response: {0}")]
    Malformed(String),
}

/// Pub/sub publisher.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Publish a message and return the provider's message id.
    async fn publish(
        &self,
        topic: &str,
        subject: &str,
        message: &str,
    ) -> Result<String, PublishError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PublishRequest<'a> {
    topic_arn: &'a str,
    subject: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PublishResponse {
    message_id: String,
}

/// Topic publisher reached over JSON/HTTP.
#[derive(Clone)]
pub struct HttpTopicPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpTopicPublisher {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TopicPublisher for HttpTopicPublisher {
    async fn publish(
        &self,
        topic: &str,
        subject: &str,
        message: &str,
    ) -> Result<String, PublishError> {
        let response = self
            .client
            .post(&self.url)
            .json(&PublishRequest {
                topic_arn: topic,
                subject,
                message,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let published: PublishResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Malformed(e.to_string()))?;
        Ok(published.message_id)
    }
}
