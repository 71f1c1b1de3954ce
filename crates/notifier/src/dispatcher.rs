use std::sync::Arc;

use reqwest::Url;

use buildrelay_common::error::RelayError;
use buildrelay_common::types::{ChatPayload, DeliveryWarning, DispatchResult};

use crate::chat::ChatWebhookClient;
use crate::topic::TopicPublisher;

/// Delivers one notification to the chat webhook and the topic.
pub struct Dispatcher {
    chat: ChatWebhookClient,
    publisher: Arc<dyn TopicPublisher>,
}

impl Dispatcher {
    pub fn new(chat: ChatWebhookClient, publisher: Arc<dyn TopicPublisher>) -> Self {
        Self { chat, publisher }
    }

    /// Send the chat payload, then publish to the topic. No retries.
    ///
    /// A non-2xx webhook response and any publish failure become warnings in
    /// the returned `DispatchResult`. The only error is a chat transport
    /// failure, which is returned after the topic publish has been attempted.
    pub async fn dispatch(
        &self,
        endpoint: &Url,
        chat_payload: &ChatPayload,
        topic: &str,
        subject: &str,
        body: &str,
    ) -> Result<DispatchResult, RelayError> {
        let mut result = DispatchResult::default();

        tracing::info!(endpoint = %endpoint, "Posting chat notification");
        let chat_error = match self.chat.post(endpoint, chat_payload).await {
            Ok(status) => {
                tracing::info!(status = status.as_u16(), "Chat webhook responded");
                if !status.is_success() {
                    let warning = DeliveryWarning::ChatDeliveryDegraded {
                        status: status.as_u16(),
                    };
                    tracing::warn!(warning = %warning, "Chat delivery degraded");
                    result.warnings.push(warning);
                }
                result.chat_status = Some(status.as_u16());
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat webhook request failed");
                Some(e)
            }
        };

        tracing::info!(topic, subject, "Publishing build summary to topic");
        match self.publisher.publish(topic, subject, body).await {
            Ok(message_id) => {
                tracing::debug!(message_id = %message_id, "Topic message published");
                result.topic_message_id = Some(message_id);
            }
            Err(e) => {
                tracing::error!(topic, error = %e, "Error publishing to topic");
                result.warnings.push(DeliveryWarning::TopicPublishFailed {
                    reason: e.to_string(),
                });
            }
        }

        match chat_error {
            Some(e) => Err(RelayError::ChatTransport(e)),
            None => Ok(result),
        }
    }
}
