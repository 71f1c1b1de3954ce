use reqwest::{StatusCode, Url};

use buildrelay_common::types::ChatPayload;

/// Posts chat payloads to incoming-webhook endpoints.
#[derive(Clone)]
pub struct ChatWebhookClient {
    client: reqwest::Client,
}

impl ChatWebhookClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// POST the payload as JSON and return the response status.
    ///
    /// Any HTTP status is a successful round trip here; only transport
    /// failures (connect, timeout, TLS) are errors.
    pub async fn post(
        &self,
        endpoint: &Url,
        payload: &ChatPayload,
    ) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(endpoint.clone())
            .json(payload)
            .send()
            .await?;
        Ok(response.status())
    }
}
