//! Build-status provider — the external service that knows whether a build
//! has finished.
//!
//! The HTTP implementation speaks the BatchGetBuilds JSON shape: a request
//! carrying a batch of build ids and a response listing one record per build
//! found, plus the ids it could not find.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use buildrelay_common::error::RelayError;
use buildrelay_common::types::BuildDetail;

/// Source of build detail records.
#[async_trait]
pub trait BuildStatusProvider: Send + Sync {
    /// Fetch the current detail record for a single build.
    async fn fetch(&self, build_id: &str) -> Result<BuildDetail, RelayError>;
}

#[derive(Debug, Serialize)]
struct BatchGetBuildsRequest<'a> {
    ids: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct BatchGetBuildsResponse {
    #[serde(default)]
    builds: Vec<BuildDetail>,
    #[serde(default, rename = "buildsNotFound")]
    builds_not_found: Vec<String>,
}

/// Build-status provider reached over JSON/HTTP.
#[derive(Clone)]
pub struct HttpBuildStatusProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpBuildStatusProvider {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl BuildStatusProvider for HttpBuildStatusProvider {
    async fn fetch(&self, build_id: &str) -> Result<BuildDetail, RelayError> {
        let response = self
            .client
            .post(&self.url)
            .json(&BatchGetBuildsRequest { ids: [build_id] })
            .send()
            .await
            .map_err(|e| RelayError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Provider(format!(
                "build service answered {status}: {body}"
            )));
        }

        let batch: BatchGetBuildsResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Provider(format!("malformed build service response: {e}")))?;

        select_build(batch, build_id)
    }
}

/// Pick the record for `build_id` out of a batch response.
///
/// Records that echo no id are accepted, since the batch only ever holds one.
fn select_build(batch: BatchGetBuildsResponse, build_id: &str) -> Result<BuildDetail, RelayError> {
    if batch.builds_not_found.iter().any(|id| id == build_id) {
        return Err(RelayError::BuildNotFound(build_id.to_string()));
    }

    batch
        .builds
        .into_iter()
        .find(|b| b.id().is_none_or(|id| id == build_id))
        .ok_or_else(|| RelayError::BuildNotFound(build_id.to_string()))
}
