//! Invocation pipeline.
//!
//! For one build event:
//! 1. Resolve the project's chat webhook (fails fast on unknown projects)
//! 2. Poll the build service until the build reports completion
//! 3. Render the notification
//! 4. Deliver to chat and topic

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use buildrelay_common::config::RelayConfig;
use buildrelay_common::error::RelayError;
use buildrelay_common::types::{BuildEvent, DispatchResult};
use buildrelay_engine::{MessageFormatter, RouteTable};
use buildrelay_notifier::{ChatWebhookClient, Dispatcher, HttpTopicPublisher};
use buildrelay_poller::{HttpBuildStatusProvider, PollPolicy, StatusPoller};

/// Summary of a successful invocation, printed by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutcome {
    pub invocation_id: Uuid,
    pub build_id: String,
    pub project: String,
    pub status: String,
    #[serde(flatten)]
    pub dispatch: DispatchResult,
}

/// Wires poller, formatter, router and dispatcher together.
///
/// Built once per process; every component is read-only afterwards so the
/// same `Relay` can serve any number of invocations.
pub struct Relay {
    poller: StatusPoller,
    routes: RouteTable,
    dispatcher: Dispatcher,
    topic_arn: String,
}

impl Relay {
    pub fn new(
        poller: StatusPoller,
        routes: RouteTable,
        dispatcher: Dispatcher,
        topic_arn: impl Into<String>,
    ) -> Self {
        Self {
            poller,
            routes,
            dispatcher,
            topic_arn: topic_arn.into(),
        }
    }

    /// Create the HTTP-backed relay. One `reqwest::Client` is shared by the
    /// build provider, the chat webhook and the topic publisher.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("build-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))?;

        let routes = RouteTable::new(config.routes.clone())?;

        let provider = Arc::new(HttpBuildStatusProvider::new(
            http.clone(),
            &config.build_info_url,
        ));
        let policy = PollPolicy::new(config.poll_max_attempts, config.poll_backoff_step);
        let poller = StatusPoller::new(provider, policy);

        let publisher = Arc::new(HttpTopicPublisher::new(
            http.clone(),
            &config.topic_publish_url,
        ));
        let dispatcher = Dispatcher::new(ChatWebhookClient::new(http), publisher);

        tracing::info!(
            routes = routes.len(),
            max_attempts = config.poll_max_attempts,
            backoff_step_secs = config.poll_backoff_step.as_secs(),
            max_wait_secs = policy.total_max_wait().as_secs(),
            "Relay initialized"
        );

        Ok(Self::new(poller, routes, dispatcher, &config.topic_arn))
    }

    /// Handle a raw JSON invocation payload.
    pub async fn handle_json(&self, raw: &str) -> Result<InvocationOutcome, RelayError> {
        let event: BuildEvent = serde_json::from_str(raw).map_err(|e| {
            tracing::error!(error = %e, "Rejecting malformed build event");
            RelayError::InvalidEvent(e)
        })?;
        self.handle(&event).await
    }

    /// Handle one build event end to end.
    ///
    /// Fatal errors are logged here and returned; delivery warnings are part
    /// of the successful outcome.
    pub async fn handle(&self, event: &BuildEvent) -> Result<InvocationOutcome, RelayError> {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "invocation",
            invocation_id = %invocation_id,
            build_id = %event.build_id
        );

        async {
            tracing::info!(event = ?event, "Handling build event");
            let result = self.run(invocation_id, event).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Invocation failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        invocation_id: Uuid,
        event: &BuildEvent,
    ) -> Result<InvocationOutcome, RelayError> {
        let project = event.project_id();
        let endpoint = self.routes.resolve(project)?;

        let detail = self.poller.poll(&event.build_id).await?;

        let message = MessageFormatter::format(event, &detail);
        tracing::info!(
            project,
            status = %detail.status,
            color = %message.color,
            message = %message.short_text,
            "Build finished"
        );

        let dispatch = self
            .dispatcher
            .dispatch(
                endpoint,
                &message.chat_payload(),
                &self.topic_arn,
                &message.subject,
                &message.detail_text,
            )
            .await?;

        if !dispatch.warnings.is_empty() {
            tracing::warn!(
                warnings = dispatch.warnings.len(),
                "Invocation completed with degraded delivery"
            );
        }

        Ok(InvocationOutcome {
            invocation_id,
            build_id: event.build_id.clone(),
            project: project.to_string(),
            status: detail.status.to_string(),
            dispatch,
        })
    }
}
