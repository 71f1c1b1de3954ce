use std::sync::Arc;
use std::time::Duration;

use buildrelay_common::error::RelayError;
use buildrelay_common::types::BuildDetail;

use crate::provider::BuildStatusProvider;

/// Attempt budget and backoff for polling one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Number of provider queries before giving up.
    pub max_attempts: u32,

    /// Linear backoff step: attempt `i` (1-based) sleeps `i * backoff_step`
    /// before querying.
    pub backoff_step: Duration,
}

impl PollPolicy {
    /// 3 attempts sleeping 10s, 20s, 30s. Total max wait: 60 seconds.
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        backoff_step: Duration::from_secs(10),
    };

    pub fn new(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// Sleep before the given attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }

    /// Sum of all backoff sleeps, saturating at `Duration::MAX`.
    pub fn total_max_wait(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Polls the build-status provider until a build reports completion or the
/// attempt budget runs out.
pub struct StatusPoller {
    provider: Arc<dyn BuildStatusProvider>,
    policy: PollPolicy,
}

impl StatusPoller {
    pub fn new(provider: Arc<dyn BuildStatusProvider>, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Poll with the configured policy.
    pub async fn poll(&self, build_id: &str) -> Result<BuildDetail, RelayError> {
        let policy = self.policy;
        self.poll_with(build_id, policy.max_attempts, |attempt| {
            policy.delay_for_attempt(attempt)
        })
        .await
    }

    /// Poll with an explicit attempt budget and backoff function.
    ///
    /// Returns the first record that reports completion. Fails with
    /// `BuildPollTimeout` carrying the last record seen once `max_attempts`
    /// queries came back incomplete. Provider errors abort immediately, as
    /// does a record that claims completion without a final status.
    pub async fn poll_with<B>(
        &self,
        build_id: &str,
        max_attempts: u32,
        backoff: B,
    ) -> Result<BuildDetail, RelayError>
    where
        B: Fn(u32) -> Duration,
    {
        let mut last_seen: Option<BuildDetail> = None;

        for attempt in 1..=max_attempts {
            let delay = backoff(attempt);
            tokio::time::sleep(delay).await;

            let detail = self.provider.fetch(build_id).await?;

            tracing::info!(
                build_id,
                attempt,
                max_attempts,
                slept_secs = delay.as_secs_f64(),
                complete = detail.complete,
                status = %detail.status,
                "Polled build status"
            );

            if detail.complete {
                if !detail.status.is_final() {
                    return Err(RelayError::Provider(format!(
                        "build {build_id} reported complete without a final status (buildStatus: {:?})",
                        detail.status.as_str()
                    )));
                }
                return Ok(detail);
            }
            last_seen = Some(detail);
        }

        tracing::error!(
            build_id,
            max_attempts,
            "Build did not complete within the attempt budget"
        );

        Err(RelayError::BuildPollTimeout {
            build_id: build_id.to_string(),
            attempts: max_attempts,
            last_seen: last_seen.map(Box::new),
        })
    }
}
