use thiserror::Error;

use crate::types::BuildDetail;

/// Fatal errors. Any of these aborts the invocation and is surfaced to the
/// invoking runtime.
///
/// Non-fatal delivery problems live in [`crate::types::DeliveryWarning`].
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(
        "Build {build_id} not complete after {attempts} attempts, last seen: {}",
        render_last_seen(.last_seen)
    )]
    BuildPollTimeout {
        build_id: String,
        attempts: u32,
        last_seen: Option<Box<BuildDetail>>,
    },

    #[error("No chat webhook configured for project '{0}'")]
    UnknownProject(String),

    #[error("Build {0} not found in build service response")]
    BuildNotFound(String),

    #[error("Build service error: {0}")]
    Provider(String),

    #[error("Chat webhook request failed: {0}")]
    ChatTransport(#[source] reqwest::Error),

    #[error("Invalid build event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn render_last_seen(last_seen: &Option<Box<BuildDetail>>) -> String {
    match last_seen {
        Some(detail) => serde_json::to_string(detail).unwrap_or_else(|e| e.to_string()),
        None => "nothing".to_string(),
    }
}
