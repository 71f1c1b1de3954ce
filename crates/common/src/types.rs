use serde::{Deserialize, Serialize};

/// Separator between the project name and the run suffix in a build id
/// (e.g. `opencast-build:7f0c…`).
pub const BUILD_ID_DELIMITER: char = ':';

/// Incoming invocation payload describing the build that just finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEvent {
    pub build_id: String,
    pub build_url: String,
    pub trigger_branch_or_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_branch_or_tag: Option<String>,
}

impl BuildEvent {
    /// Project name: everything before the first delimiter of the build id.
    pub fn project_id(&self) -> &str {
        project_id(&self.build_id)
    }

    /// Revision label shown in notifications, e.g. `main` or `develop 1.4.x`.
    pub fn revision_label(&self) -> String {
        match self.image_branch_or_tag.as_deref() {
            Some(image) if !image.is_empty() => {
                format!("{} {}", self.trigger_branch_or_tag, image)
            }
            _ => self.trigger_branch_or_tag.clone(),
        }
    }
}

/// Derive the project id from a build id.
///
/// Build ids without a delimiter are treated as a bare project name.
pub fn project_id(build_id: &str) -> &str {
    build_id
        .split_once(BUILD_ID_DELIMITER)
        .map_or(build_id, |(project, _)| project)
}

/// Status reported by the build service.
///
/// Unknown values are preserved verbatim in `Other` so they still show up in
/// notifications.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Succeeded,
    Failed,
    Fault,
    TimedOut,
    Stopped,
    #[default]
    InProgress,
    Other(String),
}

impl BuildStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Succeeded)
    }

    /// Whether this status can describe a finished build.
    ///
    /// `IN_PROGRESS` (also what a missing `buildStatus` decodes to) and an
    /// empty string cannot.
    pub fn is_final(&self) -> bool {
        match self {
            BuildStatus::InProgress => false,
            BuildStatus::Other(raw) => !raw.trim().is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildStatus::Succeeded => "SUCCEEDED",
            BuildStatus::Failed => "FAILED",
            BuildStatus::Fault => "FAULT",
            BuildStatus::TimedOut => "TIMED_OUT",
            BuildStatus::Stopped => "STOPPED",
            BuildStatus::InProgress => "IN_PROGRESS",
            BuildStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for BuildStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "SUCCEEDED" => BuildStatus::Succeeded,
            "FAILED" => BuildStatus::Failed,
            "FAULT" => BuildStatus::Fault,
            "TIMED_OUT" => BuildStatus::TimedOut,
            "STOPPED" => BuildStatus::Stopped,
            "IN_PROGRESS" => BuildStatus::InProgress,
            _ => BuildStatus::Other(raw),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(raw: &str) -> Self {
        BuildStatus::from(raw.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build record as returned by the build service.
///
/// Only completion and status are interpreted; every other field (phases,
/// timestamps, log links) is carried through untouched for the detail dump.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildDetail {
    #[serde(rename = "buildComplete", default)]
    pub complete: bool,
    #[serde(rename = "buildStatus", default)]
    pub status: BuildStatus,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BuildDetail {
    /// Build id echoed back by the service, if present.
    pub fn id(&self) -> Option<&str> {
        self.extra.get("id").and_then(|v| v.as_str())
    }
}

/// Attachment color used in chat notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Success,
    Failure,
}

impl StatusColor {
    /// Binary mapping: anything but `SUCCEEDED` is failure-colored.
    pub fn for_status(status: &BuildStatus) -> Self {
        if status.is_success() {
            StatusColor::Success
        } else {
            StatusColor::Failure
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            StatusColor::Success => "#49C39E",
            StatusColor::Failure => "#e62727",
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.hex())
    }
}

/// Chat webhook body: `{"attachments":[{"color":..,"text":..}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub attachments: Vec<ChatAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAttachment {
    pub color: String,
    pub text: String,
}

/// Rendered notification, created once polling has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub color: StatusColor,
    /// One-line summary with a chat-style link to the build console.
    pub short_text: String,
    /// Multi-line summary for the topic, including the full build dump.
    pub detail_text: String,
    /// Topic subject, already bounded in length.
    pub subject: String,
}

impl NotificationMessage {
    pub fn chat_payload(&self) -> ChatPayload {
        ChatPayload {
            attachments: vec![ChatAttachment {
                color: self.color.hex().to_string(),
                text: self.short_text.clone(),
            }],
        }
    }
}

/// Non-fatal delivery problems. Logged and reported, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryWarning {
    /// Webhook answered with a non-2xx status.
    ChatDeliveryDegraded { status: u16 },
    /// Topic publish failed for any reason.
    TopicPublishFailed { reason: String },
}

impl std::fmt::Display for DeliveryWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryWarning::ChatDeliveryDegraded { status } => {
                write!(f, "chat webhook answered with status {status}")
            }
            DeliveryWarning::TopicPublishFailed { reason } => {
                write!(f, "topic publish failed: {reason}")
            }
        }
    }
}

/// Outcome of one dispatch: what each channel did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DispatchResult {
    /// HTTP status returned by the chat webhook, if a response was received.
    pub chat_status: Option<u16>,
    /// Message id returned by the topic provider, if the publish succeeded.
    pub topic_message_id: Option<String>,
    pub warnings: Vec<DeliveryWarning>,
}

impl DispatchResult {
    pub fn chat_delivered(&self) -> bool {
        self.chat_status.is_some_and(|s| (200..300).contains(&s))
    }

    pub fn topic_published(&self) -> bool {
        self.topic_message_id.is_some()
    }
}
