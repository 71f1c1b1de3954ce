//! Message formatter — turns a finished build into notification text.
//!
//! Produces three renderings from the same inputs:
//! 1. A one-line chat summary with a link to the build console
//! 2. A multi-line topic body ending in a JSON dump of the build record
//! 3. A bounded topic subject
//!
//! Pure: no I/O, same inputs always give the same output.

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;

use buildrelay_common::types::{BuildDetail, BuildEvent, NotificationMessage, StatusColor};

/// Longest accepted topic subject; pub/sub subjects must stay under 100 characters.
pub const TOPIC_SUBJECT_MAX_CHARS: usize = 99;

/// Stateless renderer for build notifications.
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render the notification for a completed build.
    pub fn format(event: &BuildEvent, detail: &BuildDetail) -> NotificationMessage {
        let project = event.project_id();
        let label = event.revision_label();
        let status = detail.status.as_str();

        let build_link = format!("<{}|{}@{}>", event.build_url, project, label);
        let short_text = format!("Codebuild complete for {build_link}, status: {status}");

        let detail_text = format!(
            "Status: {status}\nRevision: {label}\nBuild: {}\n\nBuild detail:\n{}",
            event.build_url,
            Self::detail_dump(detail)
        );

        let subject = Self::bounded_subject(&format!("[codebuild] {project} build {status}!"));

        NotificationMessage {
            color: StatusColor::for_status(&detail.status),
            short_text,
            detail_text,
            subject,
        }
    }

    /// Pretty JSON dump of the full build record, with epoch timestamps
    /// rendered as RFC 3339 strings.
    pub fn detail_dump(detail: &BuildDetail) -> String {
        let mut value = match serde_json::to_value(detail) {
            Ok(v) => v,
            Err(e) => return format!("<unserializable build detail: {e}>"),
        };
        render_timestamps(&mut value);
        serde_json::to_string_pretty(&value).unwrap_or_else(|e| e.to_string())
    }

    /// Truncate a subject to `TOPIC_SUBJECT_MAX_CHARS` on a char boundary and
    /// flatten line breaks, which pub/sub subjects reject.
    fn bounded_subject(raw: &str) -> String {
        raw.chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .take(TOPIC_SUBJECT_MAX_CHARS)
            .collect()
    }
}

/// Replace numeric `*Time` fields (epoch seconds) with their string form.
fn render_timestamps(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.ends_with("Time") {
                    if let Some(rendered) = field.as_f64().and_then(epoch_to_rfc3339) {
                        *field = Value::String(rendered);
                        continue;
                    }
                }
                render_timestamps(field);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(render_timestamps),
        _ => {}
    }
}

fn epoch_to_rfc3339(secs: f64) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    // Build service timestamps carry millisecond precision.
    let millis = (secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}
