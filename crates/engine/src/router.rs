//! Notification routing — maps a project id to its chat webhook.
//!
//! There is no fallback endpoint: a project without a route is an error.

use std::collections::HashMap;

use reqwest::Url;

use buildrelay_common::error::RelayError;

/// Read-only project → webhook table, validated on construction.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Url>,
}

impl RouteTable {
    /// Build a route table, rejecting empty project ids and endpoints that
    /// are not absolute http(s) URLs.
    pub fn new(routes: HashMap<String, String>) -> Result<Self, RelayError> {
        let mut parsed = HashMap::with_capacity(routes.len());

        for (project, endpoint) in routes {
            if project.trim().is_empty() {
                return Err(RelayError::Config(
                    "route table contains an empty project id".to_string(),
                ));
            }

            let url = Url::parse(&endpoint).map_err(|e| {
                RelayError::Config(format!("invalid webhook URL for project '{project}': {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(RelayError::Config(format!(
                    "webhook URL for project '{project}' must be http(s), got '{}'",
                    url.scheme()
                )));
            }

            parsed.insert(project, url);
        }

        tracing::debug!(routes = parsed.len(), "Route table loaded");
        Ok(Self { routes: parsed })
    }

    /// Resolve the webhook for a project.
    pub fn resolve(&self, project_id: &str) -> Result<&Url, RelayError> {
        self.routes
            .get(project_id)
            .ok_or_else(|| RelayError::UnknownProject(project_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
