use std::collections::HashMap;
use std::time::Duration;

/// Relay configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Build-info endpoint answering BatchGetBuilds-style queries
    pub build_info_url: String,

    /// Topic publish endpoint
    pub topic_publish_url: String,

    /// Topic the detail summary is published to
    pub topic_arn: String,

    /// Project id → chat webhook URL
    pub routes: HashMap<String, String>,

    /// Poll attempts before giving up on a build (default: 3)
    pub poll_max_attempts: u32,

    /// Linear backoff step; attempt `i` sleeps `i * step` (default: 10s)
    pub poll_backoff_step: Duration,

    /// Timeout applied to every outbound HTTP request (default: 10s)
    pub http_timeout: Duration,
}

impl RelayConfig {
    /// Load configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        let route_json = required("ROUTE_TABLE")?;
        let routes: HashMap<String, String> = serde_json::from_str(&route_json)
            .map_err(|e| anyhow::anyhow!("ROUTE_TABLE must be a JSON object of strings: {e}"))?;

        let poll_max_attempts: u32 = lookup("POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("POLL_MAX_ATTEMPTS must be a valid u32"))?;
        if poll_max_attempts == 0 {
            anyhow::bail!("POLL_MAX_ATTEMPTS must be greater than zero");
        }

        let poll_backoff_step_secs: u64 = lookup("POLL_BACKOFF_STEP_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("POLL_BACKOFF_STEP_SECS must be a valid u64"))?;

        let http_timeout_secs: u64 = lookup("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a valid u64"))?;
        if http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            build_info_url: required("BUILD_INFO_URL")?,
            topic_publish_url: required("TOPIC_PUBLISH_URL")?,
            topic_arn: required("SNS_TOPIC_ARN")?,
            routes,
            poll_max_attempts,
            poll_backoff_step: Duration::from_secs(poll_backoff_step_secs),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("BUILD_INFO_URL", "http://build-info.local/batch-get-builds"),
            ("TOPIC_PUBLISH_URL", "http://topics.local/publish"),
            ("SNS_TOPIC_ARN", "arn:aws:sns:eu-west-1:123456789012:builds"),
            (
                "ROUTE_TABLE",
                r#"{"proj-a": "https://hooks.example.com/a", "proj-b": "https://hooks.example.com/b"}"#,
            ),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> anyhow::Result<RelayConfig> {
        RelayConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.poll_max_attempts, 3);
        assert_eq!(config.poll_backoff_step, Duration::from_secs(10));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes["proj-b"], "https://hooks.example.com/b");
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("POLL_MAX_ATTEMPTS", "5");
        env.insert("POLL_BACKOFF_STEP_SECS", "0");
        env.insert("HTTP_TIMEOUT_SECS", "2");
        let config = load(&env).unwrap();
        assert_eq!(config.poll_max_attempts, 5);
        assert_eq!(config.poll_backoff_step, Duration::ZERO);
        assert_eq!(config.http_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_required_variable() {
        let mut env = base_env();
        env.remove("SNS_TOPIC_ARN");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("SNS_TOPIC_ARN"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut env = base_env();
        env.insert("POLL_MAX_ATTEMPTS", "0");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_zero_http_timeout_rejected() {
        let mut env = base_env();
        env.insert("HTTP_TIMEOUT_SECS", "0");
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn test_route_table_must_be_json_object() {
        let mut env = base_env();
        env.insert("ROUTE_TABLE", r#"["https://hooks.example.com/a"]"#);
        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("ROUTE_TABLE"));
    }
}
