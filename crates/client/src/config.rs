//! Client configuration.

use std::time::Duration;

/// Known front-end origins and the API base they talk to.
///
/// Matching is by substring, first hit wins; `test` doubles as the fallback.
const ORIGIN_MAP: &[(&str, &str)] = &[
    ("localhost", "http://localhost:8081/api"),
    ("test", "http://localhost:8081/api"),
    ("https://logistic.kg", "https://logistic.kg/api/"),
];

const FALLBACK_ORIGIN: &str = "test";

/// Some report endpoints take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the API base for the origin the UI is served from.
    pub fn for_origin(origin: &str) -> Self {
        Self::new(base_for_origin(origin))
    }

    /// Read configuration from the environment.
    ///
    /// - `FREIGHTDESK_API_URL`: explicit API base
    /// - `FREIGHTDESK_ORIGIN`: origin resolved through the origin map
    /// - `FREIGHTDESK_TIMEOUT_SECS`: request timeout in seconds
    pub fn from_env() -> Self {
        let mut config = match (
            std::env::var("FREIGHTDESK_API_URL"),
            std::env::var("FREIGHTDESK_ORIGIN"),
        ) {
            (Ok(url), _) if !url.trim().is_empty() => Self::new(url),
            (_, Ok(origin)) if !origin.trim().is_empty() => Self::for_origin(&origin),
            _ => {
                tracing::warn!("FREIGHTDESK_API_URL not set; using local development API");
                Self::default()
            }
        };

        if let Ok(raw) = std::env::var("FREIGHTDESK_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "invalid FREIGHTDESK_TIMEOUT_SECS; keeping default"),
            }
        }

        config
    }

    /// Join an endpoint path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_origin(FALLBACK_ORIGIN)
    }
}

fn base_for_origin(origin: &str) -> &'static str {
    ORIGIN_MAP
        .iter()
        .find(|(key, _)| origin.contains(key))
        .or_else(|| ORIGIN_MAP.iter().find(|(key, _)| *key == FALLBACK_ORIGIN))
        .map(|(_, base)| *base)
        .unwrap_or("http://localhost:8081/api")
}

fn normalize_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}
