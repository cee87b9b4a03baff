use std::time::Duration;

use tracing::warn;

/// Default backend root used when no override is supplied.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_LOGIN_REDIRECT_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_DENIED_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Client-wide settings shared by every page.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub status_poll_interval: Duration,
    /// Pause between a successful login and the redirect, so the success message is readable.
    pub login_redirect_delay: Duration,
    /// Pause before leaving a page the user is not allowed to see.
    pub denied_redirect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            login_redirect_delay: DEFAULT_LOGIN_REDIRECT_DELAY,
            denied_redirect_delay: DEFAULT_DENIED_REDIRECT_DELAY,
        }
    }
}

impl ClientConfig {
    /// Builds a config from optional raw overrides, e.g. values baked in at
    /// compile time with `option_env!`. Unparseable values keep the default.
    pub fn from_overrides(api_base_url: Option<&str>, request_timeout_secs: Option<&str>) -> Self {
        let mut config = Self::default();

        if let Some(url) = api_base_url.map(str::trim).filter(|u| !u.is_empty()) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = request_timeout_secs {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid request timeout '{raw}', keeping default"),
            }
        }

        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base_url, endpoint)
    }
}
