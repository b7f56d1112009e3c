//! Connection settings for the control plane.

use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9000";
pub const DEFAULT_API_VERSION: &str = "2023-10-01-preview";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base URL of the control plane, without the `/apis/...` suffix.
    pub endpoint: String,
    /// Wait between two polls of a long-running operation.
    pub poll_interval: Duration,
    /// Value of the `api-version` query parameter.
    pub api_version: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}
