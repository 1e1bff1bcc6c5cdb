//! Connection settings supplied by the host application.
//!
//! The core never reads the environment or any global configuration; the
//! host loads these values however it likes (they deserialize with serde)
//! and passes them to `WpClient::connect`.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Endpoint and account used to authenticate a `WpClient`.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Base of the REST API, e.g. `https://example.com/wp-json/`.
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Per-request timeout applied by `UreqTransport`.
    #[serde(rename = "timeout_secs", default = "default_timeout", with = "secs")]
    pub timeout: Duration,
}

impl Config {
    pub fn new(endpoint: &str, username: &str, password: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            timeout: default_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint with trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
