//! Connection parameters.
//!
//! The client never reads files or the environment itself; whoever embeds it
//! (the CLI, a board's startup code) builds a [`ConnectionConfig`] and hands
//! it to [`Connection::open`](crate::Connection::open).

use crate::ConnectionError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "api.local";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how to reach the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server address (DNS name or IP).
    pub host: String,
    pub port: u16,
    /// Name the server certificate is issued for; also sent as SNI.
    pub server_name: String,
    /// Maximum seconds to wait on any single read or write.
    pub timeout_secs: u64,
    pub user_agent: String,
    pub credentials: Credentials,
    /// PEM-encoded CA certificate(s) trusted for the server. When absent the
    /// platform's root store is used.
    pub server_cert: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            server_name: DEFAULT_HOST.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("servercom/", env!("CARGO_PKG_VERSION")).into(),
            credentials: Credentials::default(),
            server_cert: None,
        }
    }
}

impl ConnectionConfig {
    /// Default endpoint with the given team credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_server_cert(mut self, pem: impl Into<String>) -> Self {
        self.server_cert = Some(pem.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `host:port`, for logs and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject configurations that cannot possibly connect.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        if self.host.trim().is_empty() {
            return Err(ConnectionError::InvalidConfig("host is empty".into()));
        }
        if self.port == 0 {
            return Err(ConnectionError::InvalidConfig("port must be non-zero".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConnectionError::InvalidConfig(
                "timeout_secs must be at least 1".into(),
            ));
        }
        if self.credentials.team_name.is_empty() {
            return Err(ConnectionError::InvalidConfig("team_name is empty".into()));
        }
        if self.credentials.team_name.contains(':') {
            return Err(ConnectionError::InvalidConfig(
                "team_name cannot contain ':'".into(),
            ));
        }
        Ok(())
    }
}

/// Team name and secret issued by the competition organizers.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub team_name: String,
    pub team_secret: String,
}

impl Credentials {
    pub fn new(team_name: impl Into<String>, team_secret: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            team_secret: team_secret.into(),
        }
    }

    /// `Authorization` header value (RFC 7617 Basic).
    pub fn basic_auth(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.team_name, self.team_secret));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("team_name", &self.team_name)
            .field("team_secret", &"<redacted>")
            .finish()
    }
}
