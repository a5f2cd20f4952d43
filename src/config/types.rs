//! Configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for the bridge transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Bridge endpoint to POST stream requests to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Speak SSE framing instead of bare lines.
    #[serde(default)]
    pub sse: bool,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8765/api/stream".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout(),
            sse: false,
        }
    }
}

/// Configuration for terminal output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Print thinking deltas as they stream.
    #[serde(default)]
    pub show_thinking: bool,
    /// Plain output without colors or truncation.
    #[serde(default)]
    pub raw: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Transport settings.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Output settings.
    #[serde(default)]
    pub display: DisplayConfig,
}
