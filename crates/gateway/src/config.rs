use serde::{Deserialize, Serialize};

/// Configuration for the External Service Gateway (§4.6, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Global max-in-flight permits across all remote-service calls (default: 3).
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Maximum retry attempts for a task on transient failure (default: 3).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Maximum retry attempts for a schema-invalid response before it's
    /// surfaced as a fatal task error (§4.6, default: 2).
    #[serde(default = "default_schema_retry_attempts")]
    pub schema_retry_attempts: u32,

    /// Base delay between retries, doubled each attempt (default: 2000ms).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-task timeout in seconds (default: 120).
    #[serde(default = "default_timeout_s")]
    pub timeout_s: u64,
}

fn default_max_in_flight() -> usize {
    3
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_schema_retry_attempts() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_timeout_s() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            retry_attempts: default_retry_attempts(),
            schema_retry_attempts: default_schema_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_s: default_timeout_s(),
        }
    }
}
