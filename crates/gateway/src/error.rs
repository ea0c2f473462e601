use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error categories the orchestrator switches on per the error-handling design:
/// transient errors are retried by the Gateway itself, permanent ones are
/// surfaced immediately, and schema failures are retried a small bound before
/// becoming fatal.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transient error ({category}): {message}")]
    Transient { category: String, message: String },

    #[error("permanent error ({status}): {message}")]
    Permanent { status: String, message: String },

    #[error("response failed schema validation: {0}")]
    SchemaInvalid(String),

    #[error("task timed out after {0}s")]
    Timeout(u64),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("config error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether this error should be retried by the Gateway's own retry loop.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            GatewayError::Transient { .. } | GatewayError::Timeout(_)
        )
    }
}
