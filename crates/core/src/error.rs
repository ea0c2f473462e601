use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while ingesting or retrieving over a source.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported input type: {0}")]
    UnsupportedInput(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("section tree error: {0}")]
    Tree(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] notebook_gateway::GatewayError),

    #[error("cache error: {0}")]
    Cache(#[from] notebook_cache::CacheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("pdfium error: {0}")]
    Pdfium(String),
}
