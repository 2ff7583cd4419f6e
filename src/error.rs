use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout for URL: {0}")]
    RequestTimeout(String),

    #[error("HTTP error {status} for URL: {url}")]
    Http { status: u16, url: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("Extraction tool failed: {0}")]
    ToolFailed(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
