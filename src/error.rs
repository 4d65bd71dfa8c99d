use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    /// Non-success response from the backend. Holds the body text verbatim.
    #[error("{0}")]
    Request(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
