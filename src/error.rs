use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Enumerated failure kinds for the live-fetch collaborator. The engine
/// never sees these: the caller logs the error and runs on an empty batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("robots.txt could not be retrieved for {0}")]
    RobotsUnavailable(String),

    #[error("robots.txt disallows fetching {0}")]
    Disallowed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("response could not be parsed: {0}")]
    ParseFailure(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
