use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("AI provider error: {0}")]
    Ai(#[from] AiError),

    #[error("Scrape failed: {0}")]
    Scrape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Every strategy in the chain came back empty.
    #[error("No data available for {0}, consider retrying later")]
    NoData(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure modes of the AI generation endpoint.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider not configured (missing or placeholder API key)")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("endpoint returned no content")]
    NoData,

    #[error("no valid platform entries ({rejected} rejected)")]
    NoValidEntries { rejected: usize },
}

impl AiError {
    /// Only transport failures and non-success statuses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::Transport(_) | AiError::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoData(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Busy(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
