//! Error types shared by the scraping infrastructure.
//!
//! These cover failures in the outbound transports (plain HTTP and WebDriver).
//! Application-specific errors are defined in the application crate and wrap
//! `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {status} for {url}")]
    Upstream {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("webdriver error: {0}")]
    WebDriver(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<fantoccini::error::NewSessionError> for CommonError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        CommonError::WebDriver(format!("failed to start browser session: {e}"))
    }
}

impl From<fantoccini::error::CmdError> for CommonError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        CommonError::WebDriver(e.to_string())
    }
}
