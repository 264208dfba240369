use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scrape_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("search phrase must not be empty")]
    EmptyQuery,

    #[error("search unavailable: all {pages} result pages failed to load")]
    SearchUnavailable { pages: u32 },

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("invalid product id '{0}'")]
    InvalidProductId(String),

    #[error("review harvest aborted: {0}")]
    Harvest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EmptyQuery | AppError::InvalidProductId(_) => StatusCode::BAD_REQUEST,
            AppError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SearchUnavailable { .. } | AppError::Common(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Harvest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "ok": false, "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
