use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Error taxonomy for the generation pipeline and its HTTP surface.
///
/// Soft failures (the photo-enhancement stages) are not represented here;
/// they are absorbed at the call site and surface as a null image instead.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("{0}")]
    Validation(String),

    #[error("AI features are not configured")]
    CapabilityUnavailable,

    #[error("{stage} failed: {source}")]
    Generation {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Portrait session not found")]
    SessionNotFound,

    #[error("Portrait session expired")]
    SessionExpired,

    #[error("Card not found")]
    CardNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type CardResult<T> = Result<T, CardError>;

impl CardError {
    pub fn generation(stage: &'static str, source: anyhow::Error) -> Self {
        CardError::Generation { stage, source }
    }
}

impl IntoResponse for CardError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CardError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CardError::CapabilityUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AI features are not configured".to_string(),
            ),
            CardError::Generation { stage, source } => {
                error!("{stage} failed: {source:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to {stage}"),
                )
            }
            CardError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "Portrait session not found".to_string(),
            ),
            CardError::SessionExpired => {
                (StatusCode::GONE, "Portrait session expired".to_string())
            }
            CardError::CardNotFound => (StatusCode::NOT_FOUND, "Card not found".to_string()),
            CardError::Database(err) => {
                error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            CardError::Storage(err) => {
                error!("Storage error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
