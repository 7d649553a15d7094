use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub const SERVER_ERROR_MESSAGE: &str = "server error";

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("'{0}' is required")]
    MissingField(&'static str),

    #[error("'rating' must be a number between 0 and 5")]
    InvalidRating(String),

    #[error("'url' must be a valid URL")]
    InvalidUrl(String),

    #[error("Request body must contain either 'title', 'url', 'description' or 'rating'")]
    EmptyUpdate,

    #[error("Bookmark not found")]
    NotFound(i64),

    /// The path segment is not a bookmark id at all.
    #[error("Bookmark not found")]
    UnknownId(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

pub type BookmarkResult<T> = std::result::Result<T, BookmarkError>;

impl BookmarkError {
    pub fn is_validation(&self) -> bool {
        use BookmarkError::*;
        matches!(
            self,
            MissingField(_) | InvalidRating(_) | InvalidUrl(_) | EmptyUpdate | InvalidBody(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BookmarkError::NotFound(_) | BookmarkError::UnknownId(_) => StatusCode::NOT_FOUND,
            BookmarkError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to hand back to a caller. Store failures never leak detail.
    pub fn public_message(&self) -> String {
        match self {
            BookmarkError::Store(_) => SERVER_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorMessage,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            error: ErrorMessage {
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for BookmarkError {
    fn into_response(self) -> Response {
        match &self {
            BookmarkError::Store(e) => {
                tracing::error!(error = %crate::unpack_error(&**e), "bookmark store failure");
            }
            e if e.is_validation() => tracing::debug!(reason = ?e, "rejected bookmark request"),
            _ => {}
        }
        (self.status(), Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}
