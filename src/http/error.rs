//! JSON error responses.
//!
//! Every failure leaves the API as `{"message": "..."}` with a status taken
//! from the [`ShopError`] variant. Server-side failures are logged and their
//! details withheld from the client.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::ShopError;

#[derive(Debug)]
pub struct ApiError(pub ShopError);

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ShopError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(ShopError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShopError::NotFound(_) => StatusCode::NOT_FOUND,
            ShopError::Duplicate(_) | ShopError::EmailTaken | ShopError::AlreadyReviewed => StatusCode::CONFLICT,
            ShopError::InvalidCredentials | ShopError::MissingToken | ShopError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ShopError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShopError::InsufficientStock(_)
            | ShopError::InvalidCode
            | ShopError::Expired
            | ShopError::Validation(_) => StatusCode::BAD_REQUEST,
            ShopError::Storage(_) | ShopError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "Request error");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
