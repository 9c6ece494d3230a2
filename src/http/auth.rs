use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::extract::JsonBody;
use super::{ApiError, AppState};
use crate::services::{AuthSession, LoginRequest, RegisterRequest};

pub(super) async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let session = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub(super) async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    Ok(Json(state.services.auth.login(request).await?))
}
