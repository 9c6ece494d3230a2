use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::extract::{CurrentUser, JsonBody};
use super::{parse_id, ApiError, AppState};
use crate::domain::aggregates::{Address, NewAddress, UserProfile};
use crate::services::ProfileUpdate;

pub(super) async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.services.users.update_profile(user.id, update).await?))
}

pub(super) async fn add_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(address): JsonBody<NewAddress>,
) -> Result<(StatusCode, Json<Vec<Address>>), ApiError> {
    let addresses = state.services.users.add_address(user.id, address).await?;
    Ok((StatusCode::CREATED, Json(addresses)))
}

pub(super) async fn delete_address(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Address>>, ApiError> {
    let address_id = parse_id(&id, "Address not found")?;
    Ok(Json(state.services.users.delete_address(user.id, address_id).await?))
}
