use axum::extract::State;
use axum::Json;

use super::extract::AdminUser;
use super::{ApiError, AppState};
use crate::services::DashboardStats;

pub(super) async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.services.stats.get_dashboard_stats().await?))
}
