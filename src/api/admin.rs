use super::AppState;
use crate::error::ApiError;
use crate::store::DashboardStats;
use axum::{extract::State, Json};

/// GET /api/admin/dashboard (Admin only)
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.db.dashboard()?))
}
