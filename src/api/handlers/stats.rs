use axum::{Json, extract::State};

use crate::{
    AppState,
    api::schema::{ApiResponse, DashboardStats},
    error::AppError,
    utils::success_to_api_response,
};

/// 仪表盘统计：用户数与角色数
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    Ok(success_to_api_response(state.rbac.dashboard().await?))
}
