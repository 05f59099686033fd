use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    api::schema::{ApiResponse, CreateRoleRequest, CreatedId, EmptyResponse},
    database::entities::{PermissionEntity, RoleEntity},
    error::AppError,
    utils::{success_to_api_response, success_with_message},
};

/// 角色列表
#[axum::debug_handler]
pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RoleEntity>>>, AppError> {
    Ok(success_to_api_response(state.rbac.list_roles().await?))
}

#[axum::debug_handler]
pub async fn create_role(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateRoleRequest>, AppError>,
) -> Result<Json<ApiResponse<CreatedId>>, AppError> {
    let id = state.rbac.create_role(req).await?;
    Ok(success_with_message(CreatedId { id }, "创建成功"))
}

#[axum::debug_handler]
pub async fn delete_role(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<ApiResponse<EmptyResponse>>, AppError> {
    state.rbac.delete_role(id).await?;
    Ok(success_with_message(EmptyResponse {}, "删除成功"))
}

/// 权限列表
#[axum::debug_handler]
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PermissionEntity>>>, AppError> {
    Ok(success_to_api_response(state.rbac.list_permissions().await?))
}
