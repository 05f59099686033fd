use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    api::schema::{
        ApiResponse, CreateUserRequest, CreatedId, EmptyResponse, ListUsersQuery,
        PaginatedResponse, ResetPasswordRequest, UpdateUserRequest,
    },
    database::entities::UserSummary,
    error::AppError,
    utils::{success_to_api_response, success_with_message},
};

/// 用户列表
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ListUsersQuery>, AppError>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserSummary>>>, AppError> {
    let page = state.rbac.list_users(query).await?;
    Ok(success_to_api_response(page))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, AppError>,
) -> Result<Json<ApiResponse<CreatedId>>, AppError> {
    let id = state.rbac.create_user(req).await?;
    Ok(success_with_message(CreatedId { id }, "创建成功"))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, AppError>,
) -> Result<Json<ApiResponse<EmptyResponse>>, AppError> {
    state.rbac.update_user(id, req).await?;
    Ok(success_with_message(EmptyResponse {}, "更新成功"))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> Result<Json<ApiResponse<EmptyResponse>>, AppError> {
    state.rbac.delete_user(id).await?;
    Ok(success_with_message(EmptyResponse {}, "删除成功"))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<ResetPasswordRequest>, AppError>,
) -> Result<Json<ApiResponse<EmptyResponse>>, AppError> {
    state.rbac.reset_password(id, req.password).await?;
    Ok(success_with_message(EmptyResponse {}, "密码重置成功"))
}
