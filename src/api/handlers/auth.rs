use axum::{
    Json,
    extract::State,
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState,
    api::schema::{
        ApiResponse, ChangePasswordRequest, EmptyResponse, LoginRequest, LoginResponse,
        ProfileResponse,
    },
    error::AppError,
    middleware::CurrentSession,
    utils::{success_to_api_response, success_with_message},
};

/// 用户登录
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("用户名和密码不能为空".into()));
    }

    let payload = state.auth.login(&req.username, &req.password).await?;
    Ok(success_to_api_response(payload))
}

/// 登出当前会话
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ApiResponse<EmptyResponse>>, AppError> {
    state.auth.logout(&session.token).await?;
    Ok(success_with_message(EmptyResponse {}, "已登出"))
}

/// 当前用户信息
#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ApiResponse<ProfileResponse>>, AppError> {
    let profile = state.auth.profile(&session).await?;
    Ok(success_to_api_response(profile))
}

/// 修改密码，成功后需要重新登录
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    WithRejection(Json(req), _): WithRejection<Json<ChangePasswordRequest>, AppError>,
) -> Result<Json<ApiResponse<EmptyResponse>>, AppError> {
    if req.old_password.is_empty() {
        return Err(AppError::Validation("原密码不能为空".into()));
    }
    if req.new_password.chars().count() < 6 {
        return Err(AppError::Validation("新密码长度不能少于6个字符".into()));
    }

    state
        .auth
        .change_password(session.user_id, &req.old_password, &req.new_password)
        .await?;
    Ok(success_with_message(EmptyResponse {}, "密码修改成功，请重新登录"))
}
