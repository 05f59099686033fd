use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::CacheError;
use crate::utils::{error_codes, error_to_api_response};

/// 用户名不存在、账号停用和密码错误共用同一提示，防止枚举用户名
pub const INVALID_CREDENTIALS_MSG: &str = "用户名或密码错误";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("请先登录")]
    Unauthorized,
    #[error("会话已过期")]
    SessionExpired,
    #[error("无操作权限")]
    PermissionDenied,
    #[error("{}", INVALID_CREDENTIALS_MSG)]
    InvalidCredentials,
    #[error("原密码错误")]
    WrongPassword,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("用户名已存在")]
    UserAlreadyExists,
    #[error("角色编码已存在")]
    RoleAlreadyExists,
    #[error("cache unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error("repository unavailable: {0}")]
    Repository(#[from] sqlx::Error),
    #[error("backend call timed out")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> i32 {
        match self {
            AppError::Unauthorized => error_codes::UNAUTHORIZED,
            AppError::SessionExpired => error_codes::SESSION_EXPIRED,
            AppError::PermissionDenied => error_codes::PERMISSION_DENIED,
            AppError::InvalidCredentials => error_codes::INVALID_CREDENTIALS,
            AppError::WrongPassword => error_codes::WRONG_PASSWORD,
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::NotFound(_) => error_codes::NOT_FOUND,
            AppError::Forbidden(_) => error_codes::FORBIDDEN,
            AppError::UserAlreadyExists => error_codes::USER_EXISTS,
            AppError::RoleAlreadyExists => error_codes::ROLE_EXISTS,
            AppError::Cache(_) | AppError::Repository(_) | AppError::Timeout => {
                error_codes::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::SessionExpired | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PermissionDenied | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::WrongPassword | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UserAlreadyExists | AppError::RoleAlreadyExists => StatusCode::CONFLICT,
            AppError::Cache(_) | AppError::Repository(_) | AppError::Timeout => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 对外展示的消息，基础设施错误不暴露细节
    fn public_message(&self) -> String {
        match self {
            AppError::Cache(_) | AppError::Repository(_) | AppError::Timeout => {
                "服务暂不可用，请稍后重试".to_string()
            }
            AppError::Internal(_) => "内部服务器错误".to_string(),
            other => other.to_string(),
        }
    }
}

/// 5xx 响应携带的内部错误描述，由 `log_errors` 中间件记录
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (
            status,
            error_to_api_response::<()>(self.code(), self.public_message()),
        )
            .into_response();

        if status.is_server_error() {
            response.extensions_mut().insert(ErrorDetail(self.to_string()));
        }
        response
    }
}

// 请求体、查询参数和路径参数解析失败都按参数错误返回统一响应

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("请求体格式错误: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("查询参数错误: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("路径参数错误: {}", rejection.body_text()))
    }
}
