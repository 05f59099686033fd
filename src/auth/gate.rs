//! 请求级授权判定
//!
//! 一次请求的状态：未解析 → 匿名 / 已解析会话 → 放行 / 拒绝。
//! 这里只做纯判定，不访问缓存；会话的读取由中间件完成。

use axum::http::HeaderMap;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::{DateTime, Utc};

use crate::cache::Session;
use crate::error::AppError;

/// 调用方身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// 未携带令牌、令牌格式不对或会话不存在
    Anonymous,
    Resolved(Session),
}

impl Identity {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Identity::Anonymous => None,
            Identity::Resolved(session) => Some(session),
        }
    }
}

impl From<Option<Session>> for Identity {
    fn from(session: Option<Session>) -> Self {
        session.map_or(Identity::Anonymous, Identity::Resolved)
    }
}

/// 受保护操作的访问要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    /// 隐含登录要求
    Permission(&'static str),
}

/// 从 `Authorization: Bearer <token>` 中取出令牌，其他形式视为匿名
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
}

/// 按要求判定身份，通过时返回会话
pub fn authorize(
    identity: &Identity,
    requirement: Requirement,
    now: DateTime<Utc>,
) -> Result<&Session, AppError> {
    let session = identity.session().ok_or(AppError::Unauthorized)?;

    // 缓存 TTL 之外再校验一次负载中的过期时间
    if session.is_expired_at(now) {
        return Err(AppError::SessionExpired);
    }

    match requirement {
        Requirement::Authenticated => Ok(session),
        Requirement::Permission(code) if session.has_permission(code) => Ok(session),
        Requirement::Permission(_) => Err(AppError::PermissionDenied),
    }
}
