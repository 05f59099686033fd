use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures_util::future::BoxFuture;

use crate::{
    AppState,
    auth::{Identity, Requirement, authorize, bearer_token},
    cache::Session,
    error::AppError,
};

/// 解析调用方身份并写入请求扩展
///
/// 没有令牌或会话不存在时记为匿名，由后续的策略决定是否拒绝；
/// 缓存故障直接返回错误，不会降级为匿名或放行。
pub async fn resolve_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match bearer_token(req.headers()) {
        Some(token) => Identity::from(state.sessions.get(&token).await?),
        None => Identity::Anonymous,
    };

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn check(req: &Request, requirement: Requirement) -> Result<(), AppError> {
    // 未经过 resolve_session 的请求按匿名处理
    let identity = req
        .extensions()
        .get::<Identity>()
        .unwrap_or(&Identity::Anonymous);
    authorize(identity, requirement, Utc::now()).map(|_| ())
}

/// 要求已登录
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    check(&req, Requirement::Authenticated)?;
    Ok(next.run(req).await)
}

/// 要求持有指定权限（同时包含登录检查），用于 `axum::middleware::from_fn`
pub fn require_permission(
    code: &'static str,
) -> impl Fn(Request, Next) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| {
        Box::pin(async move {
            if let Err(e) = check(&req, Requirement::Permission(code)) {
                tracing::debug!("Access to {} denied: {}", req.uri().path(), e);
                return e.into_response();
            }
            next.run(req).await
        })
    }
}

/// 处理函数中获取当前会话，自带登录检查
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .unwrap_or(&Identity::Anonymous);
        let session = authorize(identity, Requirement::Authenticated, Utc::now())?;
        Ok(CurrentSession(session.clone()))
    }
}
