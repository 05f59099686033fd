use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::error::ErrorDetail;

const MAX_LOGGED_BODY: usize = 4096;

/// 统一记录 5xx 响应，便于排查缓存或数据库故障
///
/// `AppError` 产生的响应带有内部错误描述；其他来源的 5xx 记录响应体。
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    if let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>() {
        error!(
            "Server error occurred - {} {} -> {}: {}",
            method,
            path,
            response.status(),
            detail
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        "Server error occurred - {} {} -> {}, Body: {}",
        method,
        path,
        parts.status,
        String::from_utf8_lossy(&bytes)
    );

    // 重置body以便重新构建响应
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
