use axum::{
    Router,
    handler::Handler,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{
    AppState,
    api::handlers::{auth, health, roles, stats, users},
    middleware::{log_errors, require_auth, require_permission, resolve_session, trace_requests},
};

/// 认证相关路由，以及只要求登录的统计接口
fn auth_routes() -> Router<AppState> {
    let public = Router::new().route("/auth/login", post(auth::login));

    let authenticated = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route("/auth/change-password", post(auth::change_password))
        .route("/stats/dashboard", get(stats::dashboard))
        .route_layer(from_fn(require_auth));

    public.merge(authenticated)
}

/// 用户、角色、权限管理路由，每个操作要求各自的权限
fn rbac_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(users::list_users.layer(from_fn(require_permission("user:list"))))
                .post(users::create_user.layer(from_fn(require_permission("user:create")))),
        )
        .route(
            "/users/{id}",
            put(users::update_user.layer(from_fn(require_permission("user:update"))))
                .delete(users::delete_user.layer(from_fn(require_permission("user:delete")))),
        )
        .route(
            "/users/{id}/reset-password",
            post(users::reset_password.layer(from_fn(require_permission("user:update")))),
        )
        .route(
            "/roles",
            get(roles::list_roles.layer(from_fn(require_permission("role:list"))))
                .post(roles::create_role.layer(from_fn(require_permission("role:create")))),
        )
        .route(
            "/roles/{id}",
            delete(roles::delete_role.layer(from_fn(require_permission("role:delete")))),
        )
        .route(
            "/permissions",
            get(roles::list_permissions.layer(from_fn(require_permission("permission:list")))),
        )
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if cfg!(debug_assertions) {
        tracing::debug!("Adding permissive CORS layer for development mode");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 创建完整路由
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth_routes())
        .merge(rbac_routes())
        // 所有 API 请求先解析会话，再由各路由的策略判定
        .layer(from_fn_with_state(state.clone(), resolve_session));

    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(base, api)
    };

    router
        .route("/health", get(health::health))
        .layer(from_fn(log_errors))
        .layer(from_fn(trace_requests))
        .layer(cors_layer(&state))
        .with_state(state)
}
