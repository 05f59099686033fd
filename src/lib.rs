use std::sync::Arc;

use api::operations::RbacService;
use auth::AuthService;
use cache::{CacheBackend, SessionStore};
use config::Config;
use database::repositories::{RbacRepository, UserRepository};

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod utils;

/// 应用状态，所有可变状态都在缓存与数据库中
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub auth: AuthService,
    pub rbac: RbacService,
}

impl AppState {
    pub fn new(
        config: Config,
        cache: Arc<dyn CacheBackend>,
        users: Arc<dyn UserRepository>,
        rbac: Arc<dyn RbacRepository>,
    ) -> Self {
        let timeout = config.backend_timeout();
        let sessions = SessionStore::new(cache, config.session_ttl(), timeout);
        let auth = AuthService::new(users.clone(), sessions.clone(), config.bcrypt_cost, timeout);
        let rbac = RbacService::new(rbac, users, sessions.clone(), config.bcrypt_cost, timeout);

        Self {
            config: Arc::new(config),
            sessions,
            auth,
            rbac,
        }
    }
}
