//! Shared harness for the integration tests: an in-memory repository,
//! a memory-backed session cache and helpers to drive the router in-process.
#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use backoffice::{
    AppState,
    cache::MemoryCache,
    config::Config,
    database::{
        NewRole, NewUser, PermissionEntity, RbacRepository, RoleEntity, UserEntity, UserRepository,
        UserSummary, UserUpdate,
    },
    router::build_router,
    utils::hash_password,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
struct Tables {
    users: Vec<UserEntity>,
    roles: Vec<RoleEntity>,
    permissions: Vec<PermissionEntity>,
    user_roles: Vec<(i64, i64)>,
    role_permissions: Vec<(i64, i64)>,
}

/// In-memory stand-in for the Postgres repositories.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    /// Existence checks answer false, as if a concurrent insert landed after the check.
    stale_existence_checks: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active user; the first user added gets id 1 (super administrator).
    pub fn add_user(&self, username: &str, password: &str) -> i64 {
        self.add_user_with_cost(username, password, TEST_BCRYPT_COST)
    }

    pub fn add_user_with_cost(&self, username: &str, password: &str, cost: u32) -> i64 {
        let hash = hash_password(password, cost).unwrap();
        let mut t = self.tables.lock().unwrap();
        let id = t.users.len() as i64 + 1;
        t.users.push(UserEntity {
            id,
            username: username.to_string(),
            password_hash: hash,
            display_name: username.to_string(),
            email: None,
            avatar: None,
            status: 1,
            created_at: Utc::now(),
            deleted_at: None,
        });
        id
    }

    pub fn set_status(&self, user_id: i64, status: i16) {
        let mut t = self.tables.lock().unwrap();
        if let Some(u) = t.users.iter_mut().find(|u| u.id == user_id) {
            u.status = status;
        }
    }

    fn permission_id(t: &mut Tables, code: &str) -> i64 {
        if let Some(p) = t.permissions.iter().find(|p| p.code == code) {
            return p.id;
        }
        let id = t.permissions.len() as i64 + 1;
        let (resource, action) = code.split_once(':').unwrap_or((code, ""));
        t.permissions.push(PermissionEntity {
            id,
            code: code.to_string(),
            name: code.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            description: None,
        });
        id
    }

    /// Adds a role granting the given permission codes.
    pub fn add_role(&self, code: &str, permissions: &[&str]) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.roles.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        t.roles.push(RoleEntity {
            id,
            code: code.to_string(),
            name: code.to_string(),
            description: None,
            status: 1,
            created_at: Utc::now(),
        });
        for perm in permissions {
            let pid = Self::permission_id(&mut t, perm);
            t.role_permissions.push((id, pid));
        }
        id
    }

    pub fn grant(&self, role_id: i64, permission: &str) {
        let mut t = self.tables.lock().unwrap();
        let pid = Self::permission_id(&mut t, permission);
        t.role_permissions.push((role_id, pid));
    }

    pub fn assign_role(&self, user_id: i64, role_id: i64) {
        self.tables.lock().unwrap().user_roles.push((user_id, role_id));
    }

    pub fn make_existence_checks_stale(&self) {
        self.stale_existence_checks.store(true, Ordering::SeqCst);
    }

    fn stale(&self) -> bool {
        self.stale_existence_checks.load(Ordering::SeqCst)
    }

    pub fn password_hash(&self, user_id: i64) -> String {
        let t = self.tables.lock().unwrap();
        t.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.password_hash.clone())
            .unwrap()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .filter(|u| u.username == username)
            .min_by_key(|u| u.deleted_at.is_some())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_password_hash(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id) {
            u.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<RoleEntity>, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        Ok(t.user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| t.roles.iter().find(|role| role.id == *r).cloned())
            .collect())
    }

    async fn permission_codes_for_role(&self, role_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        Ok(t.role_permissions
            .iter()
            .filter(|(r, _)| *r == role_id)
            .filter_map(|(_, p)| t.permissions.iter().find(|perm| perm.id == *p))
            .map(|p| p.code.clone())
            .collect())
    }
}

#[async_trait]
impl RbacRepository for MemoryRepository {
    async fn list_users(
        &self,
        page: u32,
        size: u32,
        keyword: Option<&str>,
    ) -> Result<(Vec<UserSummary>, i64), sqlx::Error> {
        let t = self.tables.lock().unwrap();
        let mut live: Vec<&UserEntity> = t
            .users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .filter(|u| keyword.is_none_or(|k| u.username.contains(k)))
            .collect();
        live.sort_by(|a, b| b.id.cmp(&a.id));

        let total = live.len() as i64;
        let list = live
            .into_iter()
            .skip(((page - 1) * size) as usize)
            .take(size as usize)
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
                display_name: u.display_name.clone(),
                email: u.email.clone(),
                status: u.status,
                created_at: u.created_at,
            })
            .collect();
        Ok((list, total))
    }

    async fn live_username_exists(&self, username: &str) -> Result<bool, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        Ok(t.users
            .iter()
            .any(|u| u.username == username && u.deleted_at.is_none()))
    }

    async fn create_user(&self, user: NewUser) -> Result<i64, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let id = t.users.len() as i64 + 1;
        t.users.push(UserEntity {
            id,
            username: user.username,
            password_hash: user.password_hash,
            display_name: user.display_name,
            email: user.email,
            avatar: None,
            status: 1,
            created_at: Utc::now(),
            deleted_at: None,
        });
        Ok(id)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        let Some(u) = t
            .users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
        else {
            return Ok(false);
        };
        if let Some(d) = update.display_name {
            u.display_name = d;
        }
        if update.email.is_some() {
            u.email = update.email;
        }
        if let Some(s) = update.status {
            u.status = s;
        }
        Ok(true)
    }

    async fn soft_delete_user(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        match t
            .users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
        {
            Some(u) => {
                u.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_roles(&self) -> Result<Vec<RoleEntity>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().roles.clone())
    }

    async fn role_code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        if self.stale() {
            return Ok(false);
        }
        Ok(self.tables.lock().unwrap().roles.iter().any(|r| r.code == code))
    }

    async fn create_role(&self, role: NewRole) -> Result<i64, sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        if t.roles.iter().any(|r| r.code == role.code) {
            return Err(sqlx::Error::Database(Box::new(UniqueViolation)));
        }
        let id = t.roles.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        t.roles.push(RoleEntity {
            id,
            code: role.code,
            name: role.name,
            description: role.description,
            status: 1,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn delete_role(&self, id: i64) -> Result<(), sqlx::Error> {
        let mut t = self.tables.lock().unwrap();
        t.role_permissions.retain(|(r, _)| *r != id);
        t.user_roles.retain(|(_, r)| *r != id);
        t.roles.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_permissions(&self) -> Result<Vec<PermissionEntity>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().permissions.clone())
    }

    async fn count_live_users(&self) -> Result<i64, sqlx::Error> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().filter(|u| u.deleted_at.is_none()).count() as i64)
    }

    async fn count_roles(&self) -> Result<i64, sqlx::Error> {
        Ok(self.tables.lock().unwrap().roles.len() as i64)
    }
}

/// Stand-in for a Postgres unique constraint violation.
#[derive(Debug)]
struct UniqueViolation;

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("duplicate key value violates unique constraint")
    }
}

impl std::error::Error for UniqueViolation {}

impl sqlx::error::DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        sqlx::error::ErrorKind::UniqueViolation
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        redis_url: "redis://unused".into(),
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api".into(),
        session_ttl_secs: 7200,
        backend_timeout_ms: 500,
        bcrypt_cost: TEST_BCRYPT_COST,
        cors_origins: Vec::new(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub cache: Arc<MemoryCache>,
    pub repo: Arc<MemoryRepository>,
}

impl TestApp {
    pub fn new(repo: MemoryRepository) -> Self {
        Self::with_config(repo, test_config())
    }

    pub fn with_config(repo: MemoryRepository, config: Config) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let repo = Arc::new(repo);
        let state = AppState::new(config, cache.clone(), repo.clone(), repo.clone());
        Self {
            router: build_router(state.clone()),
            state,
            cache,
            repo,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, token, body).await
    }

    /// Logs in through the HTTP surface and returns the issued token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["resp_data"]["token"].as_str().unwrap().to_string()
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
