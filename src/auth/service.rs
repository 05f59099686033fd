use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::api::schema::{LoginResponse, ProfileResponse, PublicUser};
use crate::auth::permissions::resolve_grants;
use crate::cache::{NewSession, Session, SessionStore};
use crate::database::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::{
    generate_hex_id, hash_password_blocking, verify_password_blocking, with_deadline,
};

/// 认证服务：登录、登出、修改密码
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: SessionStore,
    bcrypt_cost: u32,
    timeout: Duration,
    /// 与真实密码同代价的占位哈希，首次使用时生成
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: SessionStore,
        bcrypt_cost: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            bcrypt_cost,
            timeout,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// 账号不可用时仍做一次同代价的密码校验，响应耗时不随用户名是否存在而变化
    async fn verify_against_dummy(&self, password: &str) -> Result<(), AppError> {
        let cost = self.bcrypt_cost;
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password_blocking(generate_hex_id(32), cost))
            .await?;
        verify_password_blocking(password.to_string(), hash.clone()).await?;
        Ok(())
    }

    /// 登录
    ///
    /// 用户不存在、已删除、已停用或密码错误都返回同一个 `InvalidCredentials`。
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = with_deadline(self.timeout, self.users.find_by_username(username)).await?;

        let Some(user) = user.filter(|u| u.can_login()) else {
            self.verify_against_dummy(password).await?;
            tracing::warn!("Login rejected for {}: unknown or inactive account", username);
            return Err(AppError::InvalidCredentials);
        };

        let valid =
            verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !valid {
            tracing::warn!("Login rejected for {}: password mismatch", username);
            return Err(AppError::InvalidCredentials);
        }

        let grants = with_deadline(self.timeout, resolve_grants(self.users.as_ref(), user.id)).await?;

        let session = self
            .sessions
            .create(NewSession {
                user_id: user.id,
                username: user.username.clone(),
                roles: grants.roles,
                permissions: grants.permissions,
            })
            .await?;

        tracing::info!(
            "User {} logged in with {} role(s), {} permission(s)",
            user.id,
            session.roles.len(),
            session.permissions.len()
        );

        Ok(LoginResponse {
            token: session.token,
            expire_at: session.expire_at,
            user: PublicUser {
                id: user.id,
                username: user.username,
                display_name: user.display_name,
                avatar: user.avatar,
            },
            roles: session.roles,
            permissions: session.permissions,
        })
    }

    /// 登出，会话不存在时同样成功
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.sessions.delete(token).await?;
        tracing::info!("Session logged out");
        Ok(())
    }

    /// 当前用户信息，角色与权限取自会话快照
    pub async fn profile(&self, session: &Session) -> Result<ProfileResponse, AppError> {
        let user = with_deadline(self.timeout, self.users.find_by_id(session.user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("用户不存在".into()))?;

        Ok(ProfileResponse {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            avatar: user.avatar,
            created_at: user.created_at,
            roles: session.roles.clone(),
            permissions: session.permissions.clone(),
        })
    }

    /// 修改密码，成功后清除该用户的全部会话
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = with_deadline(self.timeout, self.users.find_by_id(user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("用户不存在".into()))?;

        let valid =
            verify_password_blocking(old_password.to_string(), user.password_hash).await?;
        if !valid {
            tracing::warn!("Password change rejected for user {}: wrong old password", user_id);
            return Err(AppError::WrongPassword);
        }

        let new_hash = hash_password_blocking(new_password.to_string(), self.bcrypt_cost).await?;
        with_deadline(
            self.timeout,
            self.users.update_password_hash(user_id, &new_hash),
        )
        .await?;

        self.sessions.delete_by_user_id(user_id).await?;
        tracing::info!("Password changed for user {}", user_id);
        Ok(())
    }
}
