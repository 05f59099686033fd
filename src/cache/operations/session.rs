use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::backend::{CacheBackend, CacheError};
use crate::cache::keys::{SESSION_PREFIX, session_key};
use crate::cache::models::session::{NewSession, Session};
use crate::config::MAX_SESSION_TTL_SECS;
use crate::utils::generate_session_token;

/// 会话存储
///
/// 会话以 JSON 形式保存在缓存中，键为 `session:<token>`，由缓存自身的 TTL 负责过期。
/// 缓存不可用时直接返回错误，不做本地兜底。
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: Duration, timeout: Duration) -> Self {
        Self {
            backend,
            default_ttl,
            timeout,
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout)?
    }

    /// 创建会话，使用默认有效期
    pub async fn create(&self, data: NewSession) -> Result<Session, CacheError> {
        self.create_with_ttl(data, self.default_ttl).await
    }

    pub async fn create_with_ttl(
        &self,
        data: NewSession,
        ttl: Duration,
    ) -> Result<Session, CacheError> {
        let (ttl_secs, expire_at) = expiry_after(ttl)?;
        let session = Session {
            token: generate_session_token(),
            user_id: data.user_id,
            username: data.username,
            roles: data.roles,
            permissions: data.permissions,
            expire_at,
        };

        let json = serde_json::to_string(&session)?;
        self.bounded(
            self.backend
                .set_ex(&session_key(&session.token), json, ttl_secs),
        )
        .await?;

        tracing::debug!(
            "Session created for user {} ({}...)",
            session.user_id,
            &session.token[..8]
        );
        Ok(session)
    }

    /// 获取会话
    ///
    /// 键不存在或内容无法解析时返回 `None`；不检查 `expire_at`，由调用方负责。
    pub async fn get(&self, token: &str) -> Result<Option<Session>, CacheError> {
        let key = session_key(token);
        let result = self.bounded(self.backend.get(&key)).await?;

        Ok(result.and_then(|json| match serde_json::from_str::<Session>(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Discarding malformed session payload at {}: {}", key, e);
                None
            }
        }))
    }

    /// 删除会话，令牌不存在时同样成功
    pub async fn delete(&self, token: &str) -> Result<(), CacheError> {
        self.bounded(self.backend.del(&session_key(token))).await
    }

    /// 刷新会话有效期，使用默认有效期
    pub async fn refresh(&self, token: &str) -> Result<(), CacheError> {
        self.refresh_with_ttl(token, self.default_ttl).await
    }

    /// 刷新会话有效期
    ///
    /// 缓存 TTL 与负载中的 `expire_at` 同步更新。写入仅在键仍存在时生效，
    /// 因此与并发的删除竞争时删除总会胜出，已不存在的会话刷新为空操作。
    pub async fn refresh_with_ttl(&self, token: &str, ttl: Duration) -> Result<(), CacheError> {
        let Some(mut session) = self.get(token).await? else {
            return Ok(());
        };

        let (ttl_secs, expire_at) = expiry_after(ttl)?;
        session.expire_at = expire_at;
        let json = serde_json::to_string(&session)?;

        let written = self
            .bounded(
                self.backend
                    .set_ex_if_exists(&session_key(token), json, ttl_secs),
            )
            .await?;
        if !written {
            tracing::debug!("Refresh skipped, session already gone");
        }
        Ok(())
    }

    /// 删除用户的全部会话，返回删除数量
    ///
    /// 全量扫描所有会话键；扫描期间新建的会话可能不会被清除。
    pub async fn delete_by_user_id(&self, user_id: i64) -> Result<usize, CacheError> {
        let keys = self.bounded(self.backend.keys(SESSION_PREFIX)).await?;
        let mut removed = 0;

        for key in keys {
            let Some(json) = self.bounded(self.backend.get(&key)).await? else {
                continue;
            };
            let owned_by_user = serde_json::from_str::<Session>(&json)
                .map(|session| session.user_id == user_id)
                .unwrap_or(false);
            if owned_by_user {
                self.bounded(self.backend.del(&key)).await?;
                removed += 1;
            }
        }

        tracing::info!("Invalidated {} session(s) for user {}", removed, user_id);
        Ok(removed)
    }

    /// 关闭缓存连接
    pub async fn close(&self) {
        self.backend.close().await;
    }
}

/// 换算缓存 TTL（秒）与负载过期时间；TTL 为 0 或超出上限时报错
fn expiry_after(ttl: Duration) -> Result<(u64, DateTime<Utc>), CacheError> {
    let secs = ttl.as_secs();
    if !(1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        return Err(CacheError::InvalidTtl(secs));
    }
    let expire_at = i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or(CacheError::InvalidTtl(secs))?;
    Ok((secs, expire_at))
}
