use async_trait::async_trait;
use redis::{
    AsyncCommands, Client as RedisClient, ExistenceCheck, SetExpiry, SetOptions,
    aio::MultiplexedConnection,
};
use tokio::sync::RwLock;

use super::{CacheBackend, CacheError};

/// Redis 缓存后端
///
/// 进程内共享一条多路复用连接，首次使用时建立，`close` 后下次使用重新建立。
pub struct RedisCache {
    client: RedisClient,
    conn: RwLock<Option<MultiplexedConnection>>,
}

impl RedisCache {
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            conn: RwLock::new(None),
        }
    }

    pub fn open(redis_url: &str) -> Result<Self, CacheError> {
        Ok(Self::new(RedisClient::open(redis_url)?))
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if let Some(conn) = self.conn.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut guard = self.conn.write().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        tracing::info!("Redis connection established");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn set_ex_if_exists(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::XX)
            .with_expiration(SetExpiry::EX(ttl_secs));
        // SET ... XX 在键不存在时返回 nil
        let written: Option<String> = conn.set_options(key, value, options).await?;
        Ok(written.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(format!("{}*", prefix)).await?;
        Ok(keys)
    }

    async fn close(&self) {
        if self.conn.write().await.take().is_some() {
            tracing::info!("Redis connection closed");
        }
    }
}
