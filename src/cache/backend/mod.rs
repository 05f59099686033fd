//! 缓存后端抽象
//!
//! 会话存储只依赖这里定义的几个原子操作，生产环境使用 Redis，
//! 测试与本地开发使用进程内实现。

mod memory;
mod redis;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("failed to encode cache payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("cache call timed out")]
    Timeout,
    #[error("session ttl out of range: {0}s")]
    InvalidTtl(u64),
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// 写入并设置过期时间
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError>;

    /// 仅当键仍存在时写入，返回是否写入成功
    async fn set_ex_if_exists(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> Result<bool, CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 删除键，键不存在时不报错
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// 列出以 prefix 开头的全部键
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// 关闭底层连接，之后的调用会重新建立连接
    async fn close(&self);
}
