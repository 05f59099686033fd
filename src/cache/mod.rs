// 缓存模块
// 会话存储及其缓存后端

pub mod backend;
pub mod keys;
pub mod models;
pub mod operations;

pub use backend::{CacheBackend, CacheError, MemoryCache, RedisCache};
pub use models::session::{NewSession, Session};
pub use operations::session::SessionStore;
