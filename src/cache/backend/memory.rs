use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CacheBackend, CacheError};

struct Entry {
    value: String,
    deadline: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline > now
    }
}

/// 进程内缓存后端，按键记录过期时间，读取时惰性清理
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前未过期的键数量
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn set_ex(&self, key: &str, value: String, ttl_secs: u64) -> Result<(), CacheError> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry { value, deadline });
        Ok(())
    }

    async fn set_ex_if_exists(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.value = value;
                entry.deadline = now + Duration::from_secs(ttl_secs);
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.is_live(now));
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_ttl_entries_are_never_visible() {
        let cache = MemoryCache::new();
        cache.set_ex("k", "v".into(), 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn conditional_set_skips_missing_keys() {
        let cache = MemoryCache::new();
        assert!(!cache.set_ex_if_exists("k", "v".into(), 60).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.set_ex("k", "old".into(), 60).await.unwrap();
        assert!(cache.set_ex_if_exists("k", "new".into(), 60).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn keys_filters_by_prefix() {
        let cache = MemoryCache::new();
        cache.set_ex("session:a", "1".into(), 60).await.unwrap();
        cache.set_ex("session:b", "2".into(), 60).await.unwrap();
        cache.set_ex("other:c", "3".into(), 60).await.unwrap();

        let mut keys = cache.keys("session:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["session:a", "session:b"]);
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let cache = MemoryCache::new();
        cache.del("missing").await.unwrap();
        cache.set_ex("k", "v".into(), 60).await.unwrap();
        cache.del("k").await.unwrap();
        cache.del("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
