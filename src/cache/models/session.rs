use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 超级管理员用户ID，拥有全部权限且不可删除
pub const SUPER_ADMIN_ID: i64 = 1;

/// 会话缓存数据模型
///
/// `permissions` 是登录时根据角色计算出的快照，之后角色权限的变更不会影响已有会话。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub expire_at: DateTime<Utc>,
}

impl Session {
    pub fn is_super_admin(&self) -> bool {
        self.user_id == SUPER_ADMIN_ID
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at < now
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.is_super_admin() || self.permissions.iter().any(|p| p == code)
    }
}

/// 创建会话所需的数据，令牌和过期时间由存储生成
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}
