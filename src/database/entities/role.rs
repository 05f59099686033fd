use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 角色实体，对应 auth_role 表
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoleEntity {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

/// 权限实体，对应 auth_permission 表
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntity {
    pub id: i64,
    /// 如 user:create
    pub code: String,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}
