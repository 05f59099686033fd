//! 存储库接口
//!
//! 认证核心只通过 [`UserRepository`] 读取用户与角色权限关系；
//! 后台管理接口通过 [`RbacRepository`] 维护这些数据。

pub mod rbac;
pub mod user;

use async_trait::async_trait;

use crate::database::entities::{
    NewRole, NewUser, PermissionEntity, RoleEntity, UserEntity, UserSummary, UserUpdate,
};

pub use rbac::PgRbacRepository;
pub use user::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error>;

    async fn update_password_hash(&self, id: i64, password_hash: &str)
    -> Result<(), sqlx::Error>;

    /// 用户已分配的角色，按分配顺序
    async fn roles_for_user(&self, user_id: i64) -> Result<Vec<RoleEntity>, sqlx::Error>;

    async fn permission_codes_for_role(&self, role_id: i64) -> Result<Vec<String>, sqlx::Error>;
}

#[async_trait]
pub trait RbacRepository: Send + Sync {
    /// 分页查询未删除的用户，返回当前页与总数
    async fn list_users(
        &self,
        page: u32,
        size: u32,
        keyword: Option<&str>,
    ) -> Result<(Vec<UserSummary>, i64), sqlx::Error>;

    /// 是否存在同名且未删除的用户
    async fn live_username_exists(&self, username: &str) -> Result<bool, sqlx::Error>;

    async fn create_user(&self, user: NewUser) -> Result<i64, sqlx::Error>;

    /// 返回是否找到该用户
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<bool, sqlx::Error>;

    async fn soft_delete_user(&self, id: i64) -> Result<bool, sqlx::Error>;

    async fn list_roles(&self) -> Result<Vec<RoleEntity>, sqlx::Error>;

    async fn role_code_exists(&self, code: &str) -> Result<bool, sqlx::Error>;

    async fn create_role(&self, role: NewRole) -> Result<i64, sqlx::Error>;

    /// 删除角色及其用户、权限关联
    async fn delete_role(&self, id: i64) -> Result<(), sqlx::Error>;

    async fn list_permissions(&self) -> Result<Vec<PermissionEntity>, sqlx::Error>;

    /// 未删除的用户数
    async fn count_live_users(&self) -> Result<i64, sqlx::Error>;

    async fn count_roles(&self) -> Result<i64, sqlx::Error>;
}
