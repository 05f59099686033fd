// 数据库模块
// 用户、角色、权限的实体定义与存储库

pub mod entities;
pub mod repositories;

pub use entities::{
    NewRole, NewUser, PermissionEntity, RoleEntity, USER_STATUS_ACTIVE, UserEntity, UserSummary,
    UserUpdate,
};
pub use repositories::{PgRbacRepository, PgUserRepository, RbacRepository, UserRepository};
