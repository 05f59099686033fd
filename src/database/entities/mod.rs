// 数据库实体

pub mod role;
pub mod user;

pub use role::{NewRole, PermissionEntity, RoleEntity};
pub use user::{NewUser, USER_STATUS_ACTIVE, UserEntity, UserSummary, UserUpdate};
