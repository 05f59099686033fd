//! 认证与授权核心
//!
//! - [`permissions`]：登录时把用户角色展开为权限快照
//! - [`gate`]：每个请求的身份解析与策略判定
//! - [`service`]：登录、登出、修改密码

pub mod gate;
pub mod permissions;
pub mod service;

pub use gate::{Identity, Requirement, authorize, bearer_token};
pub use permissions::{Grants, resolve_grants};
pub use service::AuthService;
