// API 数据传输对象模块
// 包含所有与前端交互的数据结构

pub mod auth;
pub mod common;
pub mod rbac;

pub use auth::*;
pub use common::*;
pub use rbac::*;
