// API 业务操作模块

pub mod rbac;

pub use rbac::RbacService;
