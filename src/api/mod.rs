// API 模块：请求/响应结构、处理函数与业务操作

pub mod handlers;
pub mod operations;
pub mod schema;
