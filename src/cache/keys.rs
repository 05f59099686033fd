/// 会话缓存键前缀
pub const SESSION_PREFIX: &str = "session:";

/// 生成会话缓存键
pub fn session_key(token: &str) -> String {
    format!("{}{}", SESSION_PREFIX, token)
}
