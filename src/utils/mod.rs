use std::future::Future;
use std::time::Duration;

use axum::Json;
use bcrypt::{hash, verify};
use rand::Rng;
use serde::Serialize;

use crate::api::schema::common::ApiResponse;
use crate::error::AppError;

const TOKEN_ALPHABET: &[u8] = b"abcdef0123456789";

/// 会话令牌长度
pub const SESSION_TOKEN_LEN: usize = 64;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 在阻塞线程池中计算哈希，避免占用异步工作线程
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))
}

/// 生成随机十六进制标识（thread_rng 基于 CSPRNG）
pub fn generate_hex_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

pub fn generate_session_token() -> String {
    generate_hex_id(SESSION_TOKEN_LEN)
}

/// 为外部调用设置截止时间，超时视为服务不可用
pub async fn with_deadline<T, E, F>(deadline: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<AppError>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(AppError::Timeout),
    }
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    success_with_message(data, "success")
}

pub fn success_with_message<T: Serialize>(data: T, msg: &str) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: msg.into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const INVALID_CREDENTIALS: i32 = 1002;
    pub const PERMISSION_DENIED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const UNAUTHORIZED: i32 = 1006;
    pub const SESSION_EXPIRED: i32 = 1007;
    pub const WRONG_PASSWORD: i32 = 1008;
    pub const ROLE_EXISTS: i32 = 1009;
    pub const FORBIDDEN: i32 = 1010;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5003;
}
