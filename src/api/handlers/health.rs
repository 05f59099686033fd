use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

/// 健康检查
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "time": Utc::now().to_rfc3339() }))
}
