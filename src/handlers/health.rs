use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// Процесс жив. Доступность LDAP сервера здесь не проверяется
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "UTC_time": chrono::Utc::now().to_rfc2822(),
        })),
    )
}
