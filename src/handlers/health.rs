use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "FlyDrive API running" }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
