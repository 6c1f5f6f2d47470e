use crate::model::{HealthResponse, PingResponse};
use axum::Json;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn ping_handler() -> Json<PingResponse> {
    Json(PingResponse { message: "pong" })
}
