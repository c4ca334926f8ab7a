use crate::{ROOM_CREATE_FAILED, ROOM_NOT_FOUND, RelayConfig, RelayService, ws_handler};
use anyhow::Context;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use castroom_core::RoomCode;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub fn router(service: RelayService) -> Router {
    // Browser clients are served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/create-room", post(create_room))
        .route("/room/{code}", get(room_info))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn create_room(State(service): State<RelayService>) -> Response {
    match service.create_room() {
        Ok(room) => Json(json!({ "room": room })).into_response(),
        Err(e) => {
            error!("Failed to create room: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": ROOM_CREATE_FAILED })),
            )
                .into_response()
        }
    }
}

async fn room_info(
    Path(code): Path<String>,
    State(service): State<RelayService>,
) -> Response {
    match service.room_info(&RoomCode::new(code)) {
        Some(info) => Json(info).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": ROOM_NOT_FOUND })),
        )
            .into_response(),
    }
}

/// Serves the relay on an already bound listener until it fails.
pub async fn serve(listener: TcpListener, service: RelayService) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("Relay listening on http://{}", addr);

    axum::serve(listener, router(service))
        .await
        .context("relay server failed")
}

pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    serve(listener, RelayService::new(config)).await
}
