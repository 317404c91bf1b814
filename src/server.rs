//! JSON API consumed by the dashboard page.
//!
//! Handlers are thin: each one moves its store work onto the blocking pool,
//! where `services::dashboard` opens connections per operation.

use crate::services::dashboard;
use crate::store::FarmStore;
use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::{Local, Utc};
use http::StatusCode;
use log::{error, info};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

pub type SharedStore = Arc<dyn FarmStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub chart_window_hours: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/charts", get(charts_handler))
        .route("/api/kpis", get(kpis_handler))
        .route("/api/system-status", get(system_status_handler))
        .route("/api/latest-data", get(latest_data_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {} failed: {}", addr, e))?;
    info!("Dashboard API listening on http://{}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested; draining connections");
}

/// Run `work` against the store on the blocking pool and answer with JSON.
async fn blocking_json<T, F>(state: AppState, what: &'static str, work: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&AppState) -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(move || work(&state)).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            error!("{} handler task failed: {}", what, e);
            let body = serde_json::json!({ "error": format!("{} unavailable", what) });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn charts_handler(State(state): State<AppState>) -> Response {
    blocking_json(state, "charts", |s| {
        dashboard::charts(s.store.as_ref(), Utc::now(), s.chart_window_hours)
    })
    .await
}

async fn kpis_handler(State(state): State<AppState>) -> Response {
    blocking_json(state, "kpis", |s| dashboard::kpis(s.store.as_ref())).await
}

async fn system_status_handler(State(state): State<AppState>) -> Response {
    blocking_json(state, "system status", |s| {
        dashboard::systems(s.store.as_ref(), &Local::now())
    })
    .await
}

async fn latest_data_handler(State(state): State<AppState>) -> Response {
    blocking_json(state, "latest data", |s| {
        dashboard::latest_data(s.store.as_ref(), &Local::now())
    })
    .await
}

async fn health_handler(State(state): State<AppState>) -> Response {
    let result = tokio::task::spawn_blocking(move || dashboard::health(state.store.as_ref())).await;
    match result {
        Ok(health) if health.reachable => Json(health).into_response(),
        Ok(health) => (StatusCode::SERVICE_UNAVAILABLE, Json(health)).into_response(),
        Err(e) => {
            error!("health handler task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
