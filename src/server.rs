// 🌐 Relay Server - messaging proxy and update relay over HTTP
//
// Routes:
//   GET  /api/health
//   POST /api/whatsapp-send
//   POST /api/voter/update_mobile
//   GET  /api/voter/:epic_id/history

use crate::config::ServerConfig;
use crate::error::{ProxyError, UpdateError};
use crate::relay::{apply_update, forward_message, validate_update, ProviderSettings, SendRequest, UpdateReply, UpdateRequest};
use crate::store;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    http: reqwest::Client,
    provider: Arc<ProviderSettings>,
    store: Option<Arc<Mutex<Connection>>>,
}

impl AppState {
    pub fn new(http: reqwest::Client, provider: ProviderSettings, store: Option<Connection>) -> Self {
        AppState {
            http,
            provider: Arc::new(provider),
            store: store.map(|conn| Arc::new(Mutex::new(conn))),
        }
    }
}

// ============================================================================
// ERROR RESPONSES
// ============================================================================

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        let code = status(self.status_code());
        (code, Json(UpdateReply::error(self.to_string()))).into_response()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let code = status(self.status_code());
        let body = json!({
            "success": false,
            "error": self.to_string(),
            "message": self.summary(),
        });
        (code, Json(body)).into_response()
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "database": state.store.is_some(),
    }))
}

/// POST /api/whatsapp-send
async fn whatsapp_send(State(state): State<AppState>, body: Bytes) -> Response {
    // Malformed bodies carry none of the required fields
    let request: SendRequest = serde_json::from_slice(&body).unwrap_or_default();

    match forward_message(&state.http, &state.provider, request).await {
        Ok(reply) => {
            info!(to = %reply.phone_number, message_id = ?reply.message_id, "message relayed");
            Json(reply).into_response()
        }
        Err(err) => {
            warn!(error = %err, "message relay failed");
            err.into_response()
        }
    }
}

/// POST /api/voter/update_mobile
async fn update_mobile(State(state): State<AppState>, body: Bytes) -> Result<Json<UpdateReply>, UpdateError> {
    let request: UpdateRequest = serde_json::from_slice(&body).map_err(|_| UpdateError::InvalidJson)?;
    let update = validate_update(&request)?;

    let reply = match &state.store {
        Some(store) => {
            let conn = store
                .lock()
                .map_err(|_| UpdateError::Storage("database lock poisoned".to_string()))?;
            apply_update(Some(&*conn), update)?
        }
        None => apply_update(None, update)?,
    };

    Ok(Json(reply))
}

/// GET /api/voter/:epic_id/history
async fn contact_history(
    State(state): State<AppState>,
    Path(epic_id): Path<String>,
) -> Result<Json<serde_json::Value>, UpdateError> {
    let shared = state.store.as_ref().ok_or(UpdateError::NoDatabase)?;
    let conn = shared
        .lock()
        .map_err(|_| UpdateError::Storage("database lock poisoned".to_string()))?;

    let changes = store::contact_history(&conn, epic_id.trim())
        .map_err(|e| UpdateError::Storage(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "epic_id": epic_id.trim(),
        "count": changes.len(),
        "data": changes,
    })))
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method not allowed" })))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/whatsapp-send",
            post(whatsapp_send).fallback(method_not_allowed),
        )
        .route(
            "/api/voter/update_mobile",
            post(update_mobile).fallback(method_not_allowed),
        )
        .route("/api/voter/:epic_id/history", get(contact_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// SERVER
// ============================================================================

pub async fn serve(config: ServerConfig) -> Result<()> {
    let store = match &config.database {
        Some(path) => {
            let conn = store::open(path)?;
            info!(path = %path.display(), contacts = store::count_contacts(&conn)?, "database opened");
            Some(conn)
        }
        None => {
            warn!("no database configured; updates will be simulated");
            None
        }
    };

    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let provider = ProviderSettings {
        base_url: config.provider_url.clone(),
        timeout: config.provider_timeout(),
    };

    let app = router(AppState::new(http, provider, store));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!(addr = %config.bind, "relay server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "terminate handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
