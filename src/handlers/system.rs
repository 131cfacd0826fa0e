use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service information
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Recipe API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Recipe management REST API",
            "endpoints": {
                "user": "/api/user/create, /api/user/token (public), /api/user/me (protected)",
                "tags": "/api/recipe/tags (protected)",
                "ingredients": "/api/recipe/ingredients (protected)",
                "recipes": "/api/recipe/recipes[/:id[/upload-image]] (protected)",
                "media": state.config.media.url,
            }
        }
    }))
}

/// GET /health - store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
