//! HTTP routes

pub mod auth;
pub mod questions;

use axum::{
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{optional_admin, require_admin};
use crate::state::AppState;

/// Build the application router.
///
/// Three groups share the state: public (login, signup, health), soft-gated
/// question reads, and routes behind the hard gate.
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup));

    let soft = Router::new()
        .route("/questions", get(questions::list_questions))
        .route("/questions/{id}", get(questions::get_question))
        .route_layer(from_fn_with_state(auth_state.clone(), optional_admin));

    let gated = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/questions", post(questions::create_question))
        .route_layer(from_fn_with_state(auth_state, require_admin));

    public.merge(soft).merge(gated).with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Client IP from proxy headers, `"unknown"` when none is usable
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    // X-Forwarded-For may carry a chain; the first hop is the client
    if let Some(first) = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return first.to_string();
    }

    for name in ["CF-Connecting-IP", "X-Real-IP"] {
        if let Some(ip) = headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return ip.to_string();
        }
    }

    "unknown".to_string()
}

/// `User-Agent` header, if present and printable
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}
