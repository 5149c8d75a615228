//! Login, first-admin signup and the current-admin profile

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use mr_abdallah_shared::LoginHistoryEntry;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

use super::{extract_client_ip, extract_user_agent};
use crate::auth::{self as admin_auth, AdminPrincipal, ClientInfo};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub id: Uuid,
    pub email: String,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_login: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub id: Uuid,
    pub email: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    pub login_history: Vec<LoginHistoryEntry>,
}

/// POST /auth/login
///
/// The body is taken raw so malformed JSON is answered through the same
/// timing floor as every other outcome.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<LoginResponse>> {
    let started = Instant::now();
    let client = ClientInfo {
        ip: extract_client_ip(&headers),
        user_agent: extract_user_agent(&headers),
    };

    let success = admin_auth::login(&state.auth_state(), started, &body, client)
        .await
        .into_result()?;

    Ok(Json(LoginResponse {
        success: true,
        id: success.admin_id,
        email: success.email,
        token: success.token,
        last_login: success.last_login,
    }))
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let created = admin_auth::signup(&state.auth_state(), &body).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            id: created.admin_id,
            email: created.email,
            token: created.token,
        }),
    ))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
) -> ApiResult<Json<MeResponse>> {
    let admin = state
        .admins
        .find_by_id(principal.admin_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(MeResponse {
        success: true,
        id: admin.id,
        email: admin.email,
        last_login: admin.last_login,
        login_history: admin.login_history,
    }))
}
