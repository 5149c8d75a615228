//! Login orchestration and first-admin bootstrap
//!
//! `login` runs input validation, lookup, lock check and password verify in
//! that order, then holds the response until [`LOGIN_RESPONSE_FLOOR`] has
//! passed. Writes that follow the credential decision (attempt counter,
//! last-login, history) are logged on failure and never change the outcome.

use mr_abdallah_shared::{Admin, LoginHistoryEntry, NewAdmin};
use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

use super::credentials::parse_credentials;
use super::middleware::AuthState;
use super::password::{hash_blocking, validate_password_strength, verify_blocking};
use super::timing::{with_response_floor, LOGIN_RESPONSE_FLOOR};
use crate::error::{ApiError, ApiResult};

pub const ADMIN_EXISTS_MESSAGE: &str = "An admin account already exists";

/// Request metadata recorded in the login history
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub admin_id: Uuid,
    pub email: String,
    pub token: String,
    pub last_login: OffsetDateTime,
}

#[derive(Debug)]
pub enum LoginOutcome {
    Success(LoginSuccess),
    InvalidInput(String),
    UnknownUser,
    WrongPassword,
    Locked { until: OffsetDateTime },
    ServerError(String),
}

impl LoginOutcome {
    pub fn into_result(self) -> ApiResult<LoginSuccess> {
        match self {
            LoginOutcome::Success(success) => Ok(success),
            LoginOutcome::InvalidInput(message) => Err(ApiError::Validation(message)),
            LoginOutcome::UnknownUser | LoginOutcome::WrongPassword => {
                Err(ApiError::InvalidCredentials)
            }
            LoginOutcome::Locked { until } => Err(ApiError::Locked { until }),
            LoginOutcome::ServerError(detail) => Err(ApiError::Internal(detail)),
        }
    }
}

/// Full login attempt for a raw JSON body, padded to the response floor.
///
/// `started` should be taken as early as possible in request handling.
pub async fn login(
    auth_state: &AuthState,
    started: Instant,
    body: &[u8],
    client: ClientInfo,
) -> LoginOutcome {
    let outcome = with_response_floor(
        started,
        LOGIN_RESPONSE_FLOOR,
        authenticate(auth_state, body, client),
    )
    .await;

    match &outcome {
        LoginOutcome::Success(success) => {
            tracing::info!(admin_id = %success.admin_id, "Admin login succeeded");
        }
        LoginOutcome::Locked { until } => {
            tracing::warn!(lock_until = %until, "Login rejected: account locked");
        }
        LoginOutcome::ServerError(detail) => {
            tracing::error!(error = %detail, "Login failed with server error");
        }
        other => tracing::info!(outcome = ?other, "Login rejected"),
    }

    outcome
}

async fn authenticate(auth_state: &AuthState, body: &[u8], client: ClientInfo) -> LoginOutcome {
    let credentials = match parse_credentials(body) {
        Ok(c) => c,
        Err(message) => return LoginOutcome::InvalidInput(message),
    };

    let admin = match auth_state.admins.find_by_email(&credentials.email).await {
        Ok(Some(admin)) => admin,
        Ok(None) => return LoginOutcome::UnknownUser,
        Err(e) => return LoginOutcome::ServerError(e.to_string()),
    };

    let now = OffsetDateTime::now_utc();

    // Lock is read from the `find_by_email` snapshot. A concurrent request
    // that sets the lock after that read does not stop this attempt from
    // verifying; the counter update itself is atomic.
    if admin.is_locked(now) {
        record_history(auth_state, &admin, now, &client, false).await;
        // is_locked implies lock_until is set
        return LoginOutcome::Locked {
            until: admin.lock_until.unwrap_or(now),
        };
    }

    let matches = match verify_blocking(
        auth_state.hasher.clone(),
        credentials.password,
        admin.password_hash.clone(),
    )
    .await
    {
        Ok(matches) => matches,
        Err(e) => return LoginOutcome::ServerError(e.to_string()),
    };

    if !matches {
        match auth_state.admins.apply_failed_attempt(admin.id, now).await {
            Ok(Some(state)) if state.is_locked(now) => {
                tracing::warn!(
                    admin_id = %admin.id,
                    attempts = state.login_attempts,
                    "Account locked after repeated failed logins"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(admin_id = %admin.id, error = %e, "Failed to record failed attempt");
            }
        }
        record_history(auth_state, &admin, now, &client, false).await;
        return LoginOutcome::WrongPassword;
    }

    if let Err(e) = auth_state.admins.reset_attempts(admin.id).await {
        tracing::error!(admin_id = %admin.id, error = %e, "Failed to reset login attempts");
    }
    if let Err(e) = auth_state.admins.record_last_login(admin.id, now).await {
        tracing::error!(admin_id = %admin.id, error = %e, "Failed to record last login");
    }
    record_history(auth_state, &admin, now, &client, true).await;

    match auth_state.jwt_manager.issue_at(admin.id, now) {
        Ok(issued) => LoginOutcome::Success(LoginSuccess {
            admin_id: admin.id,
            email: admin.email,
            token: issued.token,
            last_login: now,
        }),
        Err(e) => LoginOutcome::ServerError(e.to_string()),
    }
}

async fn record_history(
    auth_state: &AuthState,
    admin: &Admin,
    now: OffsetDateTime,
    client: &ClientInfo,
    success: bool,
) {
    let entry = LoginHistoryEntry::new(now, client.ip.clone(), client.user_agent.clone(), success);
    if let Err(e) = auth_state.admins.append_history(admin.id, entry).await {
        tracing::error!(admin_id = %admin.id, error = %e, "Failed to append login history");
    }
}

#[derive(Debug, Clone)]
pub struct SignupSuccess {
    pub admin_id: Uuid,
    pub email: String,
    pub token: String,
}

/// Create the first admin account. Refused once any admin exists.
pub async fn signup(auth_state: &AuthState, body: &[u8]) -> ApiResult<SignupSuccess> {
    let credentials = parse_credentials(body).map_err(ApiError::Validation)?;

    if auth_state.admins.count_admins().await? > 0 {
        return Err(ApiError::Forbidden(ADMIN_EXISTS_MESSAGE.to_string()));
    }

    validate_password_strength(&credentials.password).map_err(ApiError::Validation)?;

    let password_hash = hash_blocking(auth_state.hasher.clone(), credentials.password)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let now = OffsetDateTime::now_utc();
    let new = NewAdmin {
        email: credentials.email,
        password_hash,
    };

    // Another bootstrap may have won between the count and the insert
    let Some(admin) = auth_state.admins.create_first_admin(new, now).await? else {
        return Err(ApiError::Forbidden(ADMIN_EXISTS_MESSAGE.to_string()));
    };

    let issued = auth_state
        .jwt_manager
        .issue_at(admin.id, now)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(admin_id = %admin.id, "First admin account created");

    Ok(SignupSuccess {
        admin_id: admin.id,
        email: admin.email,
        token: issued.token,
    })
}
