//! Authentication middleware for Axum

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use mr_abdallah_shared::{AdminStore, StoreError};
use serde::Deserialize;
use uuid::Uuid;

use super::jwt::JwtManager;
use super::password::CredentialHasher;
use crate::error::ApiError;

/// Authenticated admin attached to request extensions by the gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub admin_id: Uuid,
    /// Only known when the subject was re-loaded from the store
    pub email: Option<String>,
}

/// Everything token verification and the login flow need
#[derive(Clone)]
pub struct AuthState {
    pub jwt_manager: JwtManager,
    pub admins: Arc<dyn AdminStore>,
    pub hasher: Arc<dyn CredentialHasher>,
}

/// Whether verification re-loads the token subject from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectCheck {
    /// Hard verify: the admin must still exist
    RequireExisting,
    /// Soft verify: signature and claims only, no store access
    Skip,
}

#[derive(Debug)]
pub enum Verification {
    Authenticated(AdminPrincipal),
    Unauthenticated(AuthError),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Token subject no longer exists")]
    UnknownAdmin,
    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::DatabaseError(e) => ApiError::Store(e).into_response(),
            AuthError::MissingAuth | AuthError::InvalidToken | AuthError::UnknownAdmin => {
                ApiError::Unauthorized.into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token from `Authorization: Bearer`, falling back to the `token` query parameter
pub fn extract_bearer_token(request: &Request) -> Option<String> {
    if let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        // auth scheme names are case-insensitive
        if let Some((scheme, token)) = header.split_once(' ') {
            let token = token.trim();
            if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}

/// Verify a bearer token.
///
/// With [`SubjectCheck::Skip`] the store is never consulted, so the result
/// can only be `Authenticated` or `Unauthenticated(MissingAuth | InvalidToken)`.
pub async fn verify_token(
    auth_state: &AuthState,
    token: Option<&str>,
    check: SubjectCheck,
) -> Verification {
    let Some(token) = token else {
        return Verification::Unauthenticated(AuthError::MissingAuth);
    };

    let admin_id = match auth_state
        .jwt_manager
        .decode(token)
        .and_then(|claims| claims.admin_id())
    {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return Verification::Unauthenticated(AuthError::InvalidToken);
        }
    };

    match check {
        SubjectCheck::Skip => Verification::Authenticated(AdminPrincipal {
            admin_id,
            email: None,
        }),
        SubjectCheck::RequireExisting => match auth_state.admins.find_by_id(admin_id).await {
            Ok(Some(admin)) => Verification::Authenticated(AdminPrincipal {
                admin_id: admin.id,
                email: Some(admin.email),
            }),
            Ok(None) => Verification::Unauthenticated(AuthError::UnknownAdmin),
            Err(e) => Verification::Unauthenticated(AuthError::DatabaseError(e)),
        },
    }
}

/// Middleware that requires a token whose subject still exists
pub async fn require_admin(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let token = extract_bearer_token(&request);

    match verify_token(&auth_state, token.as_deref(), SubjectCheck::RequireExisting).await {
        Verification::Authenticated(principal) => {
            tracing::debug!(path = %path, admin_id = %principal.admin_id, "require_admin: authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Verification::Unauthenticated(err) => {
            tracing::warn!(path = %path, error = %err, "require_admin: authentication failed");
            err.into_response()
        }
    }
}

/// Middleware that attaches a principal when a valid token is present and
/// otherwise lets the request through untouched
pub async fn optional_admin(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_bearer_token(&request);

    if let Verification::Authenticated(principal) =
        verify_token(&auth_state, token.as_deref(), SubjectCheck::Skip).await
    {
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}

/// The caller's principal, if the soft gate attached one
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AdminPrincipal>);

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.0.is_some()
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<AdminPrincipal>().cloned()))
    }
}
