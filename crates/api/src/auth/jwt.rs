//! Admin session tokens
//!
//! HS256 JWTs with fixed issuer/audience and a 7 day lifetime. Tokens are
//! not persisted; a token is trusted only as far as its signature, expiry,
//! and (for gated routes) the continued existence of its subject.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "mr-abdallah-platform";
pub const TOKEN_AUDIENCE: &str = "mr-abdallah-admin";
pub const TOKEN_TTL: Duration = Duration::days(7);

/// JWT claims for admin tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn admin_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::InvalidSubject)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("Invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("Token subject is not an admin id")]
    InvalidSubject,
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `admin_id` valid for [`TOKEN_TTL`]
    pub fn issue(&self, admin_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_at(admin_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, admin_id: Uuid, now: OffsetDateTime) -> Result<IssuedToken, TokenError> {
        let expires_at = now + TOKEN_TTL;
        let claims = Claims {
            sub: admin_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, expiry, issuer and audience
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}
