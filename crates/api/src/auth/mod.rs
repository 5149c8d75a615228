//! Admin authentication: credentials, tokens, lockout-aware login and the
//! request gates

pub mod credentials;
#[cfg(test)]
mod edge_case_tests;
pub mod jwt;
pub mod login;
pub mod middleware;
pub mod password;
#[cfg(test)]
pub(crate) mod test_support;
pub mod timing;

pub use credentials::{normalize_email, parse_credentials, Credentials};
pub use jwt::{Claims, IssuedToken, JwtManager, TokenError};
pub use login::{login, signup, ClientInfo, LoginOutcome, LoginSuccess, SignupSuccess};
pub use middleware::{
    extract_bearer_token, optional_admin, require_admin, verify_token, AdminPrincipal, AuthError,
    AuthState, SubjectCheck, Verification, Viewer,
};
pub use password::{
    hash_blocking, validate_password_strength, verify_blocking, Argon2Hasher, CredentialHasher,
    PasswordError,
};
pub use timing::{with_response_floor, LOGIN_RESPONSE_FLOOR};
