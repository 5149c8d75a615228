//! Application state

use std::sync::Arc;

use mr_abdallah_shared::{AdminStore, QuestionStore};

use crate::{
    auth::{AuthState, CredentialHasher, JwtManager},
    config::Config,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt_manager: JwtManager,
    pub admins: Arc<dyn AdminStore>,
    pub questions: Arc<dyn QuestionStore>,
    /// Argon2 in production; tests swap in a fast counting hasher
    pub hasher: Arc<dyn CredentialHasher>,
}

impl AppState {
    pub fn new(
        config: Config,
        admins: Arc<dyn AdminStore>,
        questions: Arc<dyn QuestionStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let jwt_manager = JwtManager::new(config.jwt_secret_bytes());

        Self {
            config,
            jwt_manager,
            admins,
            questions,
            hasher,
        }
    }

    /// Create auth state for middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            jwt_manager: self.jwt_manager.clone(),
            admins: self.admins.clone(),
            hasher: self.hasher.clone(),
        }
    }
}
