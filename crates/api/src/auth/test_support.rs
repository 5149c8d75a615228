//! Shared fixtures for auth and route tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mr_abdallah_shared::{
    Admin, AdminStore, LockState, LoginHistoryEntry, MemoryAdminStore, NewAdmin, StoreError,
    StoreResult,
};
use time::OffsetDateTime;
use uuid::Uuid;

use super::jwt::JwtManager;
use super::middleware::AuthState;
use super::password::{CredentialHasher, PasswordError};

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-key-for-testing-only";
pub const TEST_EMAIL: &str = "a@b.com";
pub const TEST_PASSWORD: &str = "Passw0rd";

/// Fast stand-in for argon2 that counts `verify` calls
#[derive(Debug, Default)]
pub struct CountingHasher {
    verifies: AtomicUsize,
}

impl CountingHasher {
    pub fn verify_calls(&self) -> usize {
        self.verifies.load(Ordering::SeqCst)
    }
}

impl CredentialHasher for CountingHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        Ok(format!("plain:{plain}"))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        Ok(hash == format!("plain:{plain}"))
    }
}

/// Memory store whose post-decision writes can be made to fail
#[derive(Debug, Default)]
pub struct FlakyAdminStore {
    pub inner: MemoryAdminStore,
    pub fail_side_effects: bool,
    pub fail_lookups: bool,
}

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl AdminStore for FlakyAdminStore {
    async fn count_admins(&self) -> StoreResult<i64> {
        self.inner.count_admins().await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        if self.fail_lookups {
            return Err(injected());
        }
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        if self.fail_lookups {
            return Err(injected());
        }
        self.inner.find_by_id(id).await
    }

    async fn create_first_admin(
        &self,
        new: NewAdmin,
        now: OffsetDateTime,
    ) -> StoreResult<Option<Admin>> {
        self.inner.create_first_admin(new, now).await
    }

    async fn apply_failed_attempt(
        &self,
        id: Uuid,
        now: OffsetDateTime,
    ) -> StoreResult<Option<LockState>> {
        if self.fail_side_effects {
            return Err(injected());
        }
        self.inner.apply_failed_attempt(id, now).await
    }

    async fn reset_attempts(&self, id: Uuid) -> StoreResult<()> {
        if self.fail_side_effects {
            return Err(injected());
        }
        self.inner.reset_attempts(id).await
    }

    async fn record_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        if self.fail_side_effects {
            return Err(injected());
        }
        self.inner.record_last_login(id, at).await
    }

    async fn append_history(&self, id: Uuid, entry: LoginHistoryEntry) -> StoreResult<()> {
        if self.fail_side_effects {
            return Err(injected());
        }
        self.inner.append_history(id, entry).await
    }
}

pub fn auth_state(admins: Arc<dyn AdminStore>, hasher: Arc<CountingHasher>) -> AuthState {
    AuthState {
        jwt_manager: JwtManager::new(TEST_SECRET),
        admins,
        hasher,
    }
}

/// Admin whose password is `password` under [`CountingHasher`]
pub fn admin_with_password(email: &str, password: &str) -> Admin {
    Admin::from_new(
        NewAdmin {
            email: email.to_string(),
            password_hash: format!("plain:{password}"),
        },
        OffsetDateTime::now_utc(),
    )
}

pub fn login_body(email: &str, password: &str) -> Vec<u8> {
    serde_json::json!({ "email": email, "password": password })
        .to_string()
        .into_bytes()
}
