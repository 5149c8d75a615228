//! Storage traits and backends
//!
//! Handlers only see `Arc<dyn AdminStore>` / `Arc<dyn QuestionStore>`.
//! `Pg*` backends are used in production; `Memory*` backends serve tests and
//! deployments started without `DATABASE_URL`.

mod memory;
mod postgres;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::admin::{Admin, LoginHistoryEntry, NewAdmin};
use crate::error::StoreResult;
use crate::lockout::LockState;
use crate::question::{NewQuestion, Question};

pub use memory::{MemoryAdminStore, MemoryQuestionStore};
pub use postgres::{PgAdminStore, PgQuestionStore};

/// Credential store for admin accounts
#[async_trait]
pub trait AdminStore: Send + Sync + 'static {
    async fn count_admins(&self) -> StoreResult<i64>;

    /// Lookup by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Admin>>;

    /// Insert `new` only when no admin exists yet.
    ///
    /// Returns `None` when an admin is already present. The emptiness check
    /// and the insert happen atomically.
    async fn create_first_admin(
        &self,
        new: NewAdmin,
        now: OffsetDateTime,
    ) -> StoreResult<Option<Admin>>;

    /// Apply [`LockState::after_failure`] atomically and return the new state.
    ///
    /// `None` when the admin no longer exists.
    async fn apply_failed_attempt(
        &self,
        id: Uuid,
        now: OffsetDateTime,
    ) -> StoreResult<Option<LockState>>;

    /// Zero the attempt counter and clear any lock
    async fn reset_attempts(&self, id: Uuid) -> StoreResult<()>;

    async fn record_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()>;

    /// Prepend to the admin's bounded login history
    async fn append_history(&self, id: Uuid, entry: LoginHistoryEntry) -> StoreResult<()>;
}

/// Question store backing the redacted read endpoints
#[async_trait]
pub trait QuestionStore: Send + Sync + 'static {
    /// All questions, oldest first
    async fn list(&self) -> StoreResult<Vec<Question>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Question>>;

    async fn create(&self, new: NewQuestion, now: OffsetDateTime) -> StoreResult<Question>;
}
