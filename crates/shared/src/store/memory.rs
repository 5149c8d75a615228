//! In-memory store backends
//!
//! Every mutation happens under a single write lock, so the attempt counter
//! update is atomic with respect to concurrent logins.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AdminStore, QuestionStore};
use crate::admin::{Admin, LoginHistoryEntry, NewAdmin};
use crate::error::StoreResult;
use crate::lockout::LockState;
use crate::question::{NewQuestion, Question};

#[derive(Debug, Default)]
pub struct MemoryAdminStore {
    admins: RwLock<HashMap<Uuid, Admin>>,
}

impl MemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record as-is (seeding and tests)
    pub async fn insert(&self, admin: Admin) {
        self.admins.write().await.insert(admin.id, admin);
    }

    pub async fn remove(&self, id: Uuid) -> Option<Admin> {
        self.admins.write().await.remove(&id)
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn count_admins(&self) -> StoreResult<i64> {
        Ok(self.admins.read().await.len() as i64)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        Ok(self
            .admins
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        Ok(self.admins.read().await.get(&id).cloned())
    }

    async fn create_first_admin(
        &self,
        new: NewAdmin,
        now: OffsetDateTime,
    ) -> StoreResult<Option<Admin>> {
        let mut admins = self.admins.write().await;
        if !admins.is_empty() {
            return Ok(None);
        }

        let admin = Admin::from_new(new, now);
        admins.insert(admin.id, admin.clone());
        Ok(Some(admin))
    }

    async fn apply_failed_attempt(
        &self,
        id: Uuid,
        now: OffsetDateTime,
    ) -> StoreResult<Option<LockState>> {
        let mut admins = self.admins.write().await;
        Ok(admins.get_mut(&id).map(|admin| {
            let next = admin.lock_state().after_failure(now);
            admin.set_lock_state(next);
            next
        }))
    }

    async fn reset_attempts(&self, id: Uuid) -> StoreResult<()> {
        if let Some(admin) = self.admins.write().await.get_mut(&id) {
            let next = admin.lock_state().after_success();
            admin.set_lock_state(next);
        }
        Ok(())
    }

    async fn record_last_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        if let Some(admin) = self.admins.write().await.get_mut(&id) {
            admin.last_login = Some(at);
        }
        Ok(())
    }

    async fn append_history(&self, id: Uuid, entry: LoginHistoryEntry) -> StoreResult<()> {
        if let Some(admin) = self.admins.write().await.get_mut(&id) {
            admin.push_history(entry);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryQuestionStore {
    questions: RwLock<Vec<Question>>,
}

impl MemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn list(&self) -> StoreResult<Vec<Question>> {
        Ok(self.questions.read().await.clone())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Question>> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .find(|q| q.id == id)
            .cloned())
    }

    async fn create(&self, new: NewQuestion, now: OffsetDateTime) -> StoreResult<Question> {
        let question = Question::from_new(new, now);
        self.questions.write().await.push(question.clone());
        Ok(question)
    }
}
