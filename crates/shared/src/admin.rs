//! Admin credential record

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::lockout::{LockState, LOGIN_HISTORY_CAP};

/// A privileged account.
///
/// `password_hash` is not serializable; responses build their
/// own projections from the public fields.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub login_attempts: i32,
    pub lock_until: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    /// Newest first, never longer than [`LOGIN_HISTORY_CAP`]
    pub login_history: Vec<LoginHistoryEntry>,
    pub created_at: OffsetDateTime,
}

impl Admin {
    pub fn from_new(new: NewAdmin, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            login_history: Vec::new(),
            created_at: now,
        }
    }

    pub fn lock_state(&self) -> LockState {
        LockState::new(self.login_attempts, self.lock_until)
    }

    pub fn set_lock_state(&mut self, state: LockState) {
        self.login_attempts = state.login_attempts;
        self.lock_until = state.lock_until;
    }

    pub fn is_locked(&self, now: OffsetDateTime) -> bool {
        self.lock_state().is_locked(now)
    }

    /// Prepend `entry`, dropping the oldest entries beyond the cap
    pub fn push_history(&mut self, entry: LoginHistoryEntry) {
        self.login_history.insert(0, entry);
        self.login_history.truncate(LOGIN_HISTORY_CAP);
    }
}

/// Input for the bootstrap path; `email` must already be normalized
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub password_hash: String,
}

/// One recorded login attempt against a located admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub success: bool,
}

impl LoginHistoryEntry {
    pub fn new(
        timestamp: OffsetDateTime,
        ip: impl Into<String>,
        user_agent: Option<String>,
        success: bool,
    ) -> Self {
        Self {
            timestamp,
            ip: ip.into(),
            user_agent,
            success,
        }
    }
}
