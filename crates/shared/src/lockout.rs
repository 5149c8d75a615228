//! Brute-force lockout policy
//!
//! Pure state transitions over an admin's attempt counter and lock timestamp.
//! Every store backend applies these rules; the Postgres backend mirrors them
//! in a single conditional `UPDATE` so concurrent failures cannot under-count.

use time::{Duration, OffsetDateTime};

/// Failed attempts that trigger a lock
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;

/// How long a triggered lock lasts
pub const LOCKOUT_DURATION: Duration = Duration::minutes(15);

/// Maximum login history entries kept per admin
pub const LOGIN_HISTORY_CAP: usize = 20;

/// Attempt/lock state of a single admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockState {
    pub login_attempts: i32,
    pub lock_until: Option<OffsetDateTime>,
}

impl LockState {
    pub fn new(login_attempts: i32, lock_until: Option<OffsetDateTime>) -> Self {
        Self {
            login_attempts,
            lock_until,
        }
    }

    /// Locked while `lock_until` is present and still in the future
    pub fn is_locked(&self, now: OffsetDateTime) -> bool {
        matches!(self.lock_until, Some(until) if until > now)
    }

    /// State after one more failed password check at `now`.
    ///
    /// An expired lock starts a fresh window at 1, not 0: the failure that
    /// follows the lock still counts.
    pub fn after_failure(self, now: OffsetDateTime) -> Self {
        match self.lock_until {
            Some(until) if until <= now => Self {
                login_attempts: 1,
                lock_until: None,
            },
            _ => {
                let login_attempts = self.login_attempts.saturating_add(1);
                let lock_until = if login_attempts >= MAX_LOGIN_ATTEMPTS && !self.is_locked(now) {
                    Some(now + LOCKOUT_DURATION)
                } else {
                    self.lock_until
                };
                Self {
                    login_attempts,
                    lock_until,
                }
            }
        }
    }

    /// State after a verified password match
    pub fn after_success(self) -> Self {
        Self::default()
    }
}
