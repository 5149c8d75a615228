// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Mr Abdallah Platform shared crate
//!
//! Domain types and persistence shared by the API server:
//!
//! - **Admin**: credential record with attempt/lock state and bounded login history
//! - **Lockout**: pure state transitions for the brute-force lockout window
//! - **Stores**: `AdminStore` / `QuestionStore` with Postgres and in-memory backends
//! - **Database**: pool creation and embedded migrations

pub mod admin;
pub mod db;
pub mod error;
pub mod lockout;
pub mod question;
pub mod store;

pub use admin::{Admin, LoginHistoryEntry, NewAdmin};
pub use db::{create_pool, run_migrations};
pub use error::{StoreError, StoreResult};
pub use lockout::{
    LockState, LOCKOUT_DURATION, LOGIN_HISTORY_CAP, MAX_LOGIN_ATTEMPTS,
};
pub use question::{NewQuestion, Question};
pub use store::{
    AdminStore, MemoryAdminStore, MemoryQuestionStore, PgAdminStore, PgQuestionStore,
    QuestionStore,
};
