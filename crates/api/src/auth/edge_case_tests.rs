//! Edge case tests for the login flow
//!
//! Boundary conditions around:
//! - Lockout threshold and expiry
//! - Timing floor on cheap outcomes
//! - Login history bound
//! - Fault isolation of post-decision writes

#[cfg(test)]
mod lockout_tests {
    use std::sync::Arc;

    use mr_abdallah_shared::{AdminStore, MemoryAdminStore, LOCKOUT_DURATION, MAX_LOGIN_ATTEMPTS};
    use time::{Duration, OffsetDateTime};
    use tokio::time::Instant;

    use super::super::login::{login, ClientInfo, LoginOutcome};
    use super::super::test_support::*;

    fn client() -> ClientInfo {
        ClientInfo {
            ip: "203.0.113.7".to_string(),
            user_agent: Some("tests/1.0".to_string()),
        }
    }

    async fn setup() -> (Arc<MemoryAdminStore>, Arc<CountingHasher>, uuid::Uuid) {
        let store = Arc::new(MemoryAdminStore::new());
        let admin = admin_with_password(TEST_EMAIL, TEST_PASSWORD);
        let id = admin.id;
        store.insert(admin).await;
        (store, Arc::new(CountingHasher::default()), id)
    }

    // =========================================================================
    // Five wrong passwords lock the account; the sixth never reaches the hasher
    // =========================================================================
    #[tokio::test(start_paused = true)]
    async fn test_sixth_attempt_locked_without_password_check() {
        let (store, hasher, id) = setup().await;
        let auth = auth_state(store.clone(), hasher.clone());

        for expected in 1..=MAX_LOGIN_ATTEMPTS {
            let outcome = login(
                &auth,
                Instant::now(),
                &login_body(TEST_EMAIL, "wrong-password1"),
                client(),
            )
            .await;
            assert!(matches!(outcome, LoginOutcome::WrongPassword));

            let admin = store.find_by_id(id).await.unwrap().unwrap();
            assert_eq!(admin.login_attempts, expected);
            assert_eq!(admin.lock_until.is_some(), expected == MAX_LOGIN_ATTEMPTS);
        }
        assert_eq!(hasher.verify_calls(), 5);

        let outcome = login(
            &auth,
            Instant::now(),
            &login_body(TEST_EMAIL, TEST_PASSWORD),
            client(),
        )
        .await;

        assert!(matches!(outcome, LoginOutcome::Locked { .. }));
        assert_eq!(hasher.verify_calls(), 5, "hasher must not run while locked");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_until_is_fifteen_minutes_out() {
        let (store, hasher, id) = setup().await;
        let auth = auth_state(store.clone(), hasher);
        let before = OffsetDateTime::now_utc();

        for _ in 0..MAX_LOGIN_ATTEMPTS {
            login(&auth, Instant::now(), &login_body(TEST_EMAIL, "nope1234"), client()).await;
        }

        let until = store.find_by_id(id).await.unwrap().unwrap().lock_until.unwrap();
        assert!(until >= before + LOCKOUT_DURATION);
        assert!(until <= OffsetDateTime::now_utc() + LOCKOUT_DURATION);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_attempt_is_recorded_as_failure() {
        let (store, hasher, id) = setup().await;
        let mut admin = store.find_by_id(id).await.unwrap().unwrap();
        admin.login_attempts = 5;
        admin.lock_until = Some(OffsetDateTime::now_utc() + Duration::minutes(10));
        store.insert(admin).await;

        let auth = auth_state(store.clone(), hasher);
        login(&auth, Instant::now(), &login_body(TEST_EMAIL, TEST_PASSWORD), client()).await;

        let admin = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(admin.login_history.len(), 1);
        assert!(!admin.login_history[0].success);
        // counter untouched while locked
        assert_eq!(admin.login_attempts, 5);
    }

    // =========================================================================
    // A failure after the lock expired starts a new window at 1
    // =========================================================================
    #[tokio::test(start_paused = true)]
    async fn test_failure_after_expiry_restarts_window() {
        let (store, hasher, id) = setup().await;
        let mut admin = store.find_by_id(id).await.unwrap().unwrap();
        admin.login_attempts = 5;
        admin.lock_until = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
        store.insert(admin).await;

        let auth = auth_state(store.clone(), hasher.clone());
        let outcome = login(&auth, Instant::now(), &login_body(TEST_EMAIL, "nope1234"), client()).await;

        assert!(matches!(outcome, LoginOutcome::WrongPassword));
        assert_eq!(hasher.verify_calls(), 1);
        let admin = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(admin.login_attempts, 1);
        assert_eq!(admin.lock_until, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_expiry_clears_lock() {
        let (store, hasher, id) = setup().await;
        let mut admin = store.find_by_id(id).await.unwrap().unwrap();
        admin.login_attempts = 5;
        admin.lock_until = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
        store.insert(admin).await;

        let auth = auth_state(store.clone(), hasher);
        let outcome = login(&auth, Instant::now(), &login_body(TEST_EMAIL, TEST_PASSWORD), client()).await;

        assert!(matches!(outcome, LoginOutcome::Success(_)));
        let admin = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(admin.login_attempts, 0);
        assert_eq!(admin.lock_until, None);
    }
}

#[cfg(test)]
mod timing_tests {
    use std::sync::Arc;

    use mr_abdallah_shared::MemoryAdminStore;
    use tokio::time::Instant;

    use super::super::login::{login, ClientInfo, LoginOutcome};
    use super::super::test_support::*;
    use super::super::timing::LOGIN_RESPONSE_FLOOR;

    fn client() -> ClientInfo {
        ClientInfo {
            ip: "unknown".to_string(),
            user_agent: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_email_waits_for_floor() {
        let auth = auth_state(
            Arc::new(MemoryAdminStore::new()),
            Arc::new(CountingHasher::default()),
        );
        let started = Instant::now();

        let outcome = login(&auth, started, &login_body("ghost@b.com", TEST_PASSWORD), client()).await;

        assert!(matches!(outcome, LoginOutcome::UnknownUser));
        assert!(started.elapsed() >= LOGIN_RESPONSE_FLOOR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_waits_for_floor() {
        let auth = auth_state(
            Arc::new(MemoryAdminStore::new()),
            Arc::new(CountingHasher::default()),
        );
        let started = Instant::now();

        let outcome = login(&auth, started, b"{not json", client()).await;

        assert!(matches!(outcome, LoginOutcome::InvalidInput(_)));
        assert!(started.elapsed() >= LOGIN_RESPONSE_FLOOR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_waits_for_floor() {
        let store = FlakyAdminStore {
            fail_lookups: true,
            ..Default::default()
        };
        let auth = auth_state(Arc::new(store), Arc::new(CountingHasher::default()));
        let started = Instant::now();

        let outcome = login(&auth, started, &login_body(TEST_EMAIL, TEST_PASSWORD), client()).await;

        assert!(matches!(outcome, LoginOutcome::ServerError(_)));
        assert!(started.elapsed() >= LOGIN_RESPONSE_FLOOR);
    }
}

#[cfg(test)]
mod history_tests {
    use std::sync::Arc;

    use mr_abdallah_shared::{AdminStore, MemoryAdminStore, LOGIN_HISTORY_CAP};
    use tokio::time::Instant;

    use super::super::login::{login, ClientInfo, LoginOutcome};
    use super::super::test_support::*;

    // =========================================================================
    // The 21st recorded attempt evicts the oldest
    // =========================================================================
    #[tokio::test(start_paused = true)]
    async fn test_history_keeps_newest_twenty() {
        let store = Arc::new(MemoryAdminStore::new());
        let admin = admin_with_password(TEST_EMAIL, TEST_PASSWORD);
        let id = admin.id;
        store.insert(admin).await;
        let auth = auth_state(store.clone(), Arc::new(CountingHasher::default()));

        for i in 0..=LOGIN_HISTORY_CAP {
            let client = ClientInfo {
                ip: format!("10.0.0.{i}"),
                user_agent: None,
            };
            let outcome = login(&auth, Instant::now(), &login_body(TEST_EMAIL, TEST_PASSWORD), client).await;
            assert!(matches!(outcome, LoginOutcome::Success(_)));
        }

        let history = store.find_by_id(id).await.unwrap().unwrap().login_history;
        assert_eq!(history.len(), LOGIN_HISTORY_CAP);
        assert_eq!(history[0].ip, "10.0.0.20");
        assert!(history.iter().all(|e| e.ip != "10.0.0.0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_and_malformed_attempts_leave_no_history() {
        let store = Arc::new(MemoryAdminStore::new());
        let admin = admin_with_password(TEST_EMAIL, TEST_PASSWORD);
        let id = admin.id;
        store.insert(admin).await;
        let auth = auth_state(store.clone(), Arc::new(CountingHasher::default()));
        let client = ClientInfo {
            ip: "unknown".to_string(),
            user_agent: None,
        };

        login(&auth, Instant::now(), &login_body("other@b.com", TEST_PASSWORD), client.clone()).await;
        login(&auth, Instant::now(), br#"{"email":"a@b.com"}"#, client).await;

        assert!(store.find_by_id(id).await.unwrap().unwrap().login_history.is_empty());
    }
}

#[cfg(test)]
mod fault_isolation_tests {
    use std::sync::Arc;

    use mr_abdallah_shared::AdminStore;
    use tokio::time::Instant;

    use super::super::login::{login, ClientInfo, LoginOutcome};
    use super::super::test_support::*;

    fn client() -> ClientInfo {
        ClientInfo {
            ip: "unknown".to_string(),
            user_agent: None,
        }
    }

    async fn flaky_store() -> Arc<FlakyAdminStore> {
        let store = FlakyAdminStore {
            fail_side_effects: true,
            ..Default::default()
        };
        store
            .inner
            .insert(admin_with_password(TEST_EMAIL, TEST_PASSWORD))
            .await;
        Arc::new(store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_survives_failed_bookkeeping() {
        let store = flaky_store().await;
        let auth = auth_state(store, Arc::new(CountingHasher::default()));

        let outcome = login(&auth, Instant::now(), &login_body(TEST_EMAIL, TEST_PASSWORD), client()).await;

        assert!(matches!(outcome, LoginOutcome::Success(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_stays_invalid_when_counter_write_fails() {
        let store = flaky_store().await;
        let auth = auth_state(store.clone(), Arc::new(CountingHasher::default()));

        let outcome = login(&auth, Instant::now(), &login_body(TEST_EMAIL, "nope1234"), client()).await;

        assert!(matches!(outcome, LoginOutcome::WrongPassword));
        let admin = store.find_by_email(TEST_EMAIL).await.unwrap().unwrap();
        assert_eq!(admin.login_attempts, 0);
    }
}
