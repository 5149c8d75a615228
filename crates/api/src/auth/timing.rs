//! Response timing floor for the login endpoint
//!
//! Cheap outcomes (malformed input, unknown email, locked account) would
//! otherwise answer faster than a password check and leak which branch ran.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Minimum wall-clock time before any login response is sent
pub const LOGIN_RESPONSE_FLOOR: Duration = Duration::from_millis(1000);

/// Run `fut`, then wait until at least `floor` has elapsed since `started`.
///
/// The wait is a timer, not a blocked thread.
pub async fn with_response_floor<F, T>(started: Instant, floor: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let output = fut.await;
    sleep_until(started + floor).await;
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fast_work_is_padded_to_floor() {
        let started = Instant::now();
        let value = with_response_floor(started, LOGIN_RESPONSE_FLOOR, async { 7 }).await;

        assert_eq!(value, 7);
        assert!(started.elapsed() >= LOGIN_RESPONSE_FLOOR);
        assert!(started.elapsed() < LOGIN_RESPONSE_FLOOR + Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_is_not_delayed_further() {
        let started = Instant::now();
        with_response_floor(started, LOGIN_RESPONSE_FLOOR, async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
        })
        .await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed < Duration::from_millis(1550));
    }

    #[tokio::test(start_paused = true)]
    async fn test_floor_does_not_block_other_tasks() {
        let started = Instant::now();
        let padded = tokio::spawn(with_response_floor(started, LOGIN_RESPONSE_FLOOR, async {}));
        let quick = tokio::spawn(async move { started.elapsed() });

        assert!(quick.await.unwrap() < LOGIN_RESPONSE_FLOOR);
        padded.await.unwrap();
    }
}
