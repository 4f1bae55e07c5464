//! Retry utilities: backoff builders for store transactions.
//!
//! Uses `backon` for exponential backoff with jitter.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Backoff for compare-and-set transaction retries.
///
/// - Min delay: 1ms
/// - Max delay: 200ms
/// - Max retries: `max_retries` (so up to `max_retries + 1` attempts)
/// - Jitter enabled
pub fn transaction_backoff(max_retries: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(200))
        .with_max_times(max_retries)
        .with_jitter()
}

/// Backoff for re-establishing a dropped live query.
///
/// - Min delay: 100ms
/// - Max delay: 5s
/// - Max attempts: 30
/// - Jitter enabled
pub fn resubscribe_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(5))
        .with_max_times(30)
        .with_jitter()
}
