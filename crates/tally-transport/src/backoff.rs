use std::time::Duration;

use rand::Rng;

/// Parameters of the retry exponential backoff function.
pub const RETRY_BASE_DELAY_MS: u64 = 40;
pub const RETRY_MAX_DELAY_MS: u64 = 20_000;

/// Wall-clock budget for all attempts of one logical call. Once elapsed
/// time exceeds this, the triggering error is surfaced regardless of
/// retriability.
pub const RETRY_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay to sleep before attempt `attempt` (1-based). The first attempt
/// never sleeps; attempt n > 1 sleeps a uniformly random duration in
/// `[1, min(BASE * 2^(n-1), MAX)]` milliseconds.
pub fn backoff_delay(attempt: u32) -> Duration {
    // 40 * 2^9 already exceeds the 20s cap, so larger exponents need no
    // shifting (and must not: the shift would overflow).
    let cap = if attempt > 10 {
        RETRY_MAX_DELAY_MS
    } else {
        (RETRY_BASE_DELAY_MS << attempt.saturating_sub(1)).min(RETRY_MAX_DELAY_MS)
    };
    Duration::from_millis(rand::thread_rng().gen_range(1..=cap))
}
