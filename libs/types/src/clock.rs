//! Wall-clock helpers
//!
//! Timestamps are informational only (status reporting, logs). Ordering is
//! always decided by sequence numbers, never by time.

use chrono::Utc;

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_after_2024() {
        assert!(now_millis() > 1_704_067_200_000);
    }
}
