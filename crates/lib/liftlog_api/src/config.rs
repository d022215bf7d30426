//! API server configuration.

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::Duration;
use liftlog_core::auth::password::DEFAULT_BCRYPT_COST;
use liftlog_core::workouts::EntryPolicy;
use tracing::warn;

/// Work factors bcrypt accepts.
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

/// One hour up to one year.
const TOKEN_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=24 * 365;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8001").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Maximum number of pooled database connections.
    pub max_connections: u32,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
    /// Lifetime of an authentication token.
    pub token_ttl: Duration,
    /// Rules applied to workout entry sets.
    pub entry_policy: EntryPolicy,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                              |
    /// |--------------------------|--------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:8001`                     |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/liftlog`  |
    /// | `DB_MAX_CONNECTIONS`     | `5`                                  |
    /// | `BCRYPT_COST`            | `12`                                 |
    /// | `AUTH_TOKEN_TTL_HOURS`   | `24`                                 |
    /// | `ENTRY_REQUIRE_MEASURE`  | `true`                               |
    /// | `ENTRY_CONTIGUOUS_ORDER` | `false`                              |
    /// | `MAX_WORKOUT_ENTRIES`    | `100`                                |
    pub fn from_env() -> Self {
        let defaults = EntryPolicy::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8001".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/liftlog".into()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 5),
            bcrypt_cost: env_in_range("BCRYPT_COST", DEFAULT_BCRYPT_COST, BCRYPT_COST_RANGE),
            token_ttl: Duration::hours(env_in_range(
                "AUTH_TOKEN_TTL_HOURS",
                24,
                TOKEN_TTL_HOURS_RANGE,
            )),
            entry_policy: EntryPolicy {
                require_measure: env_or("ENTRY_REQUIRE_MEASURE", defaults.require_measure),
                require_contiguous_order: env_or(
                    "ENTRY_CONTIGUOUS_ORDER",
                    defaults.require_contiguous_order,
                ),
                max_entries: env_or("MAX_WORKOUT_ENTRIES", defaults.max_entries),
            },
        }
    }

    /// Defaults for tests: ephemeral port and the cheapest bcrypt cost.
    pub fn test_default() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            pg_connection_url: "postgres://localhost:5432/liftlog_test".into(),
            max_connections: 1,
            bcrypt_cost: 4,
            token_ttl: Duration::hours(24),
            entry_policy: EntryPolicy::default(),
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable configuration value");
            default
        }),
        Err(_) => default,
    }
}

/// Like [`env_or`], but out-of-range values also fall back to `default`.
fn env_in_range<T>(key: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let value = env_or(key, default);
    if range.contains(&value) {
        return value;
    }
    warn!(
        key,
        %value,
        min = %range.start(),
        max = %range.end(),
        "configuration value out of range, using default"
    );
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_missing_and_garbage() {
        assert_eq!(7u32, env_or("LIFTLOG_TEST_SURELY_UNSET", 7u32));

        // SAFETY: this test is the only reader of this variable.
        unsafe { std::env::set_var("LIFTLOG_TEST_GARBAGE", "not-a-number") };
        assert_eq!(3u32, env_or("LIFTLOG_TEST_GARBAGE", 3u32));

        unsafe { std::env::set_var("LIFTLOG_TEST_BOOL", " false ") };
        assert!(!env_or("LIFTLOG_TEST_BOOL", true));
    }

    #[test]
    fn out_of_range_cost_and_ttl_fall_back_to_defaults() {
        // SAFETY: each variable here is read only by this test.
        unsafe { std::env::set_var("LIFTLOG_TEST_COST_HIGH", "99") };
        unsafe { std::env::set_var("LIFTLOG_TEST_COST_LOW", "2") };
        unsafe { std::env::set_var("LIFTLOG_TEST_COST_OK", "10") };
        unsafe { std::env::set_var("LIFTLOG_TEST_TTL_HUGE", "9223372036854775807") };
        unsafe { std::env::set_var("LIFTLOG_TEST_TTL_NEGATIVE", "-5") };

        assert_eq!(12, env_in_range("LIFTLOG_TEST_COST_HIGH", 12, BCRYPT_COST_RANGE));
        assert_eq!(12, env_in_range("LIFTLOG_TEST_COST_LOW", 12, BCRYPT_COST_RANGE));
        assert_eq!(10, env_in_range("LIFTLOG_TEST_COST_OK", 12, BCRYPT_COST_RANGE));
        assert_eq!(24, env_in_range("LIFTLOG_TEST_TTL_HUGE", 24, TOKEN_TTL_HOURS_RANGE));
        assert_eq!(24, env_in_range("LIFTLOG_TEST_TTL_NEGATIVE", 24, TOKEN_TTL_HOURS_RANGE));

        // The largest accepted TTL still yields a usable expiry.
        let max = Duration::hours(*TOKEN_TTL_HOURS_RANGE.end());
        assert!(chrono::Utc::now().checked_add_signed(max).is_some());
    }

    #[test]
    fn test_default_uses_cheap_hashing() {
        let config = ApiConfig::test_default();
        assert_eq!(4, config.bcrypt_cost);
        assert_eq!(Duration::hours(24), config.token_ttl);
        assert_eq!(EntryPolicy::default(), config.entry_policy);
    }
}
