//! Engine configuration loaded from environment variables.
//!
//! | Env var                          | Default |
//! |----------------------------------|---------|
//! | `ESCALATION_SWEEP_INTERVAL_SECS` | `300`   |
//! | `ESCALATION_SCHEDULER_ENABLED`   | `true`  |
//! | `ESCALATION_SWEEP_CONCURRENCY`   | `4`     |
//! | `REPOSITORY_TIMEOUT_SECS`        | `10`    |
//! | `AUTO_ACKNOWLEDGE_ON_ASSIGN`     | `true`  |
//!
//! Values that fail to parse (or are zero where zero makes no sense) fall
//! back to the default with a warning rather than aborting startup.

use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_SWEEP_CONCURRENCY: usize = 4;
const DEFAULT_REPOSITORY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between scheduler sweeps. The first sweep runs immediately.
    pub sweep_interval: Duration,
    pub scheduler_enabled: bool,
    /// Tickets escalated in parallel within one sweep.
    pub sweep_concurrency: usize,
    /// Upper bound on any single store call before it counts as unavailable.
    pub repository_timeout: Duration,
    /// Assigning an `open` ticket also moves it to `acknowledged`.
    pub auto_acknowledge_on_assign: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            scheduler_enabled: true,
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
            repository_timeout: Duration::from_secs(DEFAULT_REPOSITORY_TIMEOUT_SECS),
            auto_acknowledge_on_assign: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let sweep_secs = positive(
            "ESCALATION_SWEEP_INTERVAL_SECS",
            parse_or(&lookup, "ESCALATION_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS),
            DEFAULT_SWEEP_INTERVAL_SECS,
        );
        let concurrency = positive(
            "ESCALATION_SWEEP_CONCURRENCY",
            parse_or(&lookup, "ESCALATION_SWEEP_CONCURRENCY", DEFAULT_SWEEP_CONCURRENCY),
            DEFAULT_SWEEP_CONCURRENCY,
        );
        let timeout_secs = positive(
            "REPOSITORY_TIMEOUT_SECS",
            parse_or(&lookup, "REPOSITORY_TIMEOUT_SECS", DEFAULT_REPOSITORY_TIMEOUT_SECS),
            DEFAULT_REPOSITORY_TIMEOUT_SECS,
        );

        Self {
            sweep_interval: Duration::from_secs(sweep_secs),
            scheduler_enabled: flag_or(&lookup, "ESCALATION_SCHEDULER_ENABLED", true),
            sweep_concurrency: concurrency,
            repository_timeout: Duration::from_secs(timeout_secs),
            auto_acknowledge_on_assign: flag_or(&lookup, "AUTO_ACKNOWLEDGE_ON_ASSIGN", true),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid config value, using default");
            default
        }),
    }
}

fn flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(key, value = %raw, default, "Invalid config flag, using default");
            default
        }
    }
}

fn positive<T>(key: &str, value: T, default: T) -> T
where
    T: PartialEq + Default + Copy + std::fmt::Display,
{
    if value == T::default() {
        tracing::warn!(key, default = %default, "Config value must be positive, using default");
        default
    } else {
        value
    }
}
