//! # Global engine configuration.
//!
//! Provides [`Config`], the centralized settings for worker pools and the
//! verification harness.
//!
//! Config is used in two ways:
//! 1. **Scheduler creation**: `ParallelScheduler::new(&config)` or `SchedulerKind::build(&config)`
//! 2. **Verification defaults**: `StepVerifier::create_with(seq, &config)`
//!
//! ## Sentinel values
//! - `workers = 0` → one worker per available core (tokio default)
//! - `max_concurrent = 0` → unlimited (no semaphore created)
//!
//! ## Environment overrides
//! [`Config::from_env`] starts from [`Config::default`] and applies:
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `FLOWLINE_WORKERS` | `usize` | `workers` |
//! | `FLOWLINE_MAX_CONCURRENT` | `usize` | `max_concurrent` |
//! | `FLOWLINE_THREAD_NAME` | `String` | `thread_name` |
//! | `FLOWLINE_VERIFY_TIMEOUT_MS` | `u64` | `verify_timeout` |

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable name for worker thread count.
pub const ENV_WORKERS: &str = "FLOWLINE_WORKERS";
/// Environment variable name for the concurrency cap of parallel work.
pub const ENV_MAX_CONCURRENT: &str = "FLOWLINE_MAX_CONCURRENT";
/// Environment variable name for worker thread names.
pub const ENV_THREAD_NAME: &str = "FLOWLINE_THREAD_NAME";
/// Environment variable name for the verifier's per-signal wait (milliseconds).
pub const ENV_VERIFY_TIMEOUT_MS: &str = "FLOWLINE_VERIFY_TIMEOUT_MS";

/// Global configuration for schedulers and verification.
///
/// ## Field semantics
/// - `workers`: Worker threads of an owned parallel pool (`0` = one per core)
/// - `max_concurrent`: Scheduled work items running at once (`0` = unlimited)
/// - `thread_name`: Name given to worker threads
/// - `verify_timeout`: How long a real-time verifier waits for each signal
#[derive(Clone, Debug)]
pub struct Config {
    /// Worker threads of a parallel scheduler that owns its runtime.
    ///
    /// - `0` = tokio default (one per available core)
    /// - `n > 0` = exactly `n` workers
    pub workers: usize,

    /// Maximum number of scheduled work items running simultaneously.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` items run at once; the rest wait for a permit
    ///
    /// Waiting for a permit is cancellable like any other scheduler wait.
    pub max_concurrent: usize,

    /// Name of worker threads (visible in debuggers and panics).
    pub thread_name: String,

    /// Upper bound a real-time verifier waits for the next signal.
    pub verify_timeout: Duration,
}

impl Config {
    /// Returns the worker count as an `Option`.
    ///
    /// - `None` → runtime default
    /// - `Some(n)` → exactly `n` workers
    #[inline]
    pub fn worker_threads(&self) -> Option<usize> {
        if self.workers == 0 {
            None
        } else {
            Some(self.workers)
        }
    }

    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent work items
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Builds a config from [`Config::default`] plus `FLOWLINE_*` overrides.
    ///
    /// Only variables that are set are applied. A set but unparseable value
    /// is an error rather than being silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(cfg)
    }

    fn apply_overrides(
        &mut self,
        read: impl Fn(&'static str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = read(ENV_WORKERS) {
            self.workers = parse_usize(ENV_WORKERS, &val)?;
        }
        if let Some(val) = read(ENV_MAX_CONCURRENT) {
            self.max_concurrent = parse_usize(ENV_MAX_CONCURRENT, &val)?;
        }
        if let Some(val) = read(ENV_THREAD_NAME) {
            self.thread_name = val;
        }
        if let Some(val) = read(ENV_VERIFY_TIMEOUT_MS) {
            let ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(ENV_VERIFY_TIMEOUT_MS, &val, "milliseconds as u64"))?;
            self.verify_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `workers = 0` (one per core)
    /// - `max_concurrent = 0` (unlimited)
    /// - `thread_name = "flowline-worker"`
    /// - `verify_timeout = 5s`
    fn default() -> Self {
        Self {
            workers: 0,
            max_concurrent: 0,
            thread_name: "flowline-worker".to_string(),
            verify_timeout: Duration::from_secs(5),
        }
    }
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim()
        .parse::<usize>()
        .map_err(|_| invalid(var, val, "non-negative integer"))
}

fn invalid(var: &'static str, val: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: val.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn apply(vars: &[(&'static str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        let mut cfg = Config::default();
        cfg.apply_overrides(|var| env.get(var).cloned())?;
        Ok(cfg)
    }

    #[test]
    fn test_sentinels_map_to_none() {
        let cfg = Config::default();
        assert_eq!(cfg.worker_threads(), None);
        assert_eq!(cfg.concurrency_limit(), None);
    }

    #[test]
    fn test_overrides_are_applied() {
        let cfg = apply(&[
            (ENV_WORKERS, "3"),
            (ENV_MAX_CONCURRENT, " 8 "),
            (ENV_THREAD_NAME, "pool"),
            (ENV_VERIFY_TIMEOUT_MS, "250"),
        ])
        .unwrap();
        assert_eq!(cfg.worker_threads(), Some(3));
        assert_eq!(cfg.concurrency_limit(), Some(8));
        assert_eq!(cfg.thread_name, "pool");
        assert_eq!(cfg.verify_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_unparseable_override_is_rejected() {
        let err = apply(&[(ENV_WORKERS, "many")]).unwrap_err();
        assert_eq!(err.as_label(), "config_invalid_value");
        assert!(err.to_string().contains(ENV_WORKERS));
    }
}
