//! Sliding-window rate limiting backed by the scoped store

use serde::{Deserialize, Serialize};

use crate::application::errors::{CorruptionError, StorageError};
use crate::domain::entities::{User, Value};
use crate::domain::traits::Storage;

/// Whose history a limit counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitScope {
    PerUser,
    Global,
}

/// Rate-limit policy attached to a command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimitConfig {
    pub times_per_interval: u32,
    pub seconds_per_interval: i64,
    /// Storage key of the history
    pub identifier: String,
    pub scope: RateLimitScope,
    /// Reply sent on rejection; `{remaining}` expands to the wait in seconds
    #[serde(default = "default_limit_message")]
    pub message: String,
}

fn default_limit_message() -> String {
    "Rate limited. Try again in {remaining}s.".to_string()
}

impl RateLimitConfig {
    pub fn per_user(identifier: impl Into<String>, times: u32, seconds: i64) -> Self {
        Self {
            times_per_interval: times,
            seconds_per_interval: seconds,
            identifier: identifier.into(),
            scope: RateLimitScope::PerUser,
            message: default_limit_message(),
        }
    }

    pub fn global(identifier: impl Into<String>, times: u32, seconds: i64) -> Self {
        Self {
            scope: RateLimitScope::Global,
            ..Self::per_user(identifier, times, seconds)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Zero times or zero seconds turns limiting off
    pub fn is_disabled(&self) -> bool {
        self.times_per_interval == 0 || self.seconds_per_interval <= 0
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Limited { remaining: i64 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Rate limiter for one command
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Timestamps still inside the window, ascending
    pub fn clean_history(&self, now: i64, history: &[i64]) -> Vec<i64> {
        let mut cleaned: Vec<i64> = history
            .iter()
            .copied()
            .filter(|t| now.saturating_sub(*t) < self.config.seconds_per_interval)
            .collect();
        cleaned.sort_unstable();
        cleaned
    }

    pub fn rate_limited(&self, now: i64, history: &[i64]) -> bool {
        self.clean_history(now, history).len() >= self.config.times_per_interval as usize
    }

    /// Seconds until the oldest in-window entry ages out; 0 when a call
    /// would be admitted now
    pub fn time_remaining(&self, now: i64, history: &[i64]) -> i64 {
        let cleaned = self.clean_history(now, history);
        if cleaned.len() < self.config.times_per_interval as usize {
            return 0;
        }
        match cleaned.first() {
            Some(oldest) => self
                .config
                .seconds_per_interval
                .saturating_sub(now.saturating_sub(*oldest)),
            None => 0,
        }
    }

    /// Record an attempt by `user` at `now` and decide admission
    ///
    /// Every attempt is appended, admitted or not. The written history keeps
    /// at most `times_per_interval` newest in-window entries. Only corruption
    /// is returned as an error; a failed flush is logged and the decision
    /// stands.
    pub fn check(&self, storage: &dyn Storage, user: &User, now: i64) -> Result<Admission, StorageError> {
        let history = self.load(storage, user)?;
        let cleaned = self.clean_history(now, &history);

        let admission = if cleaned.len() >= self.config.times_per_interval as usize {
            Admission::Limited {
                remaining: self.time_remaining(now, &cleaned),
            }
        } else {
            Admission::Admitted
        };

        let mut updated = cleaned;
        updated.push(now);
        updated.sort_unstable();
        let keep = self.config.times_per_interval as usize;
        if updated.len() > keep {
            updated.drain(..updated.len() - keep);
        }
        if let Err(e) = self.store(storage, user, updated) {
            tracing::warn!(
                "Failed to persist rate-limit history '{}': {}",
                self.config.identifier,
                e
            );
        }

        Ok(admission)
    }

    /// Rejection reply text
    pub fn limit_message(&self, remaining: i64) -> String {
        self.config
            .message
            .replace("{remaining}", &remaining.to_string())
    }

    fn load(&self, storage: &dyn Storage, user: &User) -> Result<Vec<i64>, StorageError> {
        let key = &self.config.identifier;
        let (value, scope) = match self.config.scope {
            RateLimitScope::PerUser => (storage.get_user_value(user, key), format!("user {}", user)),
            RateLimitScope::Global => (storage.get_global_value(key), "global".to_string()),
        };
        match value {
            None => Ok(Vec::new()),
            Some(value) => match value.as_timestamps() {
                Some(history) => Ok(history.to_vec()),
                None => Err(CorruptionError {
                    scope,
                    key: key.clone(),
                    expected: "timestamp list",
                    found: value.kind(),
                }
                .into()),
            },
        }
    }

    fn store(&self, storage: &dyn Storage, user: &User, history: Vec<i64>) -> Result<(), StorageError> {
        let key = &self.config.identifier;
        let value = Value::Timestamps(history);
        match self.config.scope {
            RateLimitScope::PerUser => storage.set_user_value(user, key, value),
            RateLimitScope::Global => storage.set_global_value(key, value),
        }
    }
}
