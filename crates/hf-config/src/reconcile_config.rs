use crate::{ConfigError, ConfigErrorResult};

use std::time::Duration;

use serde::Deserialize;

// Poll interval constraints
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;
pub const MAX_POLL_INTERVAL_SECS: u64 = 86_400;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

// A hung validation must not block the next tick
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_CHECK_ON_VISIBLE: bool = true;

/// Session re-validation schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Seconds between background session checks while signed in
    pub poll_interval_secs: u64,
    /// Upper bound on a single session check
    pub timeout_secs: u64,
    /// Re-check when the view becomes visible again
    pub check_on_visible: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            check_on_visible: DEFAULT_CHECK_ON_VISIBLE,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS
            || self.poll_interval_secs > MAX_POLL_INTERVAL_SECS
        {
            return Err(ConfigError::reconcile(format!(
                "reconcile.poll_interval_secs must be {}-{}, got {}",
                MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, self.poll_interval_secs
            )));
        }

        if self.timeout_secs < MIN_TIMEOUT_SECS || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::reconcile(format!(
                "reconcile.timeout_secs must be {}-{}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }

        if self.timeout_secs >= self.poll_interval_secs {
            return Err(ConfigError::reconcile(format!(
                "reconcile.timeout_secs ({}) must be shorter than poll_interval_secs ({})",
                self.timeout_secs, self.poll_interval_secs
            )));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
