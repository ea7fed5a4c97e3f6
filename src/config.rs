use crate::error::{BankError, Result};
use chrono::TimeDelta;

/// Hours an unassigned order waits before it counts as priority.
pub const DEFAULT_PRIORITY_THRESHOLD_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    priority_threshold: TimeDelta,
}

impl EngineConfig {
    pub fn new(priority_threshold: TimeDelta) -> Result<Self> {
        if priority_threshold <= TimeDelta::zero() {
            return Err(BankError::ConfigError(
                "priority threshold must be positive".to_string(),
            ));
        }
        Ok(Self { priority_threshold })
    }

    pub fn with_threshold_hours(hours: i64) -> Result<Self> {
        let threshold = TimeDelta::try_hours(hours).ok_or_else(|| {
            BankError::ConfigError(format!("priority threshold of {hours}h is out of range"))
        })?;
        Self::new(threshold)
    }

    pub fn priority_threshold(&self) -> TimeDelta {
        self.priority_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            priority_threshold: TimeDelta::hours(DEFAULT_PRIORITY_THRESHOLD_HOURS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `obs_core=debug`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
