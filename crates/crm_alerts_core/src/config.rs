//! Engine configuration.
//!
//! # Invariants
//! - `follow_up_window_days` is at least one day.

use chrono::Duration;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default trailing window for follow-up grouping.
pub const DEFAULT_FOLLOW_UP_WINDOW_DAYS: u32 = 7;

/// Tunables for the alert engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Activities at most this many days old (inclusive) count toward a
    /// follow-up alert.
    pub follow_up_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            follow_up_window_days: DEFAULT_FOLLOW_UP_WINDOW_DAYS,
        }
    }
}

impl EngineConfig {
    /// Checks configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.follow_up_window_days == 0 {
            return Err(ConfigError::EmptyFollowUpWindow);
        }
        Ok(())
    }

    /// Follow-up window as a duration.
    pub fn follow_up_window(&self) -> Duration {
        Duration::days(i64::from(self.follow_up_window_days))
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyFollowUpWindow,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFollowUpWindow => {
                write!(f, "follow_up_window_days must be at least 1")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};

    #[test]
    fn default_window_is_seven_days() {
        let config = EngineConfig::default();
        assert_eq!(config.follow_up_window_days, 7);
        assert_eq!(config.follow_up_window().num_days(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = EngineConfig {
            follow_up_window_days: 0,
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyFollowUpWindow));
    }
}
