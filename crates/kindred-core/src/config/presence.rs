//! Presence sweep configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Controls how silent users are aged out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Seconds between inactivity sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Seconds of silence after which a user is forced offline.
    #[serde(default = "default_inactivity_threshold")]
    pub inactivity_threshold_seconds: u64,
}

impl PresenceConfig {
    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Inactivity threshold as a `Duration`.
    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_seconds)
    }

    /// Checks that the interval is non-zero and the threshold exceeds it.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.sweep_interval_seconds == 0 {
            return Err(AppError::configuration(
                "presence.sweep_interval_seconds must be greater than zero",
            ));
        }
        if self.inactivity_threshold_seconds <= self.sweep_interval_seconds {
            return Err(AppError::configuration(format!(
                "presence.inactivity_threshold_seconds ({}) must exceed sweep_interval_seconds ({})",
                self.inactivity_threshold_seconds, self.sweep_interval_seconds
            )));
        }
        Ok(())
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: default_sweep_interval(),
            inactivity_threshold_seconds: default_inactivity_threshold(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_inactivity_threshold() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_must_exceed_interval() {
        let config = PresenceConfig {
            sweep_interval_seconds: 60,
            inactivity_threshold_seconds: 60,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PresenceConfig {
            sweep_interval_seconds: 0,
            inactivity_threshold_seconds: 300,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = PresenceConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.inactivity_threshold(), Duration::from_secs(300));
    }
}
