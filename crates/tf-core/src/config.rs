//! Monitor configuration.
//!
//! Typically embedded in an application-level config file (JSON/TOML) and
//! passed to `TrafficMonitor::new` and `QueueEstimator::with_threshold`.

use crate::{CoreError, CoreResult};

/// Thresholds and time units used by the traffic monitor and queue estimator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// A running vehicle slower than this (distance units per time unit) is
    /// waiting.  Default: 0.1.
    pub waiting_speed_threshold: f64,

    /// A vehicle slower than this counts towards its lane's queue.
    /// Default: 0.1.
    pub queue_speed_threshold: f64,

    /// Waiting time added per step spent below the waiting threshold.
    /// Default: 1.0 (one time unit per step).
    pub step_length: f64,
}

impl MonitorConfig {
    /// Reject negative or non-finite values.
    pub fn validate(&self) -> CoreResult<()> {
        let fields = [
            ("waiting_speed_threshold", self.waiting_speed_threshold),
            ("queue_speed_threshold",   self.queue_speed_threshold),
            ("step_length",             self.step_length),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Config(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            waiting_speed_threshold: 0.1,
            queue_speed_threshold:   0.1,
            step_length:             1.0,
        }
    }
}
