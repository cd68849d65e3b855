//! Outstation configuration

use crate::simulation::DRIFT_PERIOD;
use iec101_link::AddressWidth;
use iec101_transport::RetryPolicy;
use std::time::Duration;

/// Outstation configuration
///
/// Defaults match the reference station: two-byte link addresses, 100 ms
/// between interrogation reply frames, reads retried every second without
/// limit, drift every five seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct OutstationConfig {
    /// Link address width shared with the master
    pub address_width: AddressWidth,
    /// Pause between consecutive frames of an interrogation reply
    pub scan_delay: Duration,
    /// How read errors are waited out
    pub retry_policy: RetryPolicy,
    /// Period of the drawn power simulation
    pub drift_period: Duration,
}

impl Default for OutstationConfig {
    fn default() -> Self {
        Self {
            address_width: AddressWidth::Two,
            scan_delay: Duration::from_millis(100),
            retry_policy: RetryPolicy::unbounded(Duration::from_secs(1)),
            drift_period: DRIFT_PERIOD,
        }
    }
}

impl OutstationConfig {
    /// Set the link address width; must match the master's
    pub fn with_address_width(mut self, width: AddressWidth) -> Self {
        self.address_width = width;
        self
    }

    /// Set the pause between interrogation reply frames
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    /// Set how failed reads are retried
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the period of [`run_drift`](crate::run_drift)
    pub fn with_drift_period(mut self, period: Duration) -> Self {
        self.drift_period = period;
        self
    }
}
