//! Master configuration and builder
//!
//! ```rust,no_run
//! use iec101_master::MasterConfigBuilder;
//! use std::time::Duration;
//!
//! let config = MasterConfigBuilder::new()
//!     .link_address(1)
//!     .common_address(1)
//!     .setpoint_interval(Duration::from_secs(10))
//!     .build()?;
//! # Ok::<(), iec101_core::Iec101Error>(())
//! ```

use iec101_core::{Iec101Error, Iec101Result};
use iec101_link::AddressWidth;
use iec101_transport::RetryPolicy;
use std::time::Duration;

/// Information object address of the power limitation setpoint
pub const DEFAULT_SETPOINT_IOA: u16 = 2;

/// Master configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MasterConfig {
    /// Link address of the outstation
    pub link_address: u16,
    /// Common address of ASDU used in every command
    pub common_address: u16,
    /// Link address width shared with the outstation
    pub address_width: AddressWidth,
    /// Period of the setpoint command timer
    pub setpoint_interval: Duration,
    /// Information object address the setpoints are written to
    pub setpoint_ioa: u16,
    /// Bound on the wait for the link reset acknowledgement; `None` waits forever
    pub reset_ack_timeout: Option<Duration>,
    /// How end-of-input on the receive path is waited out
    pub retry_policy: RetryPolicy,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            link_address: 1,
            common_address: 1,
            address_width: AddressWidth::Two,
            setpoint_interval: Duration::from_secs(10),
            setpoint_ioa: DEFAULT_SETPOINT_IOA,
            reset_ack_timeout: None,
            retry_policy: RetryPolicy::unbounded(Duration::from_millis(100)),
        }
    }
}

impl MasterConfig {
    /// Check the configuration for values the session cannot run with
    pub fn validate(&self) -> Iec101Result<()> {
        if self.link_address > self.address_width.max_address() {
            return Err(Iec101Error::Config(format!(
                "Link address {} does not fit a {}-byte address field",
                self.link_address, self.address_width
            )));
        }
        if self.setpoint_interval.is_zero() {
            return Err(Iec101Error::Config(
                "Setpoint interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`MasterConfig`]
///
/// Starts from the defaults and validates on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct MasterConfigBuilder {
    config: MasterConfig,
}

impl MasterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link_address(mut self, address: u16) -> Self {
        self.config.link_address = address;
        self
    }

    pub fn common_address(mut self, address: u16) -> Self {
        self.config.common_address = address;
        self
    }

    pub fn address_width(mut self, width: AddressWidth) -> Self {
        self.config.address_width = width;
        self
    }

    pub fn setpoint_interval(mut self, interval: Duration) -> Self {
        self.config.setpoint_interval = interval;
        self
    }

    pub fn setpoint_ioa(mut self, ioa: u16) -> Self {
        self.config.setpoint_ioa = ioa;
        self
    }

    pub fn reset_ack_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.reset_ack_timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry_policy = policy;
        self
    }

    /// Validate and return the configuration
    ///
    /// # Errors
    /// Returns `Config` if the link address does not fit the address width or
    /// the setpoint interval is zero
    pub fn build(self) -> Iec101Result<MasterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
