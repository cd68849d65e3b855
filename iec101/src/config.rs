//! Runtime configuration file
//!
//! Both binaries read the same TOML layout; each uses the `transport` table and
//! its own role table. Every key is optional. Durations are milliseconds.
//!
//! ```toml
//! [transport]
//! kind = "serial"
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [master]
//! link_address = 1
//! common_address = 1
//! setpoint_interval_ms = 10000
//!
//! [outstation]
//! scan_delay_ms = 100
//! ```

use iec101_core::{Iec101Error, Iec101Result};
use iec101_link::AddressWidth;
use iec101_master::{MasterConfig, MasterConfigBuilder, DEFAULT_SETPOINT_IOA};
use iec101_outstation::{OutstationConfig, OutstationState};
use iec101_transport::{
    BoxedReader, BoxedWriter, RetryPolicy, SerialSettings, SerialTransport, TcpSettings,
    TcpTransport, TransportLayer, DEFAULT_BAUD_RATE,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub transport: TransportConfig,
    pub master: MasterSection,
    pub outstation: OutstationSection,
}

impl RuntimeConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Iec101Result<Self> {
        toml::from_str(text).map_err(|e| Iec101Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Iec101Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Iec101Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Iec101Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Byte channel the session runs on
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Serial line, 8E1
    Serial {
        #[serde(default = "default_serial_port")]
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// FT1.2 byte stream over TCP
    Tcp {
        address: String,
        /// Accept one peer instead of connecting out
        #[serde(default)]
        listen: bool,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

fn default_serial_port() -> String {
    DEFAULT_SERIAL_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Serial {
            port: default_serial_port(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: None,
        }
    }
}

impl TransportConfig {
    /// Open the channel and split it into read and write halves
    pub async fn open(&self) -> Iec101Result<(BoxedReader, BoxedWriter)> {
        match self {
            TransportConfig::Serial {
                port,
                baud_rate,
                timeout_ms,
            } => {
                let mut settings = SerialSettings::new(port.clone(), *baud_rate);
                settings.timeout = timeout_ms.map(Duration::from_millis);
                let mut transport = SerialTransport::new(settings);
                transport.open().await?;
                transport.split()
            }
            TransportConfig::Tcp {
                address,
                listen,
                timeout_ms,
            } => {
                let mut settings = TcpSettings::from_address(address, *listen)?;
                settings.timeout = timeout_ms.map(Duration::from_millis);
                let mut transport = TcpTransport::new(settings);
                transport.open().await?;
                transport.split()
            }
        }
    }
}

fn retry_policy(interval_ms: u64, max_attempts: Option<u32>) -> RetryPolicy {
    let interval = Duration::from_millis(interval_ms);
    match max_attempts {
        Some(max) => RetryPolicy::bounded(max, interval),
        None => RetryPolicy::unbounded(interval),
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// `[master]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MasterSection {
    pub link_address: u16,
    pub common_address: u16,
    pub address_width: u8,
    pub setpoint_interval_ms: u64,
    pub setpoint_ioa: u16,
    pub reset_ack_timeout_ms: Option<u64>,
    pub retry_interval_ms: u64,
    pub retry_max_attempts: Option<u32>,
}

impl Default for MasterSection {
    fn default() -> Self {
        let config = MasterConfig::default();
        Self {
            link_address: config.link_address,
            common_address: config.common_address,
            address_width: config.address_width.byte_length() as u8,
            setpoint_interval_ms: duration_ms(config.setpoint_interval),
            setpoint_ioa: DEFAULT_SETPOINT_IOA,
            reset_ack_timeout_ms: None,
            retry_interval_ms: duration_ms(config.retry_policy.interval),
            retry_max_attempts: config.retry_policy.max_attempts,
        }
    }
}

impl MasterSection {
    /// Build and validate the session configuration
    pub fn to_master_config(&self) -> Iec101Result<MasterConfig> {
        MasterConfigBuilder::new()
            .link_address(self.link_address)
            .common_address(self.common_address)
            .address_width(AddressWidth::try_from(self.address_width)?)
            .setpoint_interval(Duration::from_millis(self.setpoint_interval_ms))
            .setpoint_ioa(self.setpoint_ioa)
            .reset_ack_timeout(self.reset_ack_timeout_ms.map(Duration::from_millis))
            .retry_policy(retry_policy(self.retry_interval_ms, self.retry_max_attempts))
            .build()
    }
}

/// `[outstation]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutstationSection {
    pub address_width: u8,
    pub scan_delay_ms: u64,
    pub retry_interval_ms: u64,
    pub retry_max_attempts: Option<u32>,
    pub drift_period_ms: u64,
    pub power_drawn: i16,
    pub power_limitation: i16,
}

impl Default for OutstationSection {
    fn default() -> Self {
        let config = OutstationConfig::default();
        let state = OutstationState::default();
        Self {
            address_width: config.address_width.byte_length() as u8,
            scan_delay_ms: duration_ms(config.scan_delay),
            retry_interval_ms: duration_ms(config.retry_policy.interval),
            retry_max_attempts: config.retry_policy.max_attempts,
            drift_period_ms: duration_ms(config.drift_period),
            power_drawn: state.power_drawn,
            power_limitation: state.power_limitation,
        }
    }
}

impl OutstationSection {
    /// Build the session configuration
    pub fn to_outstation_config(&self) -> Iec101Result<OutstationConfig> {
        if self.drift_period_ms == 0 {
            return Err(Iec101Error::Config(
                "Drift period must be greater than zero".to_string(),
            ));
        }
        Ok(OutstationConfig::default()
            .with_address_width(AddressWidth::try_from(self.address_width)?)
            .with_scan_delay(Duration::from_millis(self.scan_delay_ms))
            .with_retry_policy(retry_policy(self.retry_interval_ms, self.retry_max_attempts))
            .with_drift_period(Duration::from_millis(self.drift_period_ms)))
    }

    /// Initial process values
    pub fn initial_state(&self) -> OutstationState {
        OutstationState {
            power_drawn: self.power_drawn,
            power_limitation: self.power_limitation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.master.to_master_config().unwrap(), MasterConfig::default());
        assert_eq!(
            config.outstation.to_outstation_config().unwrap(),
            OutstationConfig::default()
        );
        assert_eq!(config.outstation.initial_state(), OutstationState::default());
    }

    #[test]
    fn test_full_file() {
        let text = r#"
            [transport]
            kind = "tcp"
            address = "127.0.0.1:2404"
            listen = true

            [master]
            link_address = 3
            address_width = 1
            setpoint_interval_ms = 500
            reset_ack_timeout_ms = 2000
            retry_max_attempts = 5

            [outstation]
            scan_delay_ms = 0
            power_limitation = 18000
        "#;
        let config = RuntimeConfig::from_toml_str(text).unwrap();
        assert_eq!(
            config.transport,
            TransportConfig::Tcp {
                address: "127.0.0.1:2404".to_string(),
                listen: true,
                timeout_ms: None,
            }
        );

        let master = config.master.to_master_config().unwrap();
        assert_eq!(master.link_address, 3);
        assert_eq!(master.address_width, AddressWidth::One);
        assert_eq!(master.setpoint_interval, Duration::from_millis(500));
        assert_eq!(master.reset_ack_timeout, Some(Duration::from_millis(2000)));
        assert_eq!(master.retry_policy.max_attempts, Some(5));

        let outstation = config.outstation.to_outstation_config().unwrap();
        assert_eq!(outstation.scan_delay, Duration::ZERO);
        assert_eq!(config.outstation.initial_state().power_limitation, 18000);
        assert_eq!(config.outstation.initial_state().power_drawn, 1234);
    }

    #[test]
    fn test_serial_defaults() {
        let config = RuntimeConfig::from_toml_str("[transport]\nkind = \"serial\"\n").unwrap();
        assert_eq!(config.transport, TransportConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_width = RuntimeConfig::from_toml_str("[master]\naddress_width = 3\n").unwrap();
        assert!(bad_width.master.to_master_config().is_err());

        let unknown_key = RuntimeConfig::from_toml_str("[master]\nlink_addr = 1\n");
        assert!(matches!(unknown_key, Err(Iec101Error::Config(_))));

        let missing_address = RuntimeConfig::from_toml_str("[transport]\nkind = \"tcp\"\n");
        assert!(missing_address.is_err());
    }

    #[tokio::test]
    async fn test_invalid_tcp_address() {
        let transport = TransportConfig::Tcp {
            address: "not an address".to_string(),
            listen: false,
            timeout_ms: None,
        };
        assert!(matches!(transport.open().await, Err(Iec101Error::Config(_))));
    }
}
