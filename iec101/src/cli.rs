//! Command line flags shared by the binaries

use crate::config::TransportConfig;
use clap::Args;

/// Transport overrides applied on top of the configuration file
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TransportArgs {
    /// Serial port to open (switches the transport to serial)
    #[arg(long, env = "IEC101_PORT", conflicts_with = "tcp")]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(long, env = "IEC101_BAUD_RATE")]
    pub baud_rate: Option<u32>,

    /// TCP endpoint carrying the FT1.2 stream (switches the transport to TCP)
    #[arg(long, env = "IEC101_TCP")]
    pub tcp: Option<String>,

    /// Accept one TCP peer on `--tcp` instead of connecting to it
    #[arg(long, requires = "tcp")]
    pub listen: bool,
}

impl TransportArgs {
    /// Overwrite the configured transport with whatever flags were given
    pub fn apply(&self, transport: &mut TransportConfig) {
        if let Some(address) = &self.tcp {
            let timeout_ms = match transport {
                TransportConfig::Tcp { timeout_ms, .. } => *timeout_ms,
                TransportConfig::Serial { .. } => None,
            };
            *transport = TransportConfig::Tcp {
                address: address.clone(),
                listen: self.listen,
                timeout_ms,
            };
            return;
        }

        if let Some(new_port) = &self.port {
            if !matches!(transport, TransportConfig::Serial { .. }) {
                *transport = TransportConfig::default();
            }
            if let TransportConfig::Serial { port, .. } = transport {
                *port = new_port.clone();
            }
        }
        if let (Some(rate), TransportConfig::Serial { baud_rate, .. }) = (self.baud_rate, transport) {
            *baud_rate = rate;
        }
    }
}
