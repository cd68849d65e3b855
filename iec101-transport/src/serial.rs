//! Serial port transport implementation

use crate::io::split_stream;
use crate::stream::{BoxedReader, BoxedWriter, TransportLayer};
use async_trait::async_trait;
use iec101_core::{Iec101Error, Iec101Result};
use std::fmt;
use std::time::Duration;
use tokio_serial::{
    DataBits, FlowControl, Parity, SerialPortBuilder, SerialPortBuilderExt, SerialStream, StopBits,
};

/// Baud rate used when none is configured
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial line settings
///
/// FT1.2 prescribes 8 data bits, even parity and one stop bit; the fields stay
/// public for lines wired differently.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Bound on each read and write once open
    pub timeout: Option<Duration>,
}

impl SerialSettings {
    /// 8E1 line on `port_name`
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self {
            port_name,
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::Even,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: None,
        }
    }

    /// 8E1 line with a per-read/write timeout
    pub fn with_timeout(port_name: String, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::new(port_name, baud_rate)
        }
    }

    fn port_builder(&self) -> SerialPortBuilder {
        tokio_serial::new(&self.port_name, self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(self.flow_control)
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let data_bits = match self.data_bits {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let stop_bits = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(
            f,
            "{} {} {}{}{}",
            self.port_name, self.baud_rate, data_bits, parity, stop_bits
        )
    }
}

/// Serial port transport
pub struct SerialTransport {
    settings: SerialSettings,
    port: Option<SerialStream>,
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("settings", &self.settings)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            settings,
            port: None,
        }
    }

    /// 8E1 transport on `port_name`
    pub fn new_simple(port_name: String, baud_rate: u32) -> Self {
        Self::new(SerialSettings::new(port_name, baud_rate))
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }
}

#[async_trait]
impl TransportLayer for SerialTransport {
    async fn open(&mut self) -> Iec101Result<()> {
        if self.port.is_some() {
            return Err(Iec101Error::Transport(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is already open", self.settings.port_name),
            )));
        }

        let port = self.settings.port_builder().open_native_async().map_err(|e| {
            Iec101Error::Transport(std::io::Error::other(format!(
                "Cannot open {}: {}",
                self.settings.port_name, e
            )))
        })?;

        log::info!("Opened serial line {}", self.settings);
        self.port = Some(port);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.port.is_none()
    }

    fn split(self) -> Iec101Result<(BoxedReader, BoxedWriter)> {
        let Some(port) = self.port else {
            return Err(Iec101Error::Transport(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                format!("{} is not open", self.settings.port_name),
            )));
        };
        Ok(split_stream(port, self.settings.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_line_format() {
        let settings = SerialSettings::new("/dev/ttyUSB0".to_string(), DEFAULT_BAUD_RATE);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert!(settings.timeout.is_none());
        assert_eq!(settings.to_string(), "/dev/ttyUSB0 9600 8E1");
    }

    #[test]
    fn test_with_timeout() {
        let settings =
            SerialSettings::with_timeout("COM3".to_string(), 19200, Duration::from_millis(250));
        assert_eq!(settings.timeout, Some(Duration::from_millis(250)));
        assert_eq!(settings.baud_rate, 19200);
    }

    #[test]
    fn test_split_before_open_fails() {
        let transport = SerialTransport::new_simple("/dev/ttyUSB0".to_string(), DEFAULT_BAUD_RATE);
        assert!(transport.is_closed());
        assert!(matches!(transport.split(), Err(e) if e.is_transport()));
    }

    #[tokio::test]
    async fn test_open_missing_port_fails() {
        let mut transport = SerialTransport::new_simple("/dev/iec101-missing".to_string(), 9600);
        assert!(transport.open().await.is_err());
        assert!(transport.is_closed());
    }
}
