//! TCP transport implementation
//!
//! Carries the FT1.2 byte stream over a socket, as terminal servers and
//! serial-over-IP gateways do.

use crate::io::split_stream;
use crate::stream::{BoxedReader, BoxedWriter, TransportLayer};
use async_trait::async_trait;
use iec101_core::{Iec101Error, Iec101Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Socket endpoint and direction
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub address: SocketAddr,
    /// Bound on connecting, then on each read and write
    pub timeout: Option<Duration>,
    /// Accept one inbound connection instead of connecting out
    pub listen: bool,
}

impl TcpSettings {
    /// Connect out to `address`
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout: None,
            listen: false,
        }
    }

    /// Wait on `address` for a single peer
    pub fn listening(address: SocketAddr) -> Self {
        Self {
            listen: true,
            ..Self::new(address)
        }
    }

    /// Parse `host:port` text as found in configuration files
    pub fn from_address(address: &str, listen: bool) -> Iec101Result<Self> {
        let address: SocketAddr = address.parse().map_err(|e| {
            Iec101Error::Config(format!("Invalid TCP address {}: {}", address, e))
        })?;
        Ok(if listen {
            Self::listening(address)
        } else {
            Self::new(address)
        })
    }
}

/// FT1.2 over a single TCP connection
#[derive(Debug)]
pub struct TcpTransport {
    settings: TcpSettings,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            settings,
            stream: None,
        }
    }

    /// Endpoint of the connected peer, once open
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> Iec101Result<()> {
        if self.stream.is_some() {
            return Err(Iec101Error::Transport(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Already connected to {}", self.settings.address),
            )));
        }

        let stream = if self.settings.listen {
            let listener = TcpListener::bind(self.settings.address).await?;
            log::info!("Waiting for peer on {}", self.settings.address);
            let (stream, peer) = listener.accept().await?;
            log::info!("Accepted connection from {}", peer);
            stream
        } else if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, TcpStream::connect(self.settings.address))
                .await
                .map_err(|_| Iec101Error::Timeout)??
        } else {
            TcpStream::connect(self.settings.address).await?
        };
        stream.set_nodelay(true)?;

        self.stream = Some(stream);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn split(self) -> Iec101Result<(BoxedReader, BoxedWriter)> {
        let Some(stream) = self.stream else {
            return Err(Iec101Error::Transport(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                format!("No connection to {}", self.settings.address),
            )));
        };
        Ok(split_stream(stream, self.settings.timeout))
    }
}
