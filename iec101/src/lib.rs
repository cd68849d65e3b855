//! Rust implementation of the IEC 60870-5-101 link and application layers
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `iec101-core`: Error taxonomy and result alias
//! - `iec101-transport`: Byte channel traits, serial and TCP transports
//! - `iec101-link`: FT1.2 frames, checksum and stream codec
//! - `iec101-application`: ASDU envelope and information object codecs
//! - `iec101-master`: Master (controlling station) session
//! - `iec101-outstation`: Outstation (controlled station) session
//!
//! This crate re-exports them and adds the runtime configuration file and
//! logger setup the `iec101-master` and `iec101-outstation` binaries share.
//!
//! # Usage
//!
//! ```no_run
//! use iec101::master::{MasterConfig, MasterSession};
//! use iec101::transport::{shutdown_channel, SerialTransport, TransportLayer};
//!
//! # async fn demo() -> iec101::Iec101Result<()> {
//! let mut transport = SerialTransport::new_simple("/dev/ttyUSB0".to_string(), 9600);
//! transport.open().await?;
//! let (reader, mut writer) = transport.split()?;
//! let (_trigger, shutdown) = shutdown_channel();
//! let mut session = MasterSession::new(MasterConfig::default());
//! session.run(reader, &mut writer, shutdown).await
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod logging;

pub use cli::TransportArgs;
pub use config::{MasterSection, OutstationSection, RuntimeConfig, TransportConfig};

// Re-export core types
pub use iec101_core::{AsduError, FramingError, Iec101Error, Iec101Result, PayloadError};

pub mod transport {
    pub use iec101_transport::*;
}

pub mod link {
    pub use iec101_link::*;
}

pub mod application {
    pub use iec101_application::*;
}

pub mod master {
    pub use iec101_master::*;
}

pub mod outstation {
    pub use iec101_outstation::*;
}

#[cfg(test)]
mod tests {
    use super::application::ScaledValuePayload;
    use super::master::{MasterConfigBuilder, MasterEvent, MasterSession, MasterState};
    use super::outstation::{OutstationConfig, OutstationSession, PointStore};
    use super::transport::{shutdown_channel, split_stream};
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn next_event(events: &mut mpsc::UnboundedReceiver<MasterEvent>) -> MasterEvent {
        tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_master_against_outstation() {
        let (master_side, outstation_side) = tokio::io::duplex(1024);
        let (master_reader, mut master_writer) = split_stream(master_side, None);
        let (mut outstation_reader, mut outstation_writer) = split_stream(outstation_side, None);
        let (trigger, shutdown) = shutdown_channel();

        let store = PointStore::default();
        let config = OutstationConfig::default().with_scan_delay(Duration::from_millis(5));
        let mut outstation = OutstationSession::new(config, store.clone());
        let outstation_shutdown = shutdown.clone();
        let outstation_task = tokio::spawn(async move {
            let result = outstation
                .run(&mut outstation_reader, &mut outstation_writer, outstation_shutdown)
                .await;
            (result, outstation)
        });

        let config = MasterConfigBuilder::new()
            .setpoint_interval(Duration::from_millis(100))
            .build()
            .unwrap();
        let mut master = MasterSession::new(config).with_setpoint_source(|| 20500i16);
        let mut events = master.subscribe();
        let master_task = tokio::spawn(async move {
            let result = master.run(master_reader, &mut master_writer, shutdown).await;
            (result, master)
        });

        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::InterrogationConfirmed { common_address: 1 }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::Measurement {
                common_address: 1,
                cause: 20,
                value: ScaledValuePayload::new(1, 1234, 0),
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::Measurement {
                common_address: 1,
                cause: 20,
                value: ScaledValuePayload::new(2, 22000, 0),
            }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::InterrogationCompleted { common_address: 1 }
        );
        assert_eq!(
            next_event(&mut events).await,
            MasterEvent::SetpointConfirmed {
                common_address: 1,
                value: ScaledValuePayload::new(2, 20500, 0),
            }
        );
        assert_eq!(store.power_limitation(), 20500);

        trigger.trigger();
        let (result, master) = master_task.await.unwrap();
        result.unwrap();
        assert_eq!(master.state(), MasterState::Operational);
        assert_eq!(master.statistics().frames_rejected, 0);

        let (result, outstation) = outstation_task.await.unwrap();
        result.unwrap();
        assert_eq!(outstation.statistics().frames_rejected, 0);
        // link ack, four interrogation frames, one or more setpoint confirmations
        assert!(outstation.statistics().frames_sent >= 6);
    }
}
