//! IEC 60870-5-101 master implementation
//!
//! This crate provides the controlling-station side: link reset, general
//! interrogation, periodic setpoint commands and dispatch of everything the
//! outstation sends back.
//!
//! # Features
//!
//! - [x] Reset remote link with optional acknowledgement timeout
//! - [x] General interrogation on start-up
//! - [x] Periodic scaled setpoint commands
//! - [x] Inbound dispatch with events for the session owner
//! - [x] Retry policy for end-of-input on the receive path
//! - [ ] Class 1 / class 2 polling

pub mod config;
pub mod events;
pub mod session;
pub mod setpoint;
pub mod state;

pub use config::{MasterConfig, MasterConfigBuilder, DEFAULT_SETPOINT_IOA};
pub use events::MasterEvent;
pub use session::MasterSession;
pub use setpoint::{RandomSetpoint, SetpointSource};
pub use state::MasterState;
