//! IEC 60870-5-101 outstation implementation
//!
//! This crate provides the controlled-station side: a request loop that
//! answers link resets, link status and class requests, general
//! interrogation and scaled setpoint commands from one master.
//!
//! # Features
//!
//! - [x] Link reset / link status replies
//! - [x] Class 1 / class 2 requests answered with the single character ack
//! - [x] General interrogation (confirm, two measurements, termination)
//! - [x] Scaled setpoint commands with confirmation
//! - [x] Drawn power simulation
//! - [ ] Class 1 / class 2 event buffer (requests are always answered empty)

pub mod config;
pub mod session;
pub mod simulation;
pub mod state;

pub use config::OutstationConfig;
pub use session::OutstationSession;
pub use simulation::run_drift;
pub use state::{
    OutstationPhase, OutstationState, PointStore, SetpointOutcome, IOA_POWER_DRAWN,
    IOA_POWER_LIMITATION,
};
