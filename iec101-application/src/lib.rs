//! Application layer module for the IEC 60870-5-101 protocol
//!
//! This crate provides the ASDU envelope and the information object codecs for
//! the three types a master and outstation exchange here: scaled measured
//! values, scaled setpoint commands and the general interrogation command.

pub mod asdu;
pub mod payload;
pub mod types;

pub use asdu::{Asdu, HEADER_LENGTH, VSQ_SINGLE};
pub use payload::{InterrogationPayload, Payload, ScaledValuePayload};
pub use types::{Cause, TypeId, QOI_STATION};
