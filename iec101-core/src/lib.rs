//! Core types and utilities for the IEC 60870-5-101 protocol
//!
//! This crate provides the error taxonomy shared by every layer of the
//! implementation: transport failures, link framing errors, and application
//! (ASDU / information object) decode errors.

pub mod error;

pub use error::{AsduError, FramingError, Iec101Error, Iec101Result, PayloadError};
