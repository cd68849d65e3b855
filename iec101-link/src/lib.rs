//! Link layer module for the IEC 60870-5-101 protocol
//!
//! This crate implements FT1.2 framing: the fixed length, variable length and
//! single character frames, their arithmetic checksum, and a decoder that
//! reads exactly one frame at a time from a byte stream.
//!
//! Frame count bits and duplicate detection are not implemented; the control
//! byte is carried as-is apart from function code helpers.

pub mod address;
pub mod checksum;
pub mod codec;
pub mod control;
pub mod frame;
pub mod statistics;

pub use address::AddressWidth;
pub use checksum::ChecksumCalc;
pub use codec::{FrameDecoder, FrameEncoder};
pub use control::{function_code, PrimaryFunction, SecondaryFunction, PRM};
pub use frame::{Frame, END, SINGLE_CHAR_ACK, START_FIXED, START_VARIABLE};
pub use statistics::LinkStatistics;
