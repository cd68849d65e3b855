//! ASDU (Application Service Data Unit) envelope
//!
//! ```text
//! offset 0   type identification
//! offset 1   variable structure qualifier
//! offset 2   cause of transmission (one byte, no originator address)
//! offset 3-4 common address, little-endian
//! offset 5.. information object bytes
//! ```

use crate::payload::{InterrogationPayload, ScaledValuePayload};
use crate::types::{Cause, TypeId};
use bytes::{Buf, BufMut};
use iec101_core::{AsduError, Iec101Result};
use std::fmt;

/// Length of the fixed ASDU header
pub const HEADER_LENGTH: usize = 5;

/// VSQ for a single information object, SQ = 0
pub const VSQ_SINGLE: u8 = 0x01;

/// Application Service Data Unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asdu {
    pub type_id: u8,
    pub vsq: u8,
    pub cause: u8,
    pub common_address: u16,
    pub information_objects: Vec<u8>,
}

impl Asdu {
    /// Create an ASDU from raw header fields and payload bytes
    pub fn new(
        type_id: u8,
        vsq: u8,
        cause: u8,
        common_address: u16,
        information_objects: Vec<u8>,
    ) -> Self {
        Self {
            type_id,
            vsq,
            cause,
            common_address,
            information_objects,
        }
    }

    /// Interrogation command (type 100) carrying one object
    pub fn interrogation(cause: Cause, common_address: u16, payload: InterrogationPayload) -> Self {
        Self::new(
            TypeId::InterrogationCommand.as_u8(),
            VSQ_SINGLE,
            cause.as_u8(),
            common_address,
            payload.encode().to_vec(),
        )
    }

    /// Scaled value ASDU carrying one object
    ///
    /// `type_id` selects a measured value report or a setpoint command; both
    /// share the same information object layout.
    pub fn scaled_value(
        type_id: TypeId,
        cause: Cause,
        common_address: u16,
        payload: ScaledValuePayload,
    ) -> Self {
        Self::new(
            type_id.as_u8(),
            VSQ_SINGLE,
            cause.as_u8(),
            common_address,
            payload.encode().to_vec(),
        )
    }

    /// Typed view of the type byte
    pub fn type_id(&self) -> Option<TypeId> {
        TypeId::from_u8(self.type_id)
    }

    /// Typed view of the cause byte
    pub fn cause(&self) -> Option<Cause> {
        Cause::from_u8(self.cause)
    }

    /// Encode ASDU to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(HEADER_LENGTH + self.information_objects.len());
        result.put_u8(self.type_id);
        result.put_u8(self.vsq);
        result.put_u8(self.cause);
        result.put_u16_le(self.common_address);
        result.put_slice(&self.information_objects);
        result
    }

    /// Decode an ASDU from bytes
    ///
    /// Unknown type ids decode successfully; the payload stays opaque.
    pub fn decode(data: &[u8]) -> Iec101Result<Self> {
        if data.len() < HEADER_LENGTH {
            return Err(AsduError::TooShort(data.len()).into());
        }
        let mut buf = data;
        let type_id = buf.get_u8();
        let vsq = buf.get_u8();
        let cause = buf.get_u8();
        let common_address = buf.get_u16_le();

        Ok(Self {
            type_id,
            vsq,
            cause,
            common_address,
            information_objects: buf.to_vec(),
        })
    }
}

impl fmt::Display for Asdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ASDU type={} cot={} ca={} ({} object bytes)",
            self.type_id,
            self.cause,
            self.common_address,
            self.information_objects.len()
        )
    }
}
