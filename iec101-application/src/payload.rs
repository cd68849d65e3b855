//! Information object codecs
//!
//! Each codec handles exactly one information object: a two-byte
//! little-endian information object address followed by the element bytes.
//! Bytes past the object are ignored.

use crate::asdu::Asdu;
use crate::types::TypeId;
use bytes::{Buf, BufMut};
use iec101_core::{Iec101Result, PayloadError};

/// Interrogation command object: IOA + qualifier of interrogation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterrogationPayload {
    pub ioa: u16,
    pub qualifier: u8,
}

impl InterrogationPayload {
    /// Encoded length in bytes
    pub const LENGTH: usize = 3;

    /// Object at `ioa` with qualifier of interrogation `qualifier` (20 = station)
    pub fn new(ioa: u16, qualifier: u8) -> Self {
        Self { ioa, qualifier }
    }

    /// Encode as IOA (LE) followed by the qualifier byte
    pub fn encode(&self) -> [u8; Self::LENGTH] {
        let mut out = [0u8; Self::LENGTH];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.ioa);
        buf.put_u8(self.qualifier);
        out
    }

    /// Decode the first object in `data`
    ///
    /// # Errors
    /// `PayloadError::TooShort` if fewer than three bytes are given
    pub fn decode(data: &[u8]) -> Iec101Result<Self> {
        if data.len() < Self::LENGTH {
            return Err(PayloadError::TooShort {
                kind: "Interrogation",
                expected: Self::LENGTH,
                actual: data.len(),
            }
            .into());
        }
        let mut buf = data;
        let ioa = buf.get_u16_le();
        let qualifier = buf.get_u8();
        Ok(Self { ioa, qualifier })
    }
}

/// Scaled value object: IOA + signed 16-bit value + quality descriptor
///
/// Used for both measured value reports and setpoint commands. The value is
/// carried as-is; no engineering-unit scaling is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledValuePayload {
    pub ioa: u16,
    pub value: i16,
    pub quality: u8,
}

impl ScaledValuePayload {
    /// Encoded length in bytes
    pub const LENGTH: usize = 5;

    /// Object at `ioa`; a `quality` of 0 means good
    pub fn new(ioa: u16, value: i16, quality: u8) -> Self {
        Self {
            ioa,
            value,
            quality,
        }
    }

    /// Encode as IOA (LE), value (LE two's complement), quality byte
    pub fn encode(&self) -> [u8; Self::LENGTH] {
        let mut out = [0u8; Self::LENGTH];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.ioa);
        buf.put_i16_le(self.value);
        buf.put_u8(self.quality);
        out
    }

    /// Decode the first object in `data`
    ///
    /// # Errors
    /// `PayloadError::TooShort` if fewer than five bytes are given
    pub fn decode(data: &[u8]) -> Iec101Result<Self> {
        if data.len() < Self::LENGTH {
            return Err(PayloadError::TooShort {
                kind: "ScaledValue",
                expected: Self::LENGTH,
                actual: data.len(),
            }
            .into());
        }
        let mut buf = data;
        let ioa = buf.get_u16_le();
        let value = buf.get_i16_le();
        let quality = buf.get_u8();
        Ok(Self {
            ioa,
            value,
            quality,
        })
    }
}

/// Typed view of an ASDU's information object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Interrogation(InterrogationPayload),
    ScaledValue(ScaledValuePayload),
    /// Type id this stack does not model; the object bytes stay opaque
    Unknown(u8),
}

impl Payload {
    /// Decode the information object according to the ASDU's type id
    pub fn from_asdu(asdu: &Asdu) -> Iec101Result<Self> {
        match asdu.type_id() {
            Some(TypeId::InterrogationCommand) => Ok(Payload::Interrogation(
                InterrogationPayload::decode(&asdu.information_objects)?,
            )),
            Some(TypeId::ScaledMeasuredValue) | Some(TypeId::ScaledSetpointCommand) => Ok(
                Payload::ScaledValue(ScaledValuePayload::decode(&asdu.information_objects)?),
            ),
            None => Ok(Payload::Unknown(asdu.type_id)),
        }
    }
}
