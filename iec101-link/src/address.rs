//! Link address field width

use iec101_core::{FramingError, Iec101Error, Iec101Result};
use std::fmt;

/// Width of the link address field
///
/// A channel-wide constant: both stations must agree on it, otherwise frame
/// boundaries are misparsed without any checksum failure to flag it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressWidth {
    One,
    #[default]
    Two,
}

impl AddressWidth {
    /// Number of address bytes on the wire
    pub fn byte_length(&self) -> usize {
        match self {
            AddressWidth::One => 1,
            AddressWidth::Two => 2,
        }
    }

    /// Largest link address representable at this width
    pub fn max_address(&self) -> u16 {
        match self {
            AddressWidth::One => 0xFF,
            AddressWidth::Two => 0xFFFF,
        }
    }

    /// Append the little-endian address bytes to `out`
    ///
    /// At width one only the low byte is written.
    pub fn encode_into(&self, address: u16, out: &mut Vec<u8>) {
        let bytes = address.to_le_bytes();
        out.extend_from_slice(&bytes[..self.byte_length()]);
    }

    /// Read an address from the first `byte_length()` bytes of `data`
    pub fn decode(&self, data: &[u8]) -> Iec101Result<u16> {
        match (self, data) {
            (AddressWidth::One, [lo, ..]) => Ok(u16::from(*lo)),
            (AddressWidth::Two, [lo, hi, ..]) => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => Err(FramingError::Truncated.into()),
        }
    }
}

impl TryFrom<u8> for AddressWidth {
    type Error = Iec101Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AddressWidth::One),
            2 => Ok(AddressWidth::Two),
            other => Err(Iec101Error::Config(format!(
                "Link address width must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AddressWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.byte_length())
    }
}
