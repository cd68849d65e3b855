//! FT1.2 frame structure and encoding/decoding
//!
//! Three frame shapes share the line:
//!
//! ```text
//! fixed:       10 C A[1|2] CS 16
//! variable:    68 L L 68 C A[1|2] ASDU... CS 16     L = 1 + |A| + |ASDU| <= 255
//! single char: E5
//! ```
//!
//! The checksum is the modulo-256 sum of the control, address and ASDU bytes.

use crate::address::AddressWidth;
use crate::checksum::ChecksumCalc;
use crate::control;
use iec101_core::{FramingError, Iec101Result};
use std::fmt;

/// Start byte of a fixed length frame
pub const START_FIXED: u8 = 0x10;

/// Start byte of a variable length frame (sent twice)
pub const START_VARIABLE: u8 = 0x68;

/// End byte of fixed and variable frames
pub const END: u8 = 0x16;

/// The single character acknowledgement
pub const SINGLE_CHAR_ACK: u8 = 0xE5;

/// Largest value the variable frame length byte can carry
pub const MAX_BODY_LENGTH: usize = 255;

/// A link-layer frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Control frame without user data
    Fixed { control: u8, link_address: u16 },
    /// Frame carrying an ASDU
    Variable {
        control: u8,
        link_address: u16,
        asdu: Vec<u8>,
    },
    /// The constant acknowledgement byte
    SingleChar,
}

impl Frame {
    /// Create a fixed length frame
    pub fn fixed(control: u8, link_address: u16) -> Self {
        Frame::Fixed {
            control,
            link_address,
        }
    }

    /// Create a variable length frame around encoded ASDU bytes
    pub fn variable(control: u8, link_address: u16, asdu: Vec<u8>) -> Self {
        Frame::Variable {
            control,
            link_address,
            asdu,
        }
    }

    /// Control byte, if the frame has one
    pub fn control(&self) -> Option<u8> {
        match self {
            Frame::Fixed { control, .. } | Frame::Variable { control, .. } => Some(*control),
            Frame::SingleChar => None,
        }
    }

    /// Function code (low nibble of the control byte), if the frame has one
    pub fn function_code(&self) -> Option<u8> {
        self.control().map(control::function_code)
    }

    /// Link address, if the frame has one
    pub fn link_address(&self) -> Option<u16> {
        match self {
            Frame::Fixed { link_address, .. } | Frame::Variable { link_address, .. } => {
                Some(*link_address)
            }
            Frame::SingleChar => None,
        }
    }

    /// ASDU bytes of a variable frame
    pub fn asdu(&self) -> Option<&[u8]> {
        match self {
            Frame::Variable { asdu, .. } => Some(asdu),
            _ => None,
        }
    }

    /// Encode frame to bytes
    ///
    /// Fails with `FrameTooLarge` when a variable frame's body exceeds 255
    /// bytes. A link address wider than `width` is cut to its low byte.
    pub fn encode(&self, width: AddressWidth) -> Iec101Result<Vec<u8>> {
        match self {
            Frame::SingleChar => Ok(vec![SINGLE_CHAR_ACK]),
            Frame::Fixed {
                control,
                link_address,
            } => {
                let mut result = Vec::with_capacity(4 + width.byte_length());
                result.push(START_FIXED);
                result.push(*control);
                width.encode_into(*link_address, &mut result);
                result.push(ChecksumCalc::of(&result[1..]));
                result.push(END);
                Ok(result)
            }
            Frame::Variable {
                control,
                link_address,
                asdu,
            } => {
                let body_length = 1 + width.byte_length() + asdu.len();
                if body_length > MAX_BODY_LENGTH {
                    return Err(FramingError::FrameTooLarge(body_length).into());
                }
                let length = body_length as u8;

                let mut result = Vec::with_capacity(body_length + 6);
                result.extend_from_slice(&[START_VARIABLE, length, length, START_VARIABLE]);
                result.push(*control);
                width.encode_into(*link_address, &mut result);
                result.extend_from_slice(asdu);
                result.push(ChecksumCalc::of(&result[4..]));
                result.push(END);
                Ok(result)
            }
        }
    }

    /// Decode exactly one frame from a byte slice
    ///
    /// The slice must hold one complete frame and nothing else.
    pub fn decode(bytes: &[u8], width: AddressWidth) -> Iec101Result<Self> {
        let (&start, rest) = bytes.split_first().ok_or(FramingError::Truncated)?;
        let (frame, consumed) = match start {
            SINGLE_CHAR_ACK => (Frame::SingleChar, 0),
            START_FIXED => Self::decode_fixed(rest, width)?,
            START_VARIABLE => Self::decode_variable(rest, width)?,
            other => return Err(FramingError::UnknownStartByte(other).into()),
        };

        if rest.len() > consumed {
            return Err(FramingError::TrailingBytes(rest.len() - consumed).into());
        }
        Ok(frame)
    }

    /// Total wire length of the frame that begins with `header`
    ///
    /// `header` holds the bytes read so far; returns `None` while more header
    /// bytes are needed to know the length.
    pub fn wire_length(header: &[u8], width: AddressWidth) -> Iec101Result<Option<usize>> {
        match header {
            [] => Ok(None),
            [SINGLE_CHAR_ACK, ..] => Ok(Some(1)),
            [START_FIXED, ..] => Ok(Some(4 + width.byte_length())),
            [START_VARIABLE, first, second, rest @ ..] => {
                if first != second {
                    return Err(FramingError::LengthMismatch {
                        first: *first,
                        second: *second,
                    }
                    .into());
                }
                match rest.first() {
                    Some(&START_VARIABLE) => Ok(Some(*first as usize + 6)),
                    Some(&other) => Err(FramingError::InvalidSecondStart(other).into()),
                    None => Ok(None),
                }
            }
            [START_VARIABLE, ..] => Ok(None),
            [other, ..] => Err(FramingError::UnknownStartByte(*other).into()),
        }
    }

    // `rest` starts after the start byte; returns the frame and bytes consumed
    fn decode_fixed(rest: &[u8], width: AddressWidth) -> Iec101Result<(Self, usize)> {
        let address_length = width.byte_length();
        let consumed = address_length + 3;
        if rest.len() < consumed {
            return Err(FramingError::Truncated.into());
        }

        let control = rest[0];
        let link_address = width.decode(&rest[1..])?;
        let checksum = rest[1 + address_length];
        let end = rest[2 + address_length];

        if end != END {
            return Err(FramingError::InvalidEndByte(end).into());
        }
        let mut calc = ChecksumCalc::new();
        calc.update_bytes(&rest[..1 + address_length]);
        calc.validate(checksum)?;

        Ok((
            Frame::Fixed {
                control,
                link_address,
            },
            consumed,
        ))
    }

    fn decode_variable(rest: &[u8], width: AddressWidth) -> Iec101Result<(Self, usize)> {
        if rest.len() < 3 {
            return Err(FramingError::Truncated.into());
        }
        let (first, second) = (rest[0], rest[1]);
        if first != second {
            return Err(FramingError::LengthMismatch { first, second }.into());
        }
        if rest[2] != START_VARIABLE {
            return Err(FramingError::InvalidSecondStart(rest[2]).into());
        }

        let body_length = first as usize;
        let consumed = 3 + body_length + 2;
        if rest.len() < consumed {
            return Err(FramingError::Truncated.into());
        }
        let body = &rest[3..3 + body_length];
        let checksum = rest[3 + body_length];
        let end = rest[4 + body_length];

        if end != END {
            return Err(FramingError::InvalidEndByte(end).into());
        }
        let mut calc = ChecksumCalc::new();
        calc.update_bytes(body);
        calc.validate(checksum)?;

        let address_length = width.byte_length();
        if body_length < 1 + address_length {
            return Err(FramingError::BodyTooShort { length: first }.into());
        }
        let control = body[0];
        let link_address = width.decode(&body[1..])?;
        let asdu = body[1 + address_length..].to_vec();

        Ok((
            Frame::Variable {
                control,
                link_address,
                asdu,
            },
            consumed,
        ))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Fixed {
                control,
                link_address,
            } => write!(
                f,
                "Fixed Frame: control=0x{:02X}, fc={}, addr={}",
                control,
                control::function_code(*control),
                link_address
            ),
            Frame::Variable {
                control,
                link_address,
                asdu,
            } => write!(
                f,
                "Variable Frame: control=0x{:02X}, addr={}, asdu_len={}",
                control,
                link_address,
                asdu.len()
            ),
            Frame::SingleChar => write!(f, "Single Char 0xE5"),
        }
    }
}
