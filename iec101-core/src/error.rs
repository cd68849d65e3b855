use thiserror::Error;

/// Link-layer framing failures
///
/// A frame that fails with one of these is discarded by the receiving session;
/// none of them is fatal for a receive loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("Unknown start byte: 0x{0:02X}")]
    UnknownStartByte(u8),

    #[error("Length mismatch: 0x{first:02X} != 0x{second:02X}")]
    LengthMismatch { first: u8, second: u8 },

    #[error("Invalid second start byte: 0x{0:02X}")]
    InvalidSecondStart(u8),

    #[error("Invalid end byte: 0x{0:02X}")]
    InvalidEndByte(u8),

    #[error("Checksum mismatch: expected 0x{expected:02X}, received 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Frame too large: body of {0} bytes exceeds 255")]
    FrameTooLarge(usize),

    #[error("Variable frame length {length} shorter than control and address fields")]
    BodyTooShort { length: u8 },

    #[error("Frame truncated")]
    Truncated,

    #[error("{0} trailing bytes after end byte")]
    TrailingBytes(usize),
}

/// ASDU envelope failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsduError {
    #[error("ASDU too short: {0} bytes, need at least 5")]
    TooShort(usize),
}

/// Information object payload failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("{kind} payload too short: {actual} bytes, need {expected}")]
    TooShort {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Main error type for IEC 60870-5-101 operations
#[derive(Error, Debug)]
pub enum Iec101Error {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    /// The read timeout expired before the first byte of a frame
    #[error("Line idle")]
    Idle,

    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("ASDU error: {0}")]
    Asdu(#[from] AsduError),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Iec101Error {
    /// True for failures of the underlying byte channel
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Iec101Error::Transport(_) | Iec101Error::Timeout | Iec101Error::Idle
        )
    }

    /// True for transport conditions a receive loop may retry after a pause
    ///
    /// End-of-input is transient: a serial line without a peer reads as EOF
    /// until the other side opens it.
    pub fn is_transient(&self) -> bool {
        match self {
            Iec101Error::Transport(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
            ),
            Iec101Error::Timeout | Iec101Error::Idle => true,
            _ => false,
        }
    }

    /// True when nothing arrived at all, as opposed to a frame cut short
    ///
    /// An idle line is not a failure and does not count against a retry
    /// policy.
    pub fn is_idle(&self) -> bool {
        matches!(self, Iec101Error::Idle)
    }

    /// True for malformed frames, ASDUs and payloads
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Iec101Error::Framing(_) | Iec101Error::Asdu(_) | Iec101Error::Payload(_)
        )
    }
}

/// Result type alias for IEC 60870-5-101 operations
pub type Iec101Result<T> = Result<T, Iec101Error>;
