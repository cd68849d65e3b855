//! Control field helpers
//!
//! Only the PRM bit and the function code are interpreted. Frame count
//! (FCB/FCV) and flow control (ACD/DFC) bits are carried opaquely.

/// Primary message bit: set on frames sent by the initiating station
pub const PRM: u8 = 0x40;

/// Mask for the function code in the low nibble
pub const FUNCTION_CODE_MASK: u8 = 0x0F;

/// Extract the function code from a control byte
pub fn function_code(control: u8) -> u8 {
    control & FUNCTION_CODE_MASK
}

/// Function codes of primary (master to outstation) frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryFunction {
    ResetRemoteLink,
    UserDataConfirmed,
    RequestLinkStatus,
    RequestClass1,
    RequestClass2,
}

impl PrimaryFunction {
    /// Decode a function code; `None` for codes this stack does not serve
    pub fn from_code(code: u8) -> Option<Self> {
        match code & FUNCTION_CODE_MASK {
            0 => Some(PrimaryFunction::ResetRemoteLink),
            3 => Some(PrimaryFunction::UserDataConfirmed),
            9 => Some(PrimaryFunction::RequestLinkStatus),
            10 => Some(PrimaryFunction::RequestClass1),
            11 => Some(PrimaryFunction::RequestClass2),
            _ => None,
        }
    }

    /// Function code value
    pub fn code(&self) -> u8 {
        match self {
            PrimaryFunction::ResetRemoteLink => 0,
            PrimaryFunction::UserDataConfirmed => 3,
            PrimaryFunction::RequestLinkStatus => 9,
            PrimaryFunction::RequestClass1 => 10,
            PrimaryFunction::RequestClass2 => 11,
        }
    }

    /// Control byte for a primary frame carrying this function
    pub fn control(&self) -> u8 {
        PRM | self.code()
    }
}

/// Function codes of secondary (outstation to master) frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryFunction {
    Ack,
    UserData,
}

impl SecondaryFunction {
    /// Decode a function code
    pub fn from_code(code: u8) -> Option<Self> {
        match code & FUNCTION_CODE_MASK {
            0 => Some(SecondaryFunction::Ack),
            8 => Some(SecondaryFunction::UserData),
            _ => None,
        }
    }

    /// Function code value
    pub fn code(&self) -> u8 {
        match self {
            SecondaryFunction::Ack => 0,
            SecondaryFunction::UserData => 8,
        }
    }

    /// Control byte for a secondary frame (PRM clear)
    pub fn control(&self) -> u8 {
        self.code()
    }
}
