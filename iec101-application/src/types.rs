//! Type identification and cause of transmission

use std::fmt;

/// Type identification of the ASDUs this stack understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeId {
    /// M_ME_NB_1: measured value, scaled
    ScaledMeasuredValue = 11,
    /// C_SE_NB_1: setpoint command, scaled
    ScaledSetpointCommand = 48,
    /// C_IC_NA_1: interrogation command
    InterrogationCommand = 100,
}

impl TypeId {
    /// Look up a raw type byte; `None` for types this stack does not model
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            11 => Some(TypeId::ScaledMeasuredValue),
            48 => Some(TypeId::ScaledSetpointCommand),
            100 => Some(TypeId::InterrogationCommand),
            _ => None,
        }
    }

    /// Raw type byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Standard mnemonic
    pub fn mnemonic(self) -> &'static str {
        match self {
            TypeId::ScaledMeasuredValue => "M_ME_NB_1",
            TypeId::ScaledSetpointCommand => "C_SE_NB_1",
            TypeId::InterrogationCommand => "C_IC_NA_1",
        }
    }
}

impl From<TypeId> for u8 {
    fn from(value: TypeId) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.mnemonic(), self.as_u8())
    }
}

/// Cause of transmission
///
/// Single byte: no test bit, no P/N bit, no originator address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cause {
    Spontaneous = 3,
    Request = 5,
    Activation = 6,
    ActivationConfirm = 7,
    Deactivation = 8,
    DeactivationConfirm = 9,
    ActivationTermination = 10,
    InterrogatedByGeneralInterrogation = 20,
}

impl Cause {
    /// Look up a raw cause byte; `None` for causes this stack does not model
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            3 => Some(Cause::Spontaneous),
            5 => Some(Cause::Request),
            6 => Some(Cause::Activation),
            7 => Some(Cause::ActivationConfirm),
            8 => Some(Cause::Deactivation),
            9 => Some(Cause::DeactivationConfirm),
            10 => Some(Cause::ActivationTermination),
            20 => Some(Cause::InterrogatedByGeneralInterrogation),
            _ => None,
        }
    }

    /// Raw cause byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<Cause> for u8 {
    fn from(value: Cause) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cause::Spontaneous => "spont",
            Cause::Request => "req",
            Cause::Activation => "act",
            Cause::ActivationConfirm => "actcon",
            Cause::Deactivation => "deact",
            Cause::DeactivationConfirm => "deactcon",
            Cause::ActivationTermination => "actterm",
            Cause::InterrogatedByGeneralInterrogation => "inrogen",
        };
        write!(f, "{} ({})", name, self.as_u8())
    }
}

/// Qualifier of interrogation for station (general) interrogation
pub const QOI_STATION: u8 = 20;
