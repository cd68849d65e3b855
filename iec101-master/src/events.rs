//! Outcomes the master reports to its owner

use iec101_application::ScaledValuePayload;

/// Event published for each dispatched ASDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterEvent {
    /// Scaled measured value, spontaneous or interrogated
    Measurement {
        common_address: u16,
        cause: u8,
        value: ScaledValuePayload,
    },
    /// The outstation accepted the general interrogation
    InterrogationConfirmed { common_address: u16 },
    /// The outstation finished the general interrogation
    InterrogationCompleted { common_address: u16 },
    /// The outstation confirmed a setpoint command
    SetpointConfirmed {
        common_address: u16,
        value: ScaledValuePayload,
    },
    /// ASDU with a type/cause combination the master does not act on
    Unhandled { type_id: u8, cause: u8 },
}
