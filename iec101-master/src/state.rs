//! Master session state machine

use iec101_core::{Iec101Error, Iec101Result};

/// Master session state
///
/// # State Transitions
/// ```text
/// Init -> AwaitResetAck (reset remote link sent)
/// AwaitResetAck -> Operational (one frame read, or the wait timed out)
/// Init | AwaitResetAck | Operational -> Failed (fatal transport error)
/// ```
///
/// `AwaitResetAck` moves on after exactly one frame whatever that frame is;
/// an unexpected reply is logged, not treated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterState {
    /// Nothing sent yet
    #[default]
    Init,
    /// Reset remote link sent, waiting for the acknowledgement
    AwaitResetAck,
    /// Interrogation sent; periodic setpoints and inbound dispatch run
    Operational,
    /// Terminal state after a fatal error
    Failed,
}

impl MasterState {
    /// Check if the session has finished the link handshake
    pub fn is_operational(&self) -> bool {
        matches!(self, MasterState::Operational)
    }

    /// Validate state transition
    ///
    /// # Valid Transitions
    /// - `Init` -> `AwaitResetAck`
    /// - `AwaitResetAck` -> `Operational`
    /// - any state but `Failed` -> `Failed`
    pub fn validate_transition(&self, next: MasterState) -> Iec101Result<()> {
        let valid = match (*self, next) {
            (MasterState::Init, MasterState::AwaitResetAck) => true,
            (MasterState::AwaitResetAck, MasterState::Operational) => true,
            (MasterState::Failed, _) => false,
            (_, MasterState::Failed) => true,
            _ => false,
        };

        if valid {
            Ok(())
        } else {
            Err(Iec101Error::InvalidState(format!(
                "Invalid master transition: {:?} -> {:?}",
                self, next
            )))
        }
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            MasterState::Init => "Init",
            MasterState::AwaitResetAck => "AwaitResetAck",
            MasterState::Operational => "Operational",
            MasterState::Failed => "Failed",
        }
    }
}
