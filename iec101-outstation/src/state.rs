//! Outstation process points and session phase

use iec101_core::{Iec101Error, Iec101Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// Information object address of the drawn power measurement
pub const IOA_POWER_DRAWN: u16 = 1;

/// Information object address of the power limitation point
pub const IOA_POWER_LIMITATION: u16 = 2;

/// Process values the outstation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstationState {
    pub power_drawn: i16,
    pub power_limitation: i16,
}

impl Default for OutstationState {
    fn default() -> Self {
        Self {
            power_drawn: 1234,
            power_limitation: 22000,
        }
    }
}

/// Outcome of applying a setpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointOutcome {
    /// The addressed point was updated
    Applied,
    /// No writable point lives at this address; nothing changed
    UnknownAddress,
}

/// Shared handle to the outstation's process points
///
/// Cloning the handle shares the points. The lock is never held across an
/// `.await`.
#[derive(Debug, Clone, Default)]
pub struct PointStore {
    inner: Arc<Mutex<OutstationState>>,
}

impl PointStore {
    /// Create a store with the given initial values
    pub fn new(initial: OutstationState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    // A panic while holding the lock cannot leave two plain integers torn.
    fn lock(&self) -> MutexGuard<'_, OutstationState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of both points taken under one lock
    pub fn snapshot(&self) -> OutstationState {
        *self.lock()
    }

    pub fn power_drawn(&self) -> i16 {
        self.lock().power_drawn
    }

    pub fn power_limitation(&self) -> i16 {
        self.lock().power_limitation
    }

    /// Write a setpoint to the point at `ioa`
    pub fn apply_setpoint(&self, ioa: u16, value: i16) -> SetpointOutcome {
        if ioa == IOA_POWER_LIMITATION {
            self.lock().power_limitation = value;
            SetpointOutcome::Applied
        } else {
            SetpointOutcome::UnknownAddress
        }
    }

    /// Advance the drawn power by `step`, wrapping to `floor` past `ceiling`
    ///
    /// Returns the new value.
    pub fn drift(&self, step: i16, ceiling: i16, floor: i16) -> i16 {
        let mut state = self.lock();
        let next = state.power_drawn.saturating_add(step);
        state.power_drawn = if next > ceiling { floor } else { next };
        state.power_drawn
    }
}

/// Phase of the outstation's request loop
///
/// # State Transitions
/// ```text
/// Idle -> Processing (frame decoded)
/// Processing -> Replying (interrogation reply started)
/// Processing -> Idle (frame handled, next read starts)
/// Replying -> Idle (fourth reply frame sent or a write failed)
/// ```
///
/// While `Replying` no frame is read: a request that arrives during the
/// scan delays waits in the channel until the reply is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutstationPhase {
    /// Waiting for the next frame
    #[default]
    Idle,
    /// Handling one received frame
    Processing,
    /// A multi-frame interrogation reply is on the wire
    Replying,
}

impl OutstationPhase {
    /// Validate state transition
    ///
    /// # Valid Transitions
    /// - `Idle` -> `Processing` (frame received)
    /// - `Processing` -> `Replying` (interrogation reply started)
    /// - `Processing` -> `Idle` (frame handled)
    /// - `Replying` -> `Idle` (last reply frame sent or write failed)
    pub fn validate_transition(&self, next: OutstationPhase) -> Iec101Result<()> {
        let valid = matches!(
            (*self, next),
            (OutstationPhase::Idle, OutstationPhase::Processing)
                | (OutstationPhase::Processing, OutstationPhase::Replying)
                | (OutstationPhase::Processing, OutstationPhase::Idle)
                | (OutstationPhase::Replying, OutstationPhase::Idle)
        );

        if valid {
            Ok(())
        } else {
            Err(Iec101Error::InvalidState(format!(
                "Invalid outstation transition: {:?} -> {:?}",
                self, next
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutstationPhase::Idle => "Idle",
            OutstationPhase::Processing => "Processing",
            OutstationPhase::Replying => "Replying",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        let store = PointStore::default();
        assert_eq!(store.power_drawn(), 1234);
        assert_eq!(store.power_limitation(), 22000);
    }

    #[test]
    fn test_apply_setpoint() {
        let store = PointStore::default();
        assert_eq!(store.apply_setpoint(2, 20500), SetpointOutcome::Applied);
        assert_eq!(store.power_limitation(), 20500);

        assert_eq!(store.apply_setpoint(7, 1), SetpointOutcome::UnknownAddress);
        assert_eq!(store.snapshot().power_limitation, 20500);
        assert_eq!(store.power_drawn(), 1234);
    }

    #[test]
    fn test_clones_share_points() {
        let store = PointStore::default();
        let other = store.clone();
        other.apply_setpoint(IOA_POWER_LIMITATION, -5);
        assert_eq!(store.power_limitation(), -5);
    }

    #[test]
    fn test_drift_wraps() {
        let store = PointStore::new(OutstationState {
            power_drawn: 1290,
            power_limitation: 0,
        });
        assert_eq!(store.drift(10, 1300, 1200), 1300);
        assert_eq!(store.drift(10, 1300, 1200), 1200);
        assert_eq!(store.drift(10, 1300, 1200), 1210);
    }

    #[test]
    fn test_phase_transitions() {
        let idle = OutstationPhase::Idle;
        assert!(idle.validate_transition(OutstationPhase::Processing).is_ok());
        assert!(idle.validate_transition(OutstationPhase::Replying).is_err());
        assert!(OutstationPhase::Replying
            .validate_transition(OutstationPhase::Processing)
            .is_err());
        assert!(OutstationPhase::Processing
            .validate_transition(OutstationPhase::Replying)
            .is_ok());
    }
}
