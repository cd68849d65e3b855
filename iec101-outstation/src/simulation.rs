//! Drawn power simulation

use crate::state::PointStore;
use iec101_transport::Shutdown;
use std::time::Duration;

/// Increment applied to the drawn power on every tick
pub const DRIFT_STEP: i16 = 10;

/// Values above this wrap back to [`DRIFT_FLOOR`]
pub const DRIFT_CEILING: i16 = 1300;

pub const DRIFT_FLOOR: i16 = 1200;

/// Default drift period
pub const DRIFT_PERIOD: Duration = Duration::from_secs(5);

/// Advance `power_drawn` once per `period` until shutdown
///
/// The first step happens one full period after the call.
pub async fn run_drift(store: PointStore, period: Duration, mut shutdown: Shutdown) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = shutdown.requested() => {
                log::debug!("Drift simulation stopped");
                return;
            }
            _ = ticker.tick() => {
                let value = store.drift(DRIFT_STEP, DRIFT_CEILING, DRIFT_FLOOR);
                log::debug!("Simulated power drawn: {}", value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::OutstationState;
    use iec101_transport::shutdown_channel;

    #[tokio::test(start_paused = true)]
    async fn test_drift_ticks_and_wraps() {
        let store = PointStore::new(OutstationState {
            power_drawn: 1290,
            power_limitation: 22000,
        });
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(run_drift(store.clone(), DRIFT_PERIOD, shutdown));

        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(store.power_drawn(), 1300);
        tokio::time::sleep(DRIFT_PERIOD).await;
        assert_eq!(store.power_drawn(), 1200);

        trigger.trigger();
        task.await.unwrap();
    }
}
