//! Simulation worker thread.
//!
//! While the loop is running the worker ticks the registry at a fixed rate:
//! tick, hand the tick's events to subscribers, request a redraw, then sleep
//! for whatever is left of the period (at least 1 ms). A slow tick only
//! shortens the next sleep.
//!
//! When the loop is stopped or paused the worker blocks on its wake channel
//! instead of polling. Any state change sends a [`WorkerSignal::Wake`] so the
//! worker re-reads the state right away.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{info, trace};

use crate::events::control::WorkerSignal;
use crate::resources::simulation::{LoopState, SimulationShared};

const MIN_SLEEP: Duration = Duration::from_millis(1);

/// Time to sleep after a tick that took `elapsed`.
pub fn sleep_after(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed).max(MIN_SLEEP)
}

/// Worker main loop. Sends on `done` right before returning.
pub fn simulation_thread(
    rx_wake: Receiver<WorkerSignal>,
    shared: Arc<SimulationShared>,
    period: Duration,
    done: Sender<()>,
) {
    info!("simulation worker starting, period {:?}", period);
    loop {
        match shared.state() {
            LoopState::Closed => break,
            LoopState::Running => {
                let start = Instant::now();
                let events = shared.registry.tick();
                shared.deliver(events);
                shared.request_redraw();
                let elapsed = start.elapsed();
                trace!("tick took {:?}", elapsed);

                match rx_wake.recv_timeout(sleep_after(period, elapsed)) {
                    Ok(WorkerSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Ok(WorkerSignal::Wake) | Err(RecvTimeoutError::Timeout) => {}
                }
            }
            LoopState::Stopped | LoopState::Paused => match rx_wake.recv() {
                Ok(WorkerSignal::Wake) => {}
                Ok(WorkerSignal::Shutdown) | Err(_) => break,
            },
        }
    }
    info!("simulation worker exiting");
    let _ = done.send(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_after_fills_remaining_period() {
        let period = Duration::from_millis(66);
        assert_eq!(
            sleep_after(period, Duration::from_millis(16)),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_slow_tick_still_sleeps_one_millisecond() {
        let period = Duration::from_millis(66);
        assert_eq!(sleep_after(period, Duration::from_millis(66)), MIN_SLEEP);
        assert_eq!(sleep_after(period, Duration::from_millis(500)), MIN_SLEEP);
    }
}
