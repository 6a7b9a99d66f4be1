//! Countdown polling for a search endpoint that is still coming up.
//!
//! New domains can take several minutes before they answer. The first check
//! happens immediately; after that the countdown starts at
//! [`PollSchedule::initial`], checks at zero and restarts from
//! [`PollSchedule::reset`].

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PollSchedule {
    /// Ticks before the second check.
    pub initial: u32,
    /// Ticks between every later check.
    pub reset: u32,
    /// Length of one tick.
    pub tick: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial: 60,
            reset: 15,
            tick: Duration::from_secs(1),
        }
    }
}

/// Poll `check` until it reports ready. `on_tick` receives the remaining
/// count before each sleep so callers can show it.
///
/// Returns the number of checks made.
pub async fn wait_until_ready<C, Fut>(
    schedule: &PollSchedule,
    mut check: C,
    mut on_tick: impl FnMut(u32),
) -> u32
where
    C: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut checks = 1;
    if check().await {
        return checks;
    }

    info!("endpoint not ready yet; polling");
    let mut countdown = schedule.initial;
    loop {
        if countdown == 0 {
            checks += 1;
            debug!(checks, "checking endpoint");
            if check().await {
                return checks;
            }
            countdown = schedule.reset;
            continue;
        }
        on_tick(countdown);
        tokio::time::sleep(schedule.tick).await;
        countdown -= 1;
    }
}
