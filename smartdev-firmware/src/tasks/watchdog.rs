//! Watchdog tick task
//!
//! Checks link liveness once per disable interval and turns the outputs
//! off when the host has gone quiet.

use defmt::*;
use embassy_time::{Duration, Ticker};

use smartdev_core::Watchdog;

use crate::Device;

/// Watchdog task - runs one liveness check per `period_ms`
#[embassy_executor::task]
pub async fn watchdog_task(watchdog: Watchdog<'static, Device>, period_ms: u64) {
    info!("Watchdog task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms));

    loop {
        ticker.next().await;

        if watchdog.check() {
            debug!("Outputs disabled by watchdog");
        }
    }
}
