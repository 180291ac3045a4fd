//! Background notification sweep.
//!
//! Spawned as a tokio task at startup. Ticks on a fixed interval (first
//! tick fires immediately) and asks the service to alert every tray past
//! its incubation period. Failures are contained per tick — the loop never
//! exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::state::AppState;

pub async fn run_sweep_loop(state: Arc<AppState>, interval_secs: u64) {
    info!("Notification sweep started (every {interval_secs}s)");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match state.service.sweep_notifications().await {
            Ok(report) if report.notified > 0 => {
                info!(
                    scanned = report.scanned,
                    notified = report.notified,
                    delivery_failures = report.delivery_failures,
                    "Notification sweep complete"
                );
            }
            Ok(report) => {
                debug!(scanned = report.scanned, "Notification sweep: nothing due");
            }
            Err(e) => {
                // Store hiccup: skip this tick, the next one retries.
                warn!(error = %e, "Notification sweep failed");
            }
        }
    }
}
