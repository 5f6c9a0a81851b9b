//! Retention loop.
//!
//! Periodically drops status entries, scans and positions older than the
//! configured retention window.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

pub async fn run_cleanup_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let period = Duration::from_secs(state.config().cleanup_interval_secs);
    let mut ticker = interval(period);
    // The first tick completes immediately; skip it so startup does not purge.
    ticker.tick().await;
    state.mark_loop_heartbeat("cleanup");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Cleanup loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.mark_loop_heartbeat("cleanup");
                match state.cleanup().await {
                    Ok(report) if report.removed_vehicles > 0 => {
                        tracing::info!(
                            "Retention cleanup dropped {} vehicle(s)",
                            report.removed_vehicles
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!("Retention cleanup failed: {}", err);
                    }
                }
            }
        }
    }
}
