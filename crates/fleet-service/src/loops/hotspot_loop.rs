//! Hotspot refresh loop.
//!
//! Re-clusters the buffered alerts on a fixed cadence and republishes the
//! derived risk zones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

pub async fn run_hotspot_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(Duration::from_secs(state.config().hotspot_interval_secs));
    state.mark_loop_heartbeat("hotspot");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Hotspot loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                state.mark_loop_heartbeat("hotspot");
                if state.buffered_alert_count() == 0 {
                    continue;
                }
                if let Err(err) = state.refresh_hotspots().await {
                    tracing::warn!("Hotspot refresh failed: {}", err);
                }
            }
        }
    }
}
