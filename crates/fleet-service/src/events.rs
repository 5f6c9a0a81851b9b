//! Line-delimited JSON event stream.
//!
//! Each input line is one event tagged by `kind`: `telemetry` samples feed the
//! tracker and `alert` records feed the hotspot buffer. Every proximity scan a
//! sample triggers is written back as one JSON line. Live input is evaluated
//! against the wall clock; recorded input can opt into sample time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use fleet_core::{AlertRecord, ProximityScan, TelemetrySample};

use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InboundEvent {
    Telemetry(TelemetrySample),
    Alert(AlertRecord),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutboundEvent {
    Scan(ProximityScan),
}

/// Which instant telemetry is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventClock {
    /// Stationary durations are measured up to the moment of arrival.
    #[default]
    WallClock,
    /// Each sample is evaluated as of its own timestamp, for replaying
    /// recorded traffic.
    SampleTime,
}

/// Counters for one pass over an event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub telemetry: usize,
    pub alerts: usize,
    pub scans: usize,
    pub rejected: usize,
    /// Newest accepted telemetry timestamp
    pub latest_timestamp: Option<DateTime<Utc>>,
}

/// Apply one event, returning the scan it produced, if any.
pub async fn apply_event(
    state: &AppState,
    event: InboundEvent,
    clock: EventClock,
) -> crate::error::ServiceResult<Option<ProximityScan>> {
    match event {
        InboundEvent::Telemetry(sample) => {
            let outcome = match clock {
                EventClock::WallClock => state.ingest_telemetry(sample).await?,
                EventClock::SampleTime => {
                    let now = sample.timestamp;
                    state.ingest_telemetry_at(sample, now).await?
                }
            };
            Ok(outcome.scan)
        }
        InboundEvent::Alert(alert) => {
            state.record_alert(alert);
            Ok(None)
        }
    }
}

/// Consume `reader` until EOF, writing each scan to `writer`.
///
/// Malformed or invalid lines are logged and skipped.
pub async fn run_event_stream<R, W>(
    state: Arc<AppState>,
    reader: R,
    mut writer: W,
    clock: EventClock,
) -> anyhow::Result<StreamSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = StreamSummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: InboundEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("Skipping line {}: {}", line_no, err);
                summary.rejected += 1;
                continue;
            }
        };

        let sample_time = match &event {
            InboundEvent::Telemetry(sample) => {
                summary.telemetry += 1;
                Some(sample.timestamp)
            }
            InboundEvent::Alert(_) => {
                summary.alerts += 1;
                None
            }
        };

        let applied = apply_event(&state, event, clock).await;
        if applied.is_ok() {
            summary.latest_timestamp = summary.latest_timestamp.max(sample_time);
        }

        match applied {
            Ok(Some(scan)) => {
                summary.scans += 1;
                let mut out = serde_json::to_vec(&OutboundEvent::Scan(scan))?;
                out.push(b'\n');
                writer.write_all(&out).await?;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Rejected event on line {}: {}", line_no, err);
                summary.rejected += 1;
            }
        }
    }

    writer.flush().await?;
    Ok(summary)
}
