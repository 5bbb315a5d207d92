//! Simulation tick loop.
//!
//! Advances every in-flight missile on a fixed cadence and streams the
//! resulting positions and threat assessments to subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use gmd_core::models::MissileStatus;
use gmd_core::TickReport;

use crate::state::{AppState, StreamEvent};

pub const LOOP_NAME: &str = "simulation";

pub async fn run_simulation_loop(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = interval(state.config().tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    state.mark_loop_heartbeat(LOOP_NAME);

    tracing::info!(
        "Simulation loop started ({} ms cadence)",
        state.config().tick_interval_ms
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Simulation loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                run_tick(&state, Utc::now());
            }
        }
    }
}

/// One tick: advance, publish, then report impacts and faults.
///
/// Never awaits; status writes are only queued for the persist loop.
pub fn run_tick(state: &AppState, now: DateTime<Utc>) -> TickReport {
    state.mark_loop_heartbeat(LOOP_NAME);
    let report = state.tick(now);

    for fault in &report.faults {
        tracing::warn!("Skipped missile this tick: {}", fault);
    }

    for missile in &report.impacts {
        tracing::info!(
            "Missile {} ({}) impacted at {:.4}, {:.4}",
            missile.name,
            missile.id,
            missile.current.lat,
            missile.current.lon
        );
        state.publish(&StreamEvent::impact(missile, now));
        state.record_status(&missile.id, MissileStatus::Impact);
    }

    for missile_id in &report.expired {
        tracing::debug!("Dropped intercepted missile {} from tracking", missile_id);
    }

    if !report.batch.is_empty() {
        tracing::debug!(
            "Tick advanced {} missile(s) for {} subscriber(s)",
            report.batch.len(),
            state.subscriber_count()
        );
    }

    report
}
