//! Messages pushed to WebSocket subscribers, and the channel-backed sink.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use gmd_core::models::{InterceptorSite, Missile, MissileUpdate, Snapshot, ThreatAssessment};
use gmd_core::{BroadcastSink, InterceptOutcome};

/// Envelope for everything sent on the stream, tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    InitialData {
        missiles: Vec<Missile>,
        interceptor_sites: Vec<InterceptorSite>,
    },
    MissileUpdates {
        data: Vec<UpdateEntry>,
    },
    InterceptEvent {
        missile_id: String,
        interceptor_site_id: String,
        interceptor_expended: bool,
        timestamp: DateTime<Utc>,
    },
    ImpactEvent {
        missile_id: String,
        name: String,
        lat: f64,
        lon: f64,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateEntry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub missile: Missile,
    pub threat_assessment: ThreatAssessment,
}

impl StreamEvent {
    pub fn initial_data(snapshot: Snapshot) -> Self {
        StreamEvent::InitialData {
            missiles: snapshot.missiles,
            interceptor_sites: snapshot.interceptor_sites,
        }
    }

    pub fn missile_updates(batch: &[MissileUpdate]) -> Self {
        StreamEvent::MissileUpdates {
            data: batch
                .iter()
                .map(|update| UpdateEntry {
                    kind: "missile_update",
                    missile: update.missile.clone(),
                    threat_assessment: update.threat_assessment.clone(),
                })
                .collect(),
        }
    }

    pub fn intercept(outcome: &InterceptOutcome, timestamp: DateTime<Utc>) -> Self {
        StreamEvent::InterceptEvent {
            missile_id: outcome.missile_id.clone(),
            interceptor_site_id: outcome.interceptor_site_id.clone(),
            interceptor_expended: outcome.interceptor_expended,
            timestamp,
        }
    }

    pub fn impact(missile: &Missile, timestamp: DateTime<Utc>) -> Self {
        StreamEvent::ImpactEvent {
            missile_id: missile.id.clone(),
            name: missile.name.clone(),
            lat: missile.current.lat,
            lon: missile.current.lon,
            timestamp,
        }
    }

    pub fn to_payload(&self) -> Option<Arc<str>> {
        match serde_json::to_string(self) {
            Ok(json) => Some(Arc::from(json)),
            Err(err) => {
                tracing::warn!("Failed to serialize stream event: {}", err);
                None
            }
        }
    }
}

/// Best-effort publish: nobody listening is not an error.
pub fn publish(tx: &broadcast::Sender<Arc<str>>, event: &StreamEvent) {
    if let Some(payload) = event.to_payload() {
        let _ = tx.send(payload);
    }
}

/// `BroadcastSink` over the shared broadcast channel.
///
/// `broadcast::Sender::send` never waits on receivers; a slow subscriber
/// lags and loses messages on its own side.
#[derive(Clone)]
pub struct ChannelSink {
    tx: broadcast::Sender<Arc<str>>,
}

impl ChannelSink {
    pub fn new(tx: broadcast::Sender<Arc<str>>) -> Self {
        Self { tx }
    }
}

impl BroadcastSink for ChannelSink {
    fn send(&self, batch: &[MissileUpdate]) {
        publish(&self.tx, &StreamEvent::missile_updates(batch));
    }
}
