//! Shared application state: the simulation engine behind a mutex, the
//! broadcast channel, and loop heartbeats.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use gmd_core::models::{InterceptorSite, LaunchRequest, Missile, MissileClass, MissileStatus};
use gmd_core::{CoreResult, InterceptOutcome, Simulation, Snapshot, TickReport};

use crate::config::Config;
use crate::persistence::launches::{self as launches_db, StatusWrite};
use crate::persistence::Database;
use crate::state::events::{publish, ChannelSink, StreamEvent};

/// Pending status writes before new ones are dropped.
const STATUS_QUEUE_CAPACITY: usize = 1024;

/// Age of a background loop's last heartbeat.
#[derive(Debug, Clone, Serialize)]
pub struct LoopHeartbeat {
    pub name: String,
    pub last_beat: DateTime<Utc>,
    pub age_ms: i64,
}

/// Application state - one simulation per process, shared by handlers and loops.
pub struct AppState {
    simulation: Mutex<Simulation>,
    tx: broadcast::Sender<Arc<str>>,
    loop_heartbeats: DashMap<&'static str, DateTime<Utc>>,
    database: Option<Database>,
    status_tx: Option<mpsc::Sender<StatusWrite>>,
    status_rx: Mutex<Option<mpsc::Receiver<StatusWrite>>>,
    config: Config,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::build(Simulation::default(), None, config)
    }

    pub fn with_database(db: Database, config: Config) -> Self {
        Self::build(Simulation::default(), Some(db), config)
    }

    /// State around a custom interceptor network.
    pub fn with_sites(sites: Vec<InterceptorSite>, config: Config) -> Self {
        Self::build(Simulation::with_sites(sites), None, config)
    }

    fn build(simulation: Simulation, database: Option<Database>, config: Config) -> Self {
        let (tx, _rx) = broadcast::channel(config.broadcast_capacity);
        let (status_tx, status_rx) = match database {
            Some(_) => {
                let (status_tx, status_rx) = mpsc::channel(STATUS_QUEUE_CAPACITY);
                (Some(status_tx), Some(status_rx))
            }
            None => (None, None),
        };
        Self {
            simulation: Mutex::new(simulation),
            tx,
            loop_heartbeats: DashMap::new(),
            database,
            status_tx,
            status_rx: Mutex::new(status_rx),
            config,
            started_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    fn simulation(&self) -> MutexGuard<'_, Simulation> {
        // Every mutation leaves the registry consistent, so a poisoned lock is still usable.
        self.simulation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========== COMMANDS ==========

    /// Launch a missile now. A request without a class gets a random one.
    pub fn launch(&self, mut request: LaunchRequest) -> CoreResult<Missile> {
        if request.missile_type.is_none() {
            request.missile_type = Some(MissileClass::random(&mut rand::rng()));
        }
        self.simulation().launch(request, Utc::now())
    }

    pub fn intercept(&self, missile_id: &str, site_id: &str) -> CoreResult<InterceptOutcome> {
        self.simulation().intercept(missile_id, site_id)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.simulation().snapshot()
    }

    pub fn get_all_missiles(&self) -> Vec<Missile> {
        self.simulation().missiles_by_launch()
    }

    pub fn get_missile(&self, missile_id: &str) -> Option<Missile> {
        self.simulation().missile(missile_id).cloned()
    }

    pub fn get_interceptor_sites(&self) -> Vec<InterceptorSite> {
        self.simulation().sites().to_vec()
    }

    pub fn active_missile_count(&self) -> usize {
        self.simulation().active_count()
    }

    /// Run one simulation tick at `now`, publishing the batch to subscribers.
    pub fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let sink = ChannelSink::new(self.tx.clone());
        self.simulation().tick(now, &sink)
    }

    // ========== STREAMING ==========

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: &StreamEvent) {
        publish(&self.tx, event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    // ========== PERSISTENCE ==========

    /// Record a launch in the launch log. Failures are logged, never surfaced.
    pub async fn record_launch(&self, missile: &Missile) {
        let Some(db) = self.database.as_ref() else {
            return;
        };
        if let Err(err) = launches_db::insert_launch(db.pool(), missile).await {
            tracing::error!("Failed to persist launch {}: {}", missile.id, err);
        }
    }

    /// Queue a status change for the persist loop. Never waits on the database.
    pub fn record_status(&self, missile_id: &str, status: MissileStatus) {
        let Some(tx) = self.status_tx.as_ref() else {
            return;
        };
        let write = StatusWrite {
            missile_id: missile_id.to_string(),
            status,
        };
        match tx.try_send(write) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(write)) => {
                tracing::warn!(
                    "Status queue full, dropping {:?} for {}",
                    write.status,
                    write.missile_id
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Status persist loop stopped; {} not recorded", missile_id);
            }
        }
    }

    /// Hand the status queue to the persist loop. Returns `None` without a
    /// database or once taken.
    pub fn take_status_receiver(&self) -> Option<mpsc::Receiver<StatusWrite>> {
        self.status_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    // ========== HEALTH ==========

    pub fn mark_loop_heartbeat(&self, name: &'static str) {
        self.loop_heartbeats.insert(name, Utc::now());
    }

    pub fn loop_heartbeats(&self) -> Vec<LoopHeartbeat> {
        let now = Utc::now();
        let mut beats: Vec<LoopHeartbeat> = self
            .loop_heartbeats
            .iter()
            .map(|entry| LoopHeartbeat {
                name: entry.key().to_string(),
                last_beat: *entry.value(),
                age_ms: (now - *entry.value()).num_milliseconds(),
            })
            .collect();
        beats.sort_by(|a, b| a.name.cmp(&b.name));
        beats
    }
}
