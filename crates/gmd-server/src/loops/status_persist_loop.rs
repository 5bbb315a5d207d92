//! Launch log status persistence loop.
//!
//! Intercept and impact statuses arrive over an mpsc queue so neither the
//! simulation tick nor the request path waits on SQLite.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::persistence::launches::{self as launches_db, StatusWrite};
use crate::persistence::Database;
use crate::state::AppState;

pub const LOOP_NAME: &str = "status-persist";

pub async fn run_status_persist_loop(
    db: Database,
    state: Arc<AppState>,
    mut rx: mpsc::Receiver<StatusWrite>,
    mut shutdown: broadcast::Receiver<()>,
) {
    state.mark_loop_heartbeat(LOOP_NAME);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Status persistence loop shutting down");
                break;
            }
            maybe_write = rx.recv() => {
                match maybe_write {
                    Some(write) => {
                        state.mark_loop_heartbeat(LOOP_NAME);
                        persist(&db, write).await;
                    }
                    None => {
                        tracing::info!("Status persistence channel closed");
                        return;
                    }
                }
            }
        }
    }

    // Flush whatever was queued before shutdown.
    while let Ok(write) = rx.try_recv() {
        persist(&db, write).await;
    }
}

async fn persist(db: &Database, write: StatusWrite) {
    match launches_db::update_status(db.pool(), &write.missile_id, write.status).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!("No launch log row for {}", write.missile_id);
        }
        Err(err) => {
            tracing::error!(
                "Failed to persist status {:?} for {}: {}",
                write.status,
                write.missile_id,
                err
            );
        }
    }
}
