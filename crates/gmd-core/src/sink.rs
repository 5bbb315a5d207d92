//! Outbound destination for tick batches.

use std::sync::Mutex;

use crate::models::MissileUpdate;

/// Destination for each tick's batch of missile updates.
///
/// Delivery is best-effort: implementations must not block and must swallow
/// their own failures, so a slow or broken subscriber never stalls the simulation.
pub trait BroadcastSink: Send + Sync {
    fn send(&self, batch: &[MissileUpdate]);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl BroadcastSink for NullSink {
    fn send(&self, _batch: &[MissileUpdate]) {}
}

/// Sink that keeps every batch in memory, for tests and offline runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<MissileUpdate>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches received so far, oldest first.
    pub fn batches(&self) -> Vec<Vec<MissileUpdate>> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl BroadcastSink for RecordingSink {
    fn send(&self, batch: &[MissileUpdate]) {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(batch.to_vec());
        }
    }
}
