//! Per-event serialization of standings mutations.

use super::models::EventId;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// One async mutex per event, created on first use
///
/// Withdrawals, recomputes and result submissions for the same event queue
/// behind each other; different events never contend.
///
/// Idle entries are dropped whenever a new event is added, so the table holds
/// the events currently locked or waited on plus the newest one.
#[derive(Clone, Default)]
pub struct EventLocks {
    locks: Arc<RwLock<HashMap<EventId, Arc<Mutex<()>>>>>,
}

impl EventLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to an event
    pub async fn lock(&self, event_id: EventId) -> OwnedMutexGuard<()> {
        let existing = self.locks.read().await.get(&event_id).cloned();

        let mutex = match existing {
            Some(mutex) => mutex,
            None => {
                let mut locks = self.locks.write().await;
                // Only the table holds an idle mutex; any holder or waiter owns
                // a clone of the Arc
                locks.retain(|id, mutex| *id == event_id || Arc::strong_count(mutex) > 1);
                locks.entry(event_id).or_default().clone()
            }
        };

        mutex.lock_owned().await
    }

    /// Number of events currently in the table
    pub async fn tracked_events(&self) -> usize {
        self.locks.read().await.len()
    }
}
