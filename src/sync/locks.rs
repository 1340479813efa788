//! Per-visit mutual exclusion for sync attempts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A visit's lock and the number of callers holding or waiting on it.
#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

type LockMap = HashMap<i64, Slot>;

/// Serializes sync attempts for the same visit inside this process, so two
/// callers cannot both see an unlinked visit and both create a contact.
#[derive(Debug, Default)]
pub struct VisitLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Counts one caller against a visit's slot from the moment it starts waiting.
/// The slot is forgotten when the last registration drops, including callers
/// that gave up before acquiring.
#[derive(Debug)]
struct Registration {
    id: i64,
    map: Arc<Mutex<LockMap>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = map.get_mut(&self.id) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                map.remove(&self.id);
            }
        }
    }
}

/// Held for the duration of one attempt. Dropping it releases the visit.
#[derive(Debug)]
pub struct VisitLockGuard {
    // Released before the registration so the slot is never pruned while locked
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl VisitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: i64) -> VisitLockGuard {
        let (lock, registration) = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = map.entry(id).or_default();
            slot.users += 1;
            (
                slot.lock.clone(),
                Registration {
                    id,
                    map: self.inner.clone(),
                },
            )
        };

        let guard = lock.lock_owned().await;

        VisitLockGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of visits with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
