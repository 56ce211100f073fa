//! FIFO handoff of intents from the sensing thread to the actuation thread.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::models::intent::Intent;

/// Unbounded single-producer/single-consumer intent queue.
///
/// Cloning yields another handle to the same queue. `push` never blocks and
/// never fails; growth under a stalled consumer is unbounded.
#[derive(Clone, Default)]
pub struct IntentQueue {
    inner: Arc<(Mutex<VecDeque<Intent>>, Condvar)>,
}

impl IntentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, intent: Intent) {
        let (lock, cvar) = &*self.inner;
        lock_queue(lock).push_back(intent);
        cvar.notify_one();
    }

    pub fn extend(&self, intents: impl IntoIterator<Item = Intent>) {
        let (lock, cvar) = &*self.inner;
        lock_queue(lock).extend(intents);
        cvar.notify_one();
    }

    /// Takes everything queued right now, in insertion order. Never blocks.
    pub fn try_pop_all(&self) -> Vec<Intent> {
        let (lock, _) = &*self.inner;
        lock_queue(lock).drain(..).collect()
    }

    /// Like [`try_pop_all`](Self::try_pop_all), but when the queue is empty
    /// waits up to `timeout` for the next push.
    pub fn wait_pop_all(&self, timeout: Duration) -> Vec<Intent> {
        let (lock, cvar) = &*self.inner;
        let mut guard = lock_queue(lock);
        if guard.is_empty() {
            guard = cvar
                .wait_timeout(guard, timeout)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
        guard.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        let (lock, _) = &*self.inner;
        lock_queue(lock).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A push or drain cannot leave the deque half-updated, so a poisoned lock
// still guards consistent contents.
fn lock_queue(lock: &Mutex<VecDeque<Intent>>) -> MutexGuard<'_, VecDeque<Intent>> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
