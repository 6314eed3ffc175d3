//! Narration Queue
//!
//! Strict FIFO shared between the sequencer (producer) and the narration
//! player (consumer). At most one item is in flight at a time.
//!
//! Every [`NarrationQueue::stop`] bumps a generation counter. The player
//! tags each item it takes with the generation it was taken in and checks
//! it again after every await, so an item that was in flight when playback
//! stopped can never restart anything.

use super::NarrationItem;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<NarrationItem>,
    in_flight: bool,
    generation: u64,
}

/// An item taken off the queue for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationTicket {
    pub item: NarrationItem,
    pub generation: u64,
}

/// Shared narration FIFO
#[derive(Clone)]
pub struct NarrationQueue {
    state: Arc<Mutex<QueueState>>,
    work: Arc<Notify>,
    stopped: Arc<watch::Sender<u64>>,
}

impl Default for NarrationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrationQueue {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            work: Arc::new(Notify::new()),
            stopped: Arc::new(stopped),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item. Items with blank text are dropped.
    pub fn enqueue(&self, item: NarrationItem) {
        if item.text.trim().is_empty() {
            return;
        }
        tracing::debug!(
            "Queued {:?}: {}",
            item.category,
            super::tts::text_utils::truncate_for_log(&item.text)
        );
        self.lock().items.push_back(item);
        self.work.notify_one();
    }

    /// Drop pending items; the in-flight item keeps playing.
    pub fn clear(&self) {
        self.lock().items.clear();
    }

    /// Drop pending items and abandon the in-flight one.
    pub fn stop(&self) {
        let generation = {
            let mut state = self.lock();
            state.items.clear();
            state.in_flight = false;
            state.generation += 1;
            state.generation
        };
        self.stopped.send_replace(generation);
        tracing::debug!("Narration queue stopped (generation {})", generation);
    }

    /// Take the next item, unless one is already in flight.
    pub fn begin_next(&self) -> Option<NarrationTicket> {
        let mut state = self.lock();
        if state.in_flight {
            return None;
        }
        let item = state.items.pop_front()?;
        state.in_flight = true;
        Some(NarrationTicket {
            item,
            generation: state.generation,
        })
    }

    /// Mark the in-flight item of `generation` as done.
    pub fn end_item(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation {
            state.in_flight = false;
        }
    }

    /// True while no stop happened since `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Nothing pending and nothing in flight.
    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.items.is_empty() && !state.in_flight
    }

    /// Snapshot of the pending items, oldest first.
    pub fn pending(&self) -> Vec<NarrationItem> {
        self.lock().items.iter().cloned().collect()
    }

    /// Resolves once an item has been enqueued since the last wake-up.
    pub async fn notified(&self) {
        self.work.notified().await;
    }

    /// Receiver that changes on every [`NarrationQueue::stop`].
    pub fn subscribe_stop(&self) -> watch::Receiver<u64> {
        self.stopped.subscribe()
    }
}
