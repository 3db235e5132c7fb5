use crate::{CorrelationId, PollResult};
use parking_lot::Mutex;
use core::mem;
use std::collections::{HashMap, hash_map::Entry};

#[derive(Debug)]
enum ResultSlot {
    Pending,
    Ready(String),
}

#[derive(Debug, Default)]
struct RegistryState {
    last_id: u64,
    slots: HashMap<CorrelationId, ResultSlot>,
}

/// A lock-based registry of pending and finished results.
///
/// The id counter and the slot map live behind a single [`Mutex`], because
/// issuing an id and inserting its slot is one logical step. All access goes
/// through [`register`](Self::register), [`publish`](Self::publish) and
/// [`poll`](Self::poll); there is no way to reach the map without the lock.
///
/// A slot moves `Pending -> Ready` exactly once and is removed exactly once,
/// by the first poll that observes `Ready`. Concurrent polls on the same id
/// are serialized, so exactly one of them receives the value and the rest see
/// [`PollResult::Absent`].
#[derive(Debug, Default)]
pub struct ResultRegistry {
    state: Mutex<RegistryState>,
}

impl ResultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next correlation id and inserts a pending slot for it.
    ///
    /// The first id issued is `"1"`. Never fails.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn register(&self) -> CorrelationId {
        let mut state = self.state.lock();
        state.last_id += 1;
        let id = CorrelationId::from_counter(state.last_id);
        state.slots.insert(id.clone(), ResultSlot::Pending);

        #[cfg(feature = "tracing")]
        tracing::debug!(id = %id, pending = state.slots.len(), "registered result slot");

        id
    }

    /// Stores `value` as the result for `id`.
    ///
    /// Publishing to an id without a slot (never issued, or already consumed)
    /// is a no-op.
    pub fn publish(&self, id: &CorrelationId, value: String) {
        let mut state = self.state.lock();
        match state.slots.get_mut(id) {
            Some(slot) => *slot = ResultSlot::Ready(value),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(id = %id, "publish for unknown result slot ignored");
            }
        }
    }

    /// Looks up `id`, consuming the slot if its value is ready.
    pub fn poll(&self, id: &CorrelationId) -> PollResult {
        let mut state = self.state.lock();
        match state.slots.entry(id.clone()) {
            Entry::Vacant(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(id = %id, "request for unknown id");
                PollResult::Absent
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                ResultSlot::Pending => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(id = %id, "result not available yet");
                    PollResult::Pending
                }
                ResultSlot::Ready(value) => {
                    let value = mem::take(value);
                    slot.remove();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(id = %id, "result delivered");
                    PollResult::Ready(value)
                }
            },
        }
    }

    /// Number of live slots, pending or ready.
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
