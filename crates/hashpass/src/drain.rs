//! Admission control and graceful drain for deferred work.
//!
//! [`DrainCoordinator`] owns the single "accepting new work" flag and the
//! count of outstanding deferred jobs. Work is admitted by acquiring a
//! [`DrainPermit`]; the permit gives its slot back when dropped, so a job
//! releases exactly once no matter how it ends.
//!
//! Shutdown happens in two phases:
//!
//! 1. [`begin_shutdown`](DrainCoordinator::begin_shutdown) stops admission.
//!    Because the flag is checked under the same lock that bumps the counter,
//!    no permit can be handed out after this returns.
//! 2. [`wait_drained`](DrainCoordinator::wait_drained) suspends until the
//!    outstanding count reaches zero. It has no deadline;
//!    [`wait_drained_for`](DrainCoordinator::wait_drained_for) layers one on
//!    top for callers that need bounded shutdown.

use crate::{Error, Result};
use core::{pin::pin, time::Duration};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug)]
struct DrainState {
    accepting: bool,
    outstanding: u64,
}

/// Tracks outstanding deferred work and whether new work may start.
#[derive(Debug)]
pub struct DrainCoordinator {
    state: Mutex<DrainState>,
    drained: Notify,
}

impl Default for DrainCoordinator {
    fn default() -> Self {
        Self {
            state: Mutex::new(DrainState {
                accepting: true,
                outstanding: 0,
            }),
            drained: Notify::new(),
        }
    }
}

impl DrainCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits one unit of work, or returns `None` once shutdown has begun.
    pub fn try_acquire(self: &Arc<Self>) -> Option<DrainPermit> {
        let mut state = self.state.lock();
        if !state.accepting {
            return None;
        }
        state.outstanding += 1;
        Some(DrainPermit {
            coordinator: Arc::clone(self),
        })
    }

    /// Gives back one admitted unit of work. Only [`DrainPermit`]'s `Drop`
    /// calls this, which pins it to exactly once per successful acquire.
    fn release(&self) {
        let remaining = {
            let mut state = self.state.lock();
            debug_assert!(state.outstanding > 0, "release without acquire");
            state.outstanding = state.outstanding.saturating_sub(1);
            state.outstanding
        };

        if remaining == 0 {
            self.drained.notify_waiters();
        }
    }

    /// Stops admitting new work. Idempotent; returns `true` only for the call
    /// that actually flipped the flag.
    pub fn begin_shutdown(&self) -> bool {
        let mut state = self.state.lock();
        let was_accepting = state.accepting;
        state.accepting = false;
        was_accepting
    }

    pub fn is_accepting(&self) -> bool {
        self.state.lock().accepting
    }

    pub fn outstanding(&self) -> u64 {
        self.state.lock().outstanding
    }

    /// Resolves once no admitted work is outstanding.
    ///
    /// Returns immediately if the count is already zero. There is no timeout.
    pub async fn wait_drained(&self) {
        loop {
            // Register interest before reading the count so a release that
            // lands between the read and the await still wakes us.
            let mut notified = pin!(self.drained.notified());
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }

            notified.await;
        }
    }

    /// [`wait_drained`](Self::wait_drained) with a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DrainTimeout`] carrying the outstanding count if the
    /// deadline passes first. The outstanding work keeps running.
    pub async fn wait_drained_for(&self, deadline: Duration) -> Result<()> {
        tokio::time::timeout(deadline, self.wait_drained())
            .await
            .map_err(|_| Error::DrainTimeout {
                outstanding: self.outstanding(),
            })
    }
}

/// Proof of admission for one deferred job.
///
/// Dropping the permit releases it back to the [`DrainCoordinator`].
#[derive(Debug)]
#[must_use = "dropping the permit immediately releases the admitted slot"]
pub struct DrainPermit {
    coordinator: Arc<DrainCoordinator>,
}

impl Drop for DrainPermit {
    fn drop(&mut self) {
        self.coordinator.release();
    }
}
