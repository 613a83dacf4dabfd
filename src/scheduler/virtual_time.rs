//! # Virtual-time scheduler for deterministic tests.
//!
//! [`VirtualScheduler`] keeps scheduled work in a min-heap keyed by virtual
//! deadline. Nothing runs until the owner moves the clock:
//!
//! ```text
//! schedule(100ms, w1)   schedule(50ms, w2)   schedule(50ms, w3)
//!        │                    │                    │
//!        └────────────► heap: (50,#2) (50,#3) (100,#1)
//!
//! advance_by(60ms) → runs w2, w3 (same deadline → insertion order), now = 60ms
//! run_next()       → jumps to 100ms, runs w1
//! ```
//!
//! ## Determinism
//! - Same deadline → insertion order.
//! - Work runs on the thread that advances the clock, outside the internal lock,
//!   so work may schedule more work (including at the current instant).
//! - `now()` never moves backwards.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::{Scheduler, Work};
use crate::error::SchedulerError;

struct VirtualTimer {
    deadline: Duration,
    id: u64,
    cancel: CancellationToken,
    work: Work,
}

impl Eq for VirtualTimer {}

impl PartialEq for VirtualTimer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Ord for VirtualTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap ordering: earliest deadline first, then lowest id
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for VirtualTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct VirtualState {
    now: Duration,
    next_id: u64,
    timers: BinaryHeap<VirtualTimer>,
}

/// Scheduler driven by a manually advanced virtual clock.
#[derive(Default)]
pub struct VirtualScheduler {
    state: Mutex<VirtualState>,
}

impl VirtualScheduler {
    /// Creates a scheduler whose clock starts at zero.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Moves the clock forward by `by`, running everything that falls due.
    pub fn advance_by(&self, by: Duration) {
        let target = self.now().saturating_add(by);
        self.advance_to(target);
    }

    /// Moves the clock to `target`, running everything due at or before it.
    ///
    /// Work scheduled by running work is picked up in the same call if it is due.
    /// A `target` in the past only runs work that is already due.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let timer = {
                let mut st = self.state.lock();
                let due = st.timers.peek().is_some_and(|t| t.deadline <= target);
                let timer = if due { st.timers.pop() } else { None };
                match &timer {
                    Some(t) => st.now = st.now.max(t.deadline),
                    None => st.now = st.now.max(target),
                }
                timer
            };
            match timer {
                Some(t) => fire(t),
                None => break,
            }
        }
        tracing::trace!(now = ?self.now(), "virtual clock advanced");
    }

    /// Jumps to the earliest pending deadline and runs that one item.
    ///
    /// Cancelled items are discarded on the way. Returns `false` when nothing
    /// runnable is left.
    pub fn run_next(&self) -> bool {
        loop {
            let timer = {
                let mut st = self.state.lock();
                let timer = st.timers.pop();
                if let Some(t) = &timer {
                    st.now = st.now.max(t.deadline);
                }
                timer
            };
            match timer {
                None => return false,
                Some(t) if t.cancel.is_cancelled() => continue,
                Some(t) => {
                    fire(t);
                    return true;
                }
            }
        }
    }

    /// Runs everything that is due at the current instant.
    pub fn run_due(&self) {
        self.advance_to(self.now());
    }

    /// Deadline of the earliest pending (non-cancelled) item.
    pub fn next_deadline(&self) -> Option<Duration> {
        let st = self.state.lock();
        st.timers
            .iter()
            .filter(|t| !t.cancel.is_cancelled())
            .map(|t| t.deadline)
            .min()
    }

    /// Number of pending (non-cancelled) items.
    pub fn pending(&self) -> usize {
        let st = self.state.lock();
        st.timers.iter().filter(|t| !t.cancel.is_cancelled()).count()
    }
}

fn fire(timer: VirtualTimer) {
    if !timer.cancel.is_cancelled() {
        (timer.work)();
    }
}

impl Scheduler for VirtualScheduler {
    fn name(&self) -> &'static str {
        "virtual"
    }

    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(
        &self,
        delay: Duration,
        cancel: CancellationToken,
        work: Work,
    ) -> Result<(), SchedulerError> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let mut st = self.state.lock();
        let id = st.next_id;
        st.next_id += 1;
        let deadline = st.now.saturating_add(delay);
        st.timers.push(VirtualTimer {
            deadline,
            id,
            cancel,
            work,
        });
        Ok(())
    }
}
