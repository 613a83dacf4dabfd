//! # Per-value delay.
//!
//! `delay_elements(d)` queues incoming values and releases them one at a time:
//!
//! ```text
//! upstream:   a b c ─────────────────────────── complete
//!             │
//!             ▼ (queue)
//! timer:      ├── d ──► a ├── d ──► b ├── d ──► c ──► complete
//! ```
//!
//! ## Rules
//! - A value is released `d` after it arrived or `d` after its predecessor was
//!   released, whichever is later (one value in flight).
//! - Completion waits until the queue is drained.
//! - Errors are forwarded at once and drop whatever is still queued.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, SerialSubscriber, Subscriber};
use crate::error::{FlowError, SchedulerError};
use crate::flux::Flux;
use crate::scheduler::{IntoScheduler, SchedulerRef};

struct DelayPublisher<T> {
    upstream: Flux<T>,
    delay: Duration,
    scheduler: SchedulerRef,
}

struct Pending<T> {
    queue: VecDeque<T>,
    in_flight: bool,
    upstream_done: bool,
}

struct DelayShared<T> {
    pending: Mutex<Pending<T>>,
    out: SerialSubscriber<T>,
    scheduler: SchedulerRef,
    delay: Duration,
    token: CancellationToken,
}

impl<T: Send + 'static> DelayShared<T> {
    fn arm(self: &Arc<Self>) {
        let me = Arc::clone(self);
        let rejected = Arc::clone(self);
        let armed = self.scheduler.schedule_with_reject(
            self.delay,
            self.token.clone(),
            Box::new(move || me.release()),
            Box::new(move |e: SchedulerError| rejected.reject(e)),
        );
        if let Err(e) = armed {
            self.reject(e);
        }
    }

    fn reject(&self, error: SchedulerError) {
        tracing::warn!(scheduler = self.scheduler.name(), error = %error, "delay_elements timer rejected");
        self.fail(error.into());
    }

    fn release(self: &Arc<Self>) {
        let value = self.pending.lock().queue.pop_front();
        if let Some(value) = value {
            self.out.next(value);
        }

        let (rearm, finish) = {
            let mut pending = self.pending.lock();
            if pending.queue.is_empty() {
                pending.in_flight = false;
                (false, pending.upstream_done)
            } else {
                (true, false)
            }
        };
        if rearm {
            self.arm();
        } else if finish {
            self.token.cancel();
            self.out.complete();
        }
    }

    fn fail(&self, error: FlowError) {
        self.token.cancel();
        self.pending.lock().queue.clear();
        self.out.error(error);
    }
}

struct DelaySubscriber<T> {
    shared: Arc<DelayShared<T>>,
}

impl<T: Send + 'static> Subscriber<T> for DelaySubscriber<T> {
    fn on_next(&mut self, value: T) {
        let start = {
            let mut pending = self.shared.pending.lock();
            pending.queue.push_back(value);
            !std::mem::replace(&mut pending.in_flight, true)
        };
        if start {
            self.shared.arm();
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.shared.fail(error);
    }

    fn on_complete(&mut self) {
        let finish = {
            let mut pending = self.shared.pending.lock();
            pending.upstream_done = true;
            !pending.in_flight
        };
        if finish {
            self.shared.token.cancel();
            self.shared.out.complete();
        }
    }
}

impl<T: Send + 'static> Publisher<T> for DelayPublisher<T> {
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        let token = token.child_token();
        let shared = Arc::new(DelayShared {
            pending: Mutex::new(Pending {
                queue: VecDeque::new(),
                in_flight: false,
                upstream_done: false,
            }),
            out: SerialSubscriber::new(downstream),
            scheduler: self.scheduler.clone(),
            delay: self.delay,
            token: token.clone(),
        });
        self.upstream
            .subscribe_raw(Box::new(DelaySubscriber { shared }), token);
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Re-emits every value `delay` later on `scheduler`, keeping arrival order.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flowline::{Flux, StepVerifier, VirtualScheduler};
    ///
    /// let clock = VirtualScheduler::new();
    /// let slow = Flux::range(1, 3).delay_elements(Duration::from_millis(100), &clock);
    ///
    /// let elapsed = StepVerifier::with_virtual_time(slow, &clock)
    ///     .expect_values([1, 2, 3])
    ///     .verify_complete()
    ///     .unwrap();
    /// assert_eq!(elapsed, Duration::from_millis(300));
    /// ```
    pub fn delay_elements(self, delay: Duration, scheduler: impl IntoScheduler) -> Flux<T> {
        Flux::from_publisher(DelayPublisher {
            upstream: self,
            delay,
            scheduler: scheduler.into_scheduler(),
        })
    }
}
