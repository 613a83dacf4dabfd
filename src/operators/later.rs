use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher};
use crate::error::SchedulerError;
use crate::flux::Flux;
use crate::scheduler::{IntoScheduler, SchedulerRef};

/// Subscribes upstream from a scheduled task instead of the caller's stack.
struct LaterPublisher<T> {
    upstream: Flux<T>,
    scheduler: SchedulerRef,
    delay: Duration,
    operator: &'static str,
}

impl<T: Send + 'static> Publisher<T> for LaterPublisher<T> {
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        // The downstream stays reachable here if the scheduler refuses the work.
        let slot = Arc::new(Mutex::new(Some(downstream)));

        let work_slot = Arc::clone(&slot);
        let work_token = token.clone();
        let upstream = self.upstream.clone();
        let reject_slot = Arc::clone(&slot);
        let operator = self.operator;
        let scheduled = self.scheduler.schedule_with_reject(
            self.delay,
            token,
            Box::new(move || {
                let taken = work_slot.lock().take();
                if let Some(downstream) = taken {
                    upstream.subscribe_raw(downstream, work_token);
                }
            }),
            Box::new(move |e: SchedulerError| fail(&reject_slot, operator, e)),
        );

        if let Err(e) = scheduled {
            fail(&slot, self.operator, e);
        }
    }
}

fn fail<T: Send + 'static>(slot: &Mutex<Option<BoxSubscriber<T>>>, operator: &'static str, error: SchedulerError) {
    tracing::warn!(operator, error = %error, "deferred subscribe rejected");
    let taken = slot.lock().take();
    if let Some(mut downstream) = taken {
        downstream.on_error(error.into());
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Subscribes to this sequence only after `delay` has elapsed on `scheduler`.
    ///
    /// Cancelling before the delay elapses means upstream is never subscribed.
    pub fn delay_subscription(self, delay: Duration, scheduler: impl IntoScheduler) -> Flux<T> {
        Flux::from_publisher(LaterPublisher {
            upstream: self,
            scheduler: scheduler.into_scheduler(),
            delay,
            operator: "delay_subscription",
        })
    }

    /// Performs the upstream subscribe (and so the upstream's synchronous
    /// work) on `scheduler`.
    ///
    /// Inside [`Flux::flat_map`] this is what makes inner sequences run
    /// concurrently.
    pub fn subscribe_on(self, scheduler: impl IntoScheduler) -> Flux<T> {
        Flux::from_publisher(LaterPublisher {
            upstream: self,
            scheduler: scheduler.into_scheduler(),
            delay: Duration::ZERO,
            operator: "subscribe_on",
        })
    }
}
