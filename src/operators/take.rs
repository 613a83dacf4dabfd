use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, SerialSubscriber, Subscriber};
use crate::error::{FlowError, SchedulerError};
use crate::flux::Flux;
use crate::scheduler::{IntoScheduler, SchedulerRef};

struct TakePublisher<T> {
    upstream: Flux<T>,
    n: u64,
}

struct TakeSubscriber<T> {
    downstream: BoxSubscriber<T>,
    remaining: u64,
    upstream: CancellationToken,
}

impl<T: Send + 'static> Publisher<T> for TakePublisher<T> {
    fn subscribe(&self, mut downstream: BoxSubscriber<T>, token: CancellationToken) {
        if self.n == 0 {
            downstream.on_complete();
            return;
        }
        let upstream = token.child_token();
        self.upstream.subscribe_raw(
            Box::new(TakeSubscriber {
                downstream,
                remaining: self.n,
                upstream: upstream.clone(),
            }),
            upstream,
        );
    }
}

impl<T: Send + 'static> Subscriber<T> for TakeSubscriber<T> {
    fn on_next(&mut self, value: T) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        self.downstream.on_next(value);
        if self.remaining == 0 {
            self.upstream.cancel();
            self.downstream.on_complete();
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if self.remaining > 0 {
            self.remaining = 0;
            self.downstream.on_error(error);
        }
    }

    fn on_complete(&mut self) {
        if self.remaining > 0 {
            self.remaining = 0;
            self.downstream.on_complete();
        }
    }
}

struct TakeForPublisher<T> {
    upstream: Flux<T>,
    window: Duration,
    scheduler: SchedulerRef,
}

/// Upstream side of `take_for`; the deadline timer shares `out` with it.
struct TakeForSubscriber<T> {
    out: SerialSubscriber<T>,
    scheduler: SchedulerRef,
    deadline: Duration,
    upstream: CancellationToken,
}

impl<T: Send + 'static> Publisher<T> for TakeForPublisher<T> {
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        let upstream = token.child_token();
        let out = SerialSubscriber::new(downstream);
        let deadline = self.scheduler.now().saturating_add(self.window);

        let timer_out = out.clone();
        let timer_upstream = upstream.clone();
        let reject_out = out.clone();
        let reject_upstream = upstream.clone();
        let armed = self.scheduler.schedule_with_reject(
            self.window,
            upstream.clone(),
            Box::new(move || {
                timer_upstream.cancel();
                timer_out.complete();
            }),
            Box::new(move |e: SchedulerError| {
                tracing::warn!(error = %e, "take_for timer dropped");
                reject_upstream.cancel();
                reject_out.error(e.into());
            }),
        );
        if let Err(e) = armed {
            tracing::warn!(scheduler = self.scheduler.name(), error = %e, "take_for timer rejected");
            out.error(e.into());
            return;
        }
        if out.is_terminated() {
            return;
        }

        self.upstream.subscribe_raw(
            Box::new(TakeForSubscriber {
                out,
                scheduler: self.scheduler.clone(),
                deadline,
                upstream: upstream.clone(),
            }),
            upstream,
        );
    }
}

impl<T: Send + 'static> Subscriber<T> for TakeForSubscriber<T> {
    fn on_next(&mut self, value: T) {
        if self.scheduler.now() >= self.deadline {
            self.upstream.cancel();
            self.out.complete();
        } else {
            self.out.next(value);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.upstream.cancel();
        self.out.error(error);
    }

    fn on_complete(&mut self) {
        self.upstream.cancel();
        self.out.complete();
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Passes the first `n` values, then completes and cancels upstream
    /// without waiting for it to finish.
    pub fn take(self, n: u64) -> Flux<T> {
        Flux::from_publisher(TakePublisher { upstream: self, n })
    }

    /// Passes values until `window` has elapsed on `scheduler`'s clock since
    /// subscribing, then completes and cancels upstream.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flowline::{Flux, StepVerifier, VirtualScheduler};
    ///
    /// let clock = VirtualScheduler::new();
    /// let names = Flux::just(["Ahmed", "Harvey", "Chandler"])
    ///     .delay_elements(Duration::from_millis(100), &clock)
    ///     .take_for(Duration::from_millis(250), &clock);
    ///
    /// StepVerifier::with_virtual_time(names, &clock)
    ///     .expect_values(["Ahmed", "Harvey"])
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn take_for(self, window: Duration, scheduler: impl IntoScheduler) -> Flux<T> {
        Flux::from_publisher(TakeForPublisher {
            upstream: self,
            window,
            scheduler: scheduler.into_scheduler(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StepVerifier, VerifyError, VirtualScheduler};

    #[test]
    fn test_take_count_completes_early() -> Result<(), VerifyError> {
        StepVerifier::create(Flux::just(["Ahmed", "Harvey", "Chandler"]).take(1))
            .expect_next("Ahmed")
            .verify_complete()?;
        StepVerifier::create(Flux::range(0, 2).take(5))
            .expect_values([0, 1])
            .verify_complete()?;
        StepVerifier::create(Flux::<u8>::never().take(0)).verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_take_on_infinite_source_terminates() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        let ticks = Flux::interval(Duration::ZERO, Duration::from_millis(10), &clock).take(4);
        StepVerifier::with_virtual_time(ticks, &clock)
            .expect_values([0, 1, 2, 3])
            .verify_complete()?;
        assert_eq!(clock.pending(), 0);
        Ok(())
    }

    #[test]
    fn test_take_for_cuts_infinite_source() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        let ticks = Flux::interval(Duration::from_secs(1), Duration::from_secs(1), &clock)
            .take_for(Duration::from_millis(3500), &clock);
        let elapsed = StepVerifier::with_virtual_time(ticks, &clock)
            .expect_values([0, 1, 2])
            .verify_complete()?;
        assert_eq!(elapsed, Duration::from_millis(3500));
        assert_eq!(clock.pending(), 0);
        Ok(())
    }

    #[test]
    fn test_take_for_completes_with_fast_upstream() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        StepVerifier::with_virtual_time(Flux::range(0, 3).take_for(Duration::from_secs(1), &clock), &clock)
            .expect_values([0, 1, 2])
            .verify_complete()?;
        assert_eq!(clock.pending(), 0);
        Ok(())
    }

    #[test]
    fn test_take_for_unbounded_window() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        clock.advance_by(Duration::from_millis(1));
        StepVerifier::with_virtual_time(Flux::range(0, 3).take_for(Duration::MAX, &clock), &clock)
            .expect_values([0, 1, 2])
            .verify_complete()?;
        assert_eq!(clock.pending(), 0);

        let pool = crate::ParallelScheduler::new(&crate::Config {
            workers: 1,
            ..crate::Config::default()
        })
        .expect("worker pool");
        StepVerifier::create(Flux::range(0, 3).take_for(Duration::MAX, &pool))
            .expect_values([0, 1, 2])
            .verify_complete()?;
        Ok(())
    }
}
