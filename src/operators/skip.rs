use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;
use crate::scheduler::{IntoScheduler, SchedulerRef};

/// What `skip` drops: a number of values, or everything before a deadline.
#[derive(Clone, Copy)]
enum SkipRule {
    Count(u64),
    For(Duration),
}

struct SkipPublisher<T> {
    upstream: Flux<T>,
    rule: SkipRule,
    scheduler: Option<SchedulerRef>,
}

enum Gate {
    Remaining(u64),
    Until {
        scheduler: SchedulerRef,
        start: Duration,
        window: Duration,
    },
    Open,
}

struct SkipSubscriber<T> {
    downstream: BoxSubscriber<T>,
    gate: Gate,
}

impl<T: Send + 'static> Publisher<T> for SkipPublisher<T> {
    fn subscribe(&self, downstream: BoxSubscriber<T>, token: CancellationToken) {
        let gate = match (self.rule, &self.scheduler) {
            (SkipRule::Count(0), _) | (SkipRule::For(Duration::ZERO), _) => Gate::Open,
            (SkipRule::Count(n), _) => Gate::Remaining(n),
            (SkipRule::For(window), Some(scheduler)) => Gate::Until {
                scheduler: scheduler.clone(),
                start: scheduler.now(),
                window,
            },
            (SkipRule::For(_), None) => Gate::Open,
        };
        self.upstream
            .subscribe_raw(Box::new(SkipSubscriber { downstream, gate }), token);
    }
}

impl<T: Send + 'static> Subscriber<T> for SkipSubscriber<T> {
    fn on_next(&mut self, value: T) {
        match &mut self.gate {
            Gate::Open => self.downstream.on_next(value),
            Gate::Remaining(n) => {
                *n -= 1;
                if *n == 0 {
                    self.gate = Gate::Open;
                }
            }
            Gate::Until {
                scheduler,
                start,
                window,
            } => {
                if scheduler.now().saturating_sub(*start) >= *window {
                    self.gate = Gate::Open;
                    self.downstream.on_next(value);
                }
            }
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.downstream.on_error(error);
    }

    fn on_complete(&mut self) {
        self.downstream.on_complete();
    }
}

impl<T: Send + 'static> Flux<T> {
    /// Drops the first `n` values, then passes the rest.
    pub fn skip(self, n: u64) -> Flux<T> {
        Flux::from_publisher(SkipPublisher {
            upstream: self,
            rule: SkipRule::Count(n),
            scheduler: None,
        })
    }

    /// Drops every value that arrives less than `window` after subscribing,
    /// measured on `scheduler`'s clock.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use flowline::{Flux, StepVerifier, VirtualScheduler};
    ///
    /// let clock = VirtualScheduler::new();
    /// let names = Flux::just(["Ahmed", "Harvey", "Chandler"])
    ///     .delay_elements(Duration::from_secs(1), &clock)
    ///     .skip_for(Duration::from_secs(2), &clock);
    ///
    /// StepVerifier::with_virtual_time(names, &clock)
    ///     .expect_values(["Harvey", "Chandler"])
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn skip_for(self, window: Duration, scheduler: impl IntoScheduler) -> Flux<T> {
        Flux::from_publisher(SkipPublisher {
            upstream: self,
            rule: SkipRule::For(window),
            scheduler: Some(scheduler.into_scheduler()),
        })
    }
}
