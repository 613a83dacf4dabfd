use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{BoxSubscriber, Publisher, Subscriber};
use crate::error::FlowError;
use crate::flux::Flux;
use crate::mono::Mono;

/// Short-circuiting boolean reduction.
///
/// The first value whose predicate result equals `stop_on` decides the
/// outcome: `stop_on` is emitted and upstream is cancelled. If upstream
/// completes first, `!stop_on` is emitted.
struct PredicatePublisher<T, P> {
    upstream: Flux<T>,
    predicate: Arc<P>,
    stop_on: bool,
}

struct PredicateSubscriber<P> {
    downstream: BoxSubscriber<bool>,
    predicate: Arc<P>,
    stop_on: bool,
    upstream: CancellationToken,
    done: bool,
}

impl<P> PredicateSubscriber<P> {
    fn decide(&mut self, outcome: bool) {
        self.done = true;
        self.upstream.cancel();
        self.downstream.on_next(outcome);
        self.downstream.on_complete();
    }
}

impl<T, P> Publisher<bool> for PredicatePublisher<T, P>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn subscribe(&self, downstream: BoxSubscriber<bool>, token: CancellationToken) {
        let upstream = token.child_token();
        self.upstream.subscribe_raw(
            Box::new(PredicateSubscriber {
                downstream,
                predicate: Arc::clone(&self.predicate),
                stop_on: self.stop_on,
                upstream: upstream.clone(),
                done: false,
            }),
            upstream,
        );
    }
}

impl<T, P> Subscriber<T> for PredicateSubscriber<P>
where
    T: Send + 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn on_next(&mut self, value: T) {
        if !self.done && (self.predicate)(&value) == self.stop_on {
            self.decide(self.stop_on);
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if !self.done {
            self.done = true;
            self.downstream.on_error(error);
        }
    }

    fn on_complete(&mut self) {
        if !self.done {
            self.decide(!self.stop_on);
        }
    }
}

impl<T: Send + 'static> Flux<T> {
    fn decide_with<P>(self, predicate: P, stop_on: bool) -> Mono<bool>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Mono::from_flux(Flux::from_publisher(PredicatePublisher {
            upstream: self,
            predicate: Arc::new(predicate),
            stop_on,
        }))
    }

    /// `true` if every value satisfies `predicate` (and for an empty upstream).
    ///
    /// The first failing value emits `false` and cancels upstream.
    ///
    /// # Example
    /// ```
    /// use flowline::{Flux, StepVerifier};
    ///
    /// let fruits = Flux::just(["apple", "orange", "banana"]);
    /// StepVerifier::create(fruits.all(|f| f.len() > 4))
    ///     .expect_next(true)
    ///     .verify_complete()
    ///     .unwrap();
    /// ```
    pub fn all<P>(self, predicate: P) -> Mono<bool>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.decide_with(predicate, false)
    }

    /// `true` as soon as a value satisfies `predicate`; `false` if none does
    /// (and for an empty upstream).
    pub fn any<P>(self, predicate: P) -> Mono<bool>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.decide_with(predicate, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{Scheduler, StepVerifier, VerifyError, VirtualScheduler};

    #[test]
    fn test_empty_upstream_defaults() -> Result<(), VerifyError> {
        StepVerifier::create(Flux::<u8>::empty().all(|_| false))
            .expect_next(true)
            .verify_complete()?;
        StepVerifier::create(Flux::<u8>::empty().any(|_| true))
            .expect_next(false)
            .verify_complete()?;
        Ok(())
    }

    #[test]
    fn test_any_short_circuits_infinite_source() -> Result<(), VerifyError> {
        let clock = VirtualScheduler::new();
        let ticks = Flux::interval(Duration::ZERO, Duration::from_secs(1), &clock);
        StepVerifier::with_virtual_time(ticks.any(|t| *t == 3), &clock)
            .expect_next(true)
            .verify_complete()?;
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.now(), Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn test_all_stops_at_first_failure() -> Result<(), VerifyError> {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let checked = Flux::range(1, 10).all(move |n| {
            log.lock().push(*n);
            *n < 3
        });
        StepVerifier::create(checked)
            .expect_next(false)
            .verify_complete()?;
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_error_passes_through() -> Result<(), VerifyError> {
        let failing = Flux::from_results(vec![Ok(1), Err("nope")]);
        StepVerifier::create(failing.any(|n: &i32| *n > 5))
            .expect_error()
            .verify()?;
        Ok(())
    }
}
